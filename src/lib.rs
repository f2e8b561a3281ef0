//! Core of the digit drawing pad: the stroke surface, screen capture,
//! preprocessing into the classifier's input format, the inference adapter
//! and the controller that ties them together.
//!
//! Nothing in here depends on a windowing toolkit; the `digit-pad-app`
//! binary supplies the event loop and the screenshots.

// Include submodules
pub mod capture;
pub mod config;
pub mod controller;
pub mod inference;
pub mod preprocess;
pub mod surface;

// Re-export types from submodules
pub use capture::{CaptureError, CaptureSource, FrameCapture, RasterCapture, SurfaceRegion};
pub use config::{ConfigError, PadConfig};
pub use controller::{Notice, PadController};
pub use inference::{Classifier, Digit, InferenceError, OnnxClassifier, argmax};
pub use preprocess::{FixedImage, preprocess};
pub use surface::{DrawingSurface, Point, Segment};
