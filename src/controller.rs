use std::fmt::{self, Display, Formatter};

use crate::capture::{CaptureError, CaptureSource, SurfaceRegion};
use crate::config::PadConfig;
use crate::inference::{Classifier, Digit, InferenceError};
use crate::preprocess::preprocess;
use crate::surface::DrawingSurface;

/// What the user is told after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// "Predict" was pressed with nothing drawn.
    EmptyCanvas,
    Prediction(Digit),
    CaptureFailed(String),
    InferenceFailed(String),
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::EmptyCanvas => "Warning",
            Notice::Prediction(_) => "Prediction",
            Notice::CaptureFailed(_) | Notice::InferenceFailed(_) => "Error",
        }
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Notice::EmptyCanvas => write!(f, "The canvas is empty."),
            Notice::Prediction(digit) => write!(f, "The predicted digit is {digit}."),
            Notice::CaptureFailed(reason) => write!(f, "Could not capture the drawing: {reason}"),
            Notice::InferenceFailed(reason) => write!(f, "Prediction failed: {reason}"),
        }
    }
}

impl From<CaptureError> for Notice {
    fn from(err: CaptureError) -> Self {
        Notice::CaptureFailed(err.to_string())
    }
}

impl From<InferenceError> for Notice {
    fn from(err: InferenceError) -> Self {
        Notice::InferenceFailed(err.to_string())
    }
}

/// The running application: the stroke session, the loaded classifier and
/// whatever notice is currently shown.
///
/// Every handler runs on the UI thread, one event at a time.
pub struct PadController {
    surface: DrawingSurface,
    classifier: Box<dyn Classifier>,
    notice: Option<Notice>,
    /// Region of a prediction waiting for its screenshot.
    pending: Option<SurfaceRegion>,
}

impl PadController {
    pub fn new(config: &PadConfig, classifier: Box<dyn Classifier>) -> Self {
        Self {
            surface: DrawingSurface::from_config(config),
            classifier,
            notice: None,
            pending: None,
        }
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn classifier_name(&self) -> String {
        self.classifier.name()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // --- Pointer events ---
    //
    // Drawing is locked while a prediction waits for its capture, so the
    // pixels it classifies are the strokes it clears afterwards.

    pub fn pointer_pressed(&mut self, x: f32, y: f32) {
        if self.pending.is_none() {
            self.surface.begin(x, y);
        }
    }

    pub fn pointer_dragged(&mut self, x: f32, y: f32) {
        if self.pending.is_none() {
            self.surface.extend(x, y);
        }
    }

    pub fn pointer_released(&mut self) {
        self.surface.end();
    }

    // --- Commands ---

    /// The "clear" command.
    pub fn clear(&mut self) {
        self.surface.clear();
        self.pending = None;
    }

    /// First half of the "predict" command for sources that deliver pixels
    /// later (window screenshots). Returns `true` if a capture of `region`
    /// should be requested; on an empty canvas the notice is raised instead.
    pub fn request_prediction(&mut self, region: SurfaceRegion) -> bool {
        if self.surface.is_empty() {
            self.notice = Some(Notice::EmptyCanvas);
            return false;
        }
        self.pending = Some(region);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Completes a pending prediction with pixels from `source`.
    pub fn complete_prediction(&mut self, source: &mut dyn CaptureSource) -> Option<Notice> {
        let region = self.pending.take()?;
        Some(self.predict(source, region))
    }

    /// The "predict" command: emptiness check, capture, preprocessing,
    /// inference. The canvas is cleared after a successful prediction; on
    /// failure the strokes stay so the user can try again.
    pub fn predict(&mut self, source: &mut dyn CaptureSource, region: SurfaceRegion) -> Notice {
        self.pending = None;
        let notice = match self.run_prediction(source, region) {
            Ok(digit) => {
                tracing::info!(%digit, "digit predicted");
                self.surface.clear();
                Notice::Prediction(digit)
            }
            Err(notice) => {
                if notice != Notice::EmptyCanvas {
                    tracing::warn!(%notice, "prediction aborted");
                }
                notice
            }
        };
        self.notice = Some(notice.clone());
        notice
    }

    fn run_prediction(
        &self,
        source: &mut dyn CaptureSource,
        region: SurfaceRegion,
    ) -> Result<Digit, Notice> {
        if self.surface.is_empty() {
            return Err(Notice::EmptyCanvas);
        }
        let captured = source.grab(&self.surface, region)?;
        let image = preprocess(&captured);
        Ok(self.classifier.predict(&image)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::RasterCapture;
    use crate::inference::NUM_CLASSES;
    use crate::preprocess::FixedImage;
    use image::RgbaImage;
    use ndarray::Array1;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Favours one class and counts how often it was asked.
    struct CountingClassifier {
        class: usize,
        calls: Rc<Cell<usize>>,
    }

    impl Classifier for CountingClassifier {
        fn scores(&self, image: &FixedImage) -> Result<Array1<f32>, InferenceError> {
            self.calls.set(self.calls.get() + 1);
            assert_eq!(image.tensor().shape(), &FixedImage::SHAPE);
            let mut scores = Array1::zeros(NUM_CLASSES);
            scores[self.class] = 1.0;
            Ok(scores)
        }

        fn name(&self) -> String {
            "counting".to_string()
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn scores(&self, _image: &FixedImage) -> Result<Array1<f32>, InferenceError> {
            Err(InferenceError::Forward("boom".to_string()))
        }

        fn name(&self) -> String {
            "failing".to_string()
        }
    }

    struct UnavailableCapture;

    impl CaptureSource for UnavailableCapture {
        fn grab(
            &mut self,
            _surface: &DrawingSurface,
            _region: SurfaceRegion,
        ) -> Result<RgbaImage, CaptureError> {
            Err(CaptureError::Unavailable("window minimised".to_string()))
        }
    }

    fn controller(class: usize) -> (PadController, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let classifier = CountingClassifier {
            class,
            calls: Rc::clone(&calls),
        };
        (PadController::new(&PadConfig::default(), Box::new(classifier)), calls)
    }

    fn draw_stroke(controller: &mut PadController) {
        controller.pointer_pressed(100.0, 60.0);
        controller.pointer_dragged(140.0, 120.0);
        controller.pointer_dragged(140.0, 220.0);
        controller.pointer_released();
    }

    fn region(controller: &PadController) -> SurfaceRegion {
        SurfaceRegion::of_surface(controller.surface())
    }

    #[test]
    fn predict_on_empty_canvas_never_calls_classifier() {
        let (mut controller, calls) = controller(3);
        let region = region(&controller);
        let notice = controller.predict(&mut RasterCapture, region);

        assert_eq!(notice, Notice::EmptyCanvas);
        assert_eq!(controller.notice(), Some(&Notice::EmptyCanvas));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn draw_predict_then_canvas_is_cleared() {
        let (mut controller, calls) = controller(4);
        draw_stroke(&mut controller);
        assert!(!controller.surface().is_empty());

        let region = region(&controller);
        let notice = controller.predict(&mut RasterCapture, region);

        assert_eq!(notice, Notice::Prediction(Digit::new(4).unwrap()));
        assert_eq!(notice.to_string(), "The predicted digit is 4.");
        assert_eq!(calls.get(), 1);
        assert!(controller.surface().is_empty());
    }

    #[test]
    fn clear_command_empties_the_surface() {
        let (mut controller, _) = controller(0);
        draw_stroke(&mut controller);
        controller.clear();
        assert!(controller.surface().is_empty());
        assert_eq!(controller.surface().anchor(), None);
    }

    #[test]
    fn capture_failure_keeps_strokes() {
        let (mut controller, calls) = controller(1);
        draw_stroke(&mut controller);
        let region = region(&controller);
        let notice = controller.predict(&mut UnavailableCapture, region);

        assert!(matches!(notice, Notice::CaptureFailed(_)));
        assert_eq!(notice.title(), "Error");
        assert_eq!(calls.get(), 0);
        assert!(!controller.surface().is_empty());
    }

    #[test]
    fn inference_failure_is_reported() {
        let mut controller = PadController::new(&PadConfig::default(), Box::new(FailingClassifier));
        draw_stroke(&mut controller);
        let region = region(&controller);
        let notice = controller.predict(&mut RasterCapture, region);

        assert_eq!(notice, Notice::InferenceFailed("forward pass failed: boom".to_string()));
        assert!(!controller.surface().is_empty());
    }

    #[test]
    fn deferred_prediction_round_trip() {
        let (mut controller, calls) = controller(9);
        let region = region(&controller);

        assert!(!controller.request_prediction(region));
        assert_eq!(controller.notice(), Some(&Notice::EmptyCanvas));
        assert!(!controller.is_pending());
        controller.dismiss_notice();

        draw_stroke(&mut controller);
        assert!(controller.request_prediction(region));
        assert!(controller.is_pending());

        let notice = controller.complete_prediction(&mut RasterCapture);
        assert_eq!(notice, Some(Notice::Prediction(Digit::new(9).unwrap())));
        assert!(!controller.is_pending());
        assert!(controller.surface().is_empty());
        assert_eq!(calls.get(), 1);

        // Nothing pending any more.
        assert_eq!(controller.complete_prediction(&mut RasterCapture), None);
    }

    #[test]
    fn strokes_are_rejected_while_prediction_is_pending() {
        let (mut controller, calls) = controller(5);
        draw_stroke(&mut controller);
        let drawn = controller.surface().segments().to_vec();
        let region = region(&controller);
        assert!(controller.request_prediction(region));

        controller.pointer_pressed(20.0, 200.0);
        controller.pointer_dragged(260.0, 200.0);
        controller.pointer_released();
        assert_eq!(controller.surface().segments(), drawn.as_slice());

        let notice = controller.complete_prediction(&mut RasterCapture);
        assert_eq!(notice, Some(Notice::Prediction(Digit::new(5).unwrap())));
        assert_eq!(calls.get(), 1);
        assert!(controller.surface().is_empty());

        // Drawing works again once the prediction is done.
        draw_stroke(&mut controller);
        assert!(!controller.surface().is_empty());
    }

    #[test]
    fn clearing_drops_a_pending_prediction() {
        let (mut controller, calls) = controller(2);
        draw_stroke(&mut controller);
        let region = region(&controller);
        assert!(controller.request_prediction(region));

        controller.clear();
        assert!(!controller.is_pending());
        assert_eq!(controller.complete_prediction(&mut RasterCapture), None);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn classifier_name_comes_from_the_model() {
        let (controller, _) = controller(0);
        assert_eq!(controller.classifier_name(), "counting");
    }

    #[test]
    fn notice_texts() {
        assert_eq!(Notice::EmptyCanvas.title(), "Warning");
        assert_eq!(Notice::EmptyCanvas.to_string(), "The canvas is empty.");
        assert_eq!(Notice::Prediction(Digit::new(0).unwrap()).title(), "Prediction");
    }
}
