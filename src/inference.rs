use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use ndarray::{Array1, ArrayView1};
use thiserror::Error;
use tract_onnx::prelude::*;

use crate::preprocess::FixedImage;

/// Number of output classes, one per digit.
pub const NUM_CLASSES: usize = 10;

/// Errors that can occur when loading or running a classifier.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model file {0} does not exist")]
    ModelNotFound(PathBuf),
    #[error("cannot load model {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },
    #[error("forward pass failed: {0}")]
    Forward(String),
    #[error("model returned {actual} scores, expected {expected}")]
    UnexpectedOutput { expected: usize, actual: usize },
    /// Every score was NaN, so no class can be picked.
    #[error("model returned no comparable score")]
    NoScore,
}

/// A digit between 0 and 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digit(u8);

impl Digit {
    pub fn new(value: u8) -> Option<Self> {
        (usize::from(value) < NUM_CLASSES).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Display for Digit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of the highest score. Ties go to the lowest index and NaN scores
/// never win. Returns `None` if there is nothing to compare.
pub fn argmax(scores: ArrayView1<'_, f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// The common interface for the pre-trained digit model.
pub trait Classifier {
    /// Raw class scores (probabilities or logits) for one image.
    fn scores(&self, image: &FixedImage) -> Result<Array1<f32>, InferenceError>;

    /// Human-readable description, e.g. the model file name.
    fn name(&self) -> String;

    /// The most likely digit for `image`.
    fn predict(&self, image: &FixedImage) -> Result<Digit, InferenceError> {
        let scores = self.scores(image)?;
        if scores.len() != NUM_CLASSES {
            return Err(InferenceError::UnexpectedOutput {
                expected: NUM_CLASSES,
                actual: scores.len(),
            });
        }
        tracing::debug!(scores = ?scores.to_vec(), "class scores");
        argmax(scores.view())
            .and_then(|index| u8::try_from(index).ok())
            .and_then(Digit::new)
            .ok_or(InferenceError::NoScore)
    }
}

type Plan = TypedRunnableModel<TypedModel>;

/// An ONNX digit model executed with tract.
///
/// The graph must take one `f32` input of shape `[1, 1, 28, 28]` and
/// produce ten scores.
pub struct OnnxClassifier {
    plan: Plan,
    path: PathBuf,
}

impl OnnxClassifier {
    /// Loads and optimises the model at `path`.
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::ModelNotFound` if the file is missing and
    /// `InferenceError::ModelLoad` if it cannot be decoded or does not accept
    /// the fixed input shape.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(InferenceError::ModelNotFound(path.to_path_buf()));
        }
        let load_error = |e: TractError| InferenceError::ModelLoad {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        };

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact(FixedImage::SHAPE).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(load_error)?;

        tracing::info!(model = %path.display(), "digit classifier loaded");
        Ok(Self {
            plan,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Classifier for OnnxClassifier {
    fn scores(&self, image: &FixedImage) -> Result<Array1<f32>, InferenceError> {
        let forward = |e: TractError| InferenceError::Forward(format!("{e:#}"));

        let samples = image.to_vec();
        let input = Tensor::from_shape::<f32>(&FixedImage::SHAPE, &samples).map_err(forward)?;
        let outputs = self.plan.run(tvec!(input.into())).map_err(forward)?;
        let first = outputs
            .first()
            .ok_or_else(|| InferenceError::Forward("model produced no output".to_string()))?;
        let view = first.to_array_view::<f32>().map_err(forward)?;
        Ok(view.iter().copied().collect())
    }

    fn name(&self) -> String {
        let file = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());
        format!("ONNX ({file})")
    }
}
