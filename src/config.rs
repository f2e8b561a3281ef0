use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable that overrides the model location.
pub const MODEL_ENV_VAR: &str = "DIGIT_PAD_MODEL";

/// Side length of the square drawing area, in logical pixels.
pub const DEFAULT_CANVAS_SIZE: f32 = 280.0;
/// Width of every drawn stroke, in logical pixels.
pub const DEFAULT_STROKE_WIDTH: f32 = 20.0;
pub const DEFAULT_MODEL_FILE: &str = "models/digit_classifier.onnx";
pub const DEFAULT_WINDOW_TITLE: &str = "Handwritten Digit Prediction";

/// Errors raised while resolving configured paths.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot locate the running executable: {0}")]
    ExecutableLocation(#[source] std::io::Error),
    #[error("executable path {0} has no parent directory")]
    NoInstallDirectory(PathBuf),
}

/// Settings of the drawing pad.
///
/// There are no command line flags; the defaults match the classic 280x280
/// pad and only the model location can be overridden through
/// [`MODEL_ENV_VAR`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate", default)
)]
pub struct PadConfig {
    pub canvas_size: f32,
    pub stroke_width: f32,
    /// Model file. Relative paths are resolved against the directory that
    /// contains the executable, so a packaged build still finds it.
    pub model_file: PathBuf,
    pub window_title: String,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            canvas_size: DEFAULT_CANVAS_SIZE,
            stroke_width: DEFAULT_STROKE_WIDTH,
            model_file: PathBuf::from(DEFAULT_MODEL_FILE),
            window_title: DEFAULT_WINDOW_TITLE.to_string(),
        }
    }
}

impl PadConfig {
    /// Defaults with the model path taken from [`MODEL_ENV_VAR`] when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = env::var_os(MODEL_ENV_VAR).filter(|p| !p.is_empty()) {
            tracing::debug!(path = ?path, "model path overridden from environment");
            config.model_file = PathBuf::from(path);
        }
        config
    }

    /// Absolute location of the model file.
    pub fn model_path(&self) -> Result<PathBuf, ConfigError> {
        if self.model_file.is_absolute() {
            return Ok(self.model_file.clone());
        }
        Ok(self.model_path_in(&install_dir()?))
    }

    /// Resolves the model file against `base` unless it is already absolute.
    pub fn model_path_in(&self, base: &Path) -> PathBuf {
        if self.model_file.is_absolute() {
            self.model_file.clone()
        } else {
            base.join(&self.model_file)
        }
    }
}

/// Directory holding the running executable.
pub fn install_dir() -> Result<PathBuf, ConfigError> {
    let exe = env::current_exe().map_err(ConfigError::ExecutableLocation)?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or(ConfigError::NoInstallDirectory(exe))
}
