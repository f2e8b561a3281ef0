mod app;
mod screenshot;
mod ui;

use anyhow::{Context, Result};
use app::DigitPadApp;
use digit_pad::{OnnxClassifier, PadConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("digit_pad=info,digit_pad_app=info")),
        )
        .init();

    let config = PadConfig::from_env();

    // The pad is useless without a model, so a load failure ends the process.
    let classifier = match load_classifier(&config) {
        Ok(classifier) => classifier,
        Err(err) => {
            tracing::error!("{err:#}");
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Error)
                .set_title("Model load failed")
                .set_description(format!("{err:#}"))
                .set_buttons(rfd::MessageButtons::Ok)
                .show();
            return Err(err);
        }
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(&config.window_title)
            .with_inner_size(ui::window_size(&config))
            .with_resizable(false),
        ..Default::default()
    };
    let title = config.window_title.clone();
    eframe::run_native(
        &title,
        native_options,
        Box::new(move |_cc| Ok(Box::new(DigitPadApp::new(&config, Box::new(classifier))))),
    )
    .map_err(|err| anyhow::anyhow!("event loop failed: {err}"))
}

fn load_classifier(config: &PadConfig) -> Result<OnnxClassifier> {
    let path = config.model_path().context("cannot resolve the model location")?;
    let classifier = OnnxClassifier::load(&path)
        .with_context(|| format!("cannot load the digit model at {}", path.display()))?;
    tracing::debug!(path = %classifier.path().display(), "model ready");
    Ok(classifier)
}
