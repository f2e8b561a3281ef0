use crate::screenshot::ScreenshotCapture;
use crate::ui;

use digit_pad::{Classifier, PadConfig, PadController, SurfaceRegion};
use eframe::egui::{self, UserData, ViewportCommand};
use eframe::{App, Frame};
use std::sync::Arc;

/// Frames to wait for a requested screenshot before giving up.
const SCREENSHOT_FRAME_BUDGET: u32 = 30;

/// The eframe application. It owns the controller and the little bit of
/// state needed to turn the asynchronous screenshot into a prediction.
pub struct DigitPadApp {
    pub controller: PadController,
    pub canvas_size: f32,
    /// Frames waited so far for the screenshot of a pending prediction.
    frames_waiting: u32,
}

impl DigitPadApp {
    pub fn new(config: &PadConfig, classifier: Box<dyn Classifier>) -> Self {
        let controller = PadController::new(config, classifier);
        tracing::info!(classifier = %controller.classifier_name(), "starting drawing pad");
        Self {
            controller,
            canvas_size: config.canvas_size,
            frames_waiting: 0,
        }
    }

    /// The "predict" button: ask the window for a screenshot of the canvas.
    pub fn request_prediction(&mut self, ctx: &egui::Context, canvas: egui::Rect) {
        let region =
            SurfaceRegion::new(canvas.min.x, canvas.min.y, canvas.width(), canvas.height());
        if self.controller.request_prediction(region) {
            self.frames_waiting = 0;
            ctx.send_viewport_cmd(ViewportCommand::Screenshot(UserData::default()));
            ctx.request_repaint();
        }
    }

    /// Feeds a delivered screenshot into the pending prediction, or fails it
    /// once the screenshot has not shown up for too long.
    fn poll_screenshot(&mut self, ctx: &egui::Context) {
        if !self.controller.is_pending() {
            return;
        }
        let screenshot = ctx.input(|input| {
            input.raw.events.iter().find_map(|event| match event {
                egui::Event::Screenshot { image, .. } => Some(Arc::clone(image)),
                _ => None,
            })
        });

        match screenshot {
            Some(image) => {
                let mut source =
                    ScreenshotCapture::from_color_image(&image, ctx.pixels_per_point());
                self.controller.complete_prediction(&mut source);
            }
            None if self.frames_waiting >= SCREENSHOT_FRAME_BUDGET => {
                self.controller.complete_prediction(&mut ScreenshotCapture::Missing);
            }
            None => {
                self.frames_waiting += 1;
                ctx.request_repaint();
            }
        }
    }
}

impl App for DigitPadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_screenshot(ctx);
        ui::draw_central_panel(self, ctx);
        ui::draw_notice(self, ctx);
    }
}
