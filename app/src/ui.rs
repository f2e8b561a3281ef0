use crate::app::DigitPadApp;

use digit_pad::{PadConfig, Point};
use eframe::egui::{self, Align2, Button, Color32, Key, Pos2, Rect, Sense, Stroke, Ui, Vec2};

/// Height of the row holding the "Predict" and "Clear" buttons.
const BUTTON_ROW_HEIGHT: f32 = 32.0;

/// Inner window size: the square canvas with the button row below it.
pub fn window_size(config: &PadConfig) -> Vec2 {
    Vec2::new(config.canvas_size, config.canvas_size + BUTTON_ROW_HEIGHT)
}

/// Draws the canvas and the command buttons, edge to edge.
pub fn draw_central_panel(app: &mut DigitPadApp, ctx: &egui::Context) {
    // While a notice is open the pad behaves like it sits behind a modal
    // dialog and ignores input. A pending prediction locks it as well.
    let interactive = app.controller.notice().is_none() && !app.controller.is_pending();

    egui::CentralPanel::default()
        .frame(egui::Frame::default())
        .show(ctx, |ui| {
            ui.spacing_mut().item_spacing = Vec2::ZERO;
            let canvas = draw_canvas(app, ui, interactive);
            draw_command_row(app, ui, ctx, canvas, interactive);
        });
}

/// Paints the strokes and turns pointer drags into surface events.
/// Returns the screen rectangle of the canvas.
fn draw_canvas(app: &mut DigitPadApp, ui: &mut Ui, interactive: bool) -> Rect {
    let sense = if interactive { Sense::drag() } else { Sense::hover() };
    let (response, painter) = ui.allocate_painter(Vec2::splat(app.canvas_size), sense);
    let rect = response.rect;
    let painter = painter.with_clip_rect(rect);

    if let Some(pos) = response.interact_pointer_pos() {
        let local = pos - rect.min;
        if response.drag_started() {
            let press_origin = ui.input(|input| input.pointer.press_origin());
            let origin = stroke_origin(press_origin, pos, rect);
            app.controller.pointer_pressed(origin.x, origin.y);
            app.controller.pointer_dragged(local.x, local.y);
        } else if response.dragged() && response.drag_delta() != Vec2::ZERO {
            app.controller.pointer_dragged(local.x, local.y);
        }
    }
    if response.drag_stopped() {
        app.controller.pointer_released();
    }

    painter.rect_filled(rect, 0.0, Color32::WHITE);
    let surface = app.controller.surface();
    let width = surface.stroke_width();
    let to_screen = |p: Point| rect.min + Vec2::new(p.x, p.y);
    for segment in surface.segments() {
        let (from, to): (Pos2, Pos2) = (to_screen(segment.from), to_screen(segment.to));
        // Round caps so consecutive segments join without gaps.
        painter.line_segment([from, to], Stroke::new(width, Color32::BLACK));
        painter.circle_filled(from, width / 2.0, Color32::BLACK);
        painter.circle_filled(to, width / 2.0, Color32::BLACK);
    }

    rect
}

/// Canvas-local start of a stroke. egui only reports a drag once the pointer
/// has moved past a small threshold, so the stroke is anchored where the
/// button went down rather than where the drag was recognised.
fn stroke_origin(press_origin: Option<Pos2>, drag_pos: Pos2, canvas: Rect) -> Vec2 {
    press_origin.unwrap_or(drag_pos) - canvas.min
}

fn draw_command_row(
    app: &mut DigitPadApp,
    ui: &mut Ui,
    ctx: &egui::Context,
    canvas: Rect,
    interactive: bool,
) {
    let button_size = Vec2::new(app.canvas_size / 2.0, BUTTON_ROW_HEIGHT);
    ui.horizontal(|ui| {
        let predict = ui.add_sized(button_size, Button::new("Predict"));
        let clear = ui.add_sized(button_size, Button::new("Clear"));
        if !interactive {
            return;
        }
        if predict.clicked() {
            app.request_prediction(ctx, canvas);
        }
        if clear.clicked() {
            app.controller.clear();
        }
    });
}

/// Shows the current notice, if any, as a small dialog with an "OK" button.
pub fn draw_notice(app: &mut DigitPadApp, ctx: &egui::Context) {
    let Some(notice) = app.controller.notice() else {
        return;
    };
    let title = notice.title();
    let message = notice.to_string();

    let mut dismissed = false;
    egui::Window::new(title)
        .id(egui::Id::new("notice"))
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(message);
            ui.add_space(6.0);
            ui.vertical_centered(|ui| {
                dismissed = ui.button("OK").clicked();
            });
        });

    dismissed |= ctx.input(|input| input.key_pressed(Key::Enter) || input.key_pressed(Key::Escape));
    if dismissed {
        app.controller.dismiss_notice();
    }
}
