use crate::controller::{OverlayController, TickOutcome};
use crate::hotkey::InputSource;
use crate::style::Rgb;
use crate::win_util;
use eframe::egui;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

const TICK_INTERVAL: Duration = Duration::from_millis(16);
const LABEL_MARGIN: f32 = 20.0;
const LABEL_PADDING: egui::Vec2 = egui::vec2(8.0, 5.0);
const BORDER_WIDTH_PX: f32 = 2.0;

fn color32(c: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(c.0, c.1, c.2)
}

/// Transparent click-through window that drives the controller once per
/// frame and paints its render list.
pub struct OverlayApp {
    controller: OverlayController,
    input: Box<dyn InputSource>,
}

impl OverlayApp {
    pub fn new(controller: OverlayController, input: Box<dyn InputSource>) -> Self {
        Self { controller, input }
    }

    /// Run one tick. A panic inside it is logged and the next frame carries on
    /// with a full repaint.
    fn tick(&mut self) -> TickOutcome {
        if let Some((w, h)) = win_util::screen_size() {
            self.controller.set_screen_size(w, h);
        }
        let controller = &mut self.controller;
        let input = self.input.as_ref();
        match panic::catch_unwind(AssertUnwindSafe(|| controller.tick(input))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let panic_message = if let Some(message) = payload.downcast_ref::<&str>() {
                    (*message).to_string()
                } else if let Some(message) = payload.downcast_ref::<String>() {
                    message.clone()
                } else {
                    "unknown panic payload".to_string()
                };
                tracing::error!(panic_message, "overlay tick panicked");
                TickOutcome {
                    window_visible: None,
                    repaint: true,
                }
            }
        }
    }

    fn paint(&self, ctx: &egui::Context) {
        if !self.controller.is_window_visible() {
            return;
        }
        let points = self.controller.render_points();
        // Controller geometry is in physical pixels.
        let ppp = ctx.pixels_per_point();
        let to_pos = |(x, y): (f64, f64)| egui::pos2(x as f32 / ppp, y as f32 / ppp);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let painter = ui.painter();
                let stroke_width = BORDER_WIDTH_PX / ppp;
                for point in &points {
                    painter.circle(
                        to_pos(point.center),
                        point.radius as f32 / ppp,
                        color32(point.fill),
                        egui::Stroke::new(stroke_width, color32(point.border)),
                    );
                }

                let text_color = egui::Color32::from_gray(230);
                let galley = painter.layout_no_wrap(
                    self.controller.map_label(),
                    egui::FontId::proportional(14.0),
                    text_color,
                );
                let size = galley.size() + LABEL_PADDING * 2.0;
                let screen = ctx.screen_rect();
                let min = egui::pos2(
                    screen.right() - LABEL_MARGIN - size.x,
                    screen.top() + LABEL_MARGIN,
                );
                let bg = egui::Rect::from_min_size(min, size);
                painter.rect_filled(bg, 8.0, egui::Color32::from_black_alpha(150));
                painter.galley(bg.min + LABEL_PADDING, galley, text_color);
            });
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let outcome = self.tick();
        if outcome.repaint {
            self.paint(ctx);
        }
        if let Some(visible) = outcome.window_visible {
            tracing::debug!(visible, "overlay visibility changed");
            // Show the change on the next frame instead of after the poll delay.
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(TICK_INTERVAL);
        }
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        egui::Rgba::TRANSPARENT.to_array()
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.controller.persist();
        tracing::info!("overlay closed");
    }
}
