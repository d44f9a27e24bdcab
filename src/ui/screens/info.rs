//! Info and license overlay.

use egui::Context;

use crate::ui::theme::GameTheme;
use crate::world::avatar::PlayerModel;

/// Static credits and license panel.
pub struct InfoScreen;

impl InfoScreen {
    /// Returns true when the player closes the panel.
    pub fn show(ctx: &Context, models: &[PlayerModel]) -> bool {
        let mut close = false;

        egui::Area::new(egui::Id::new("info_dim"))
            .order(egui::Order::Background)
            .fixed_pos(egui::Pos2::ZERO)
            .show(ctx, |ui| {
                ui.painter()
                    .rect_filled(ctx.screen_rect(), 0.0, GameTheme::OVERLAY_DIM);
            });

        egui::Window::new("About the game")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .max_height(ctx.screen_rect().height() * 0.9)
            .show(ctx, |ui| {
                ui.set_min_width(480.0);

                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Development");
                    ui.label("A local-history walking game: find the figures on the map, listen to their stories, place them on the timeline.");

                    ui.add_space(8.0);
                    ui.heading("Licenses");
                    ui.label("Source code: MIT. Marker, firework and cheer media: CC BY-SA 4.0.");

                    ui.add_space(8.0);
                    ui.heading("3D model licenses");
                    for model in models {
                        ui.label(format!("{}: see {}license.txt", model.name, model.asset_path));
                    }

                    ui.add_space(8.0);
                    ui.heading("Map provider");
                    ui.label("© MapTiler, © OpenStreetMap contributors");
                });

                ui.add_space(8.0);
                if ui.button("Close").clicked() {
                    close = true;
                }
            });

        close
    }
}
