//! Avatar selection overlay.

use std::collections::HashMap;

use egui::{Context, TextureHandle};

use crate::assets::{self, AssetPaths};
use crate::ui::theme::GameTheme;
use crate::world::avatar::PlayerModel;

/// What the selection screen wants the app to do.
#[derive(Debug, Clone)]
pub enum ModelSelectAction {
    None,
    /// Load this model and make it the avatar
    Selected(PlayerModel),
    Close,
}

/// Avatar selection grid.
///
/// Preview images load lazily the first time the grid opens; a missing
/// preview degrades to a text tile. While a selection is loading the grid
/// ignores further clicks; the loader itself also supersedes, this is just
/// to keep the UI honest.
pub struct ModelSelectScreen {
    previews: HashMap<String, Option<TextureHandle>>,
    loading: Option<String>,
}

impl ModelSelectScreen {
    pub fn new() -> Self {
        Self {
            previews: HashMap::new(),
            loading: None,
        }
    }

    /// Mark the pending load as finished (or failed); re-enables clicks.
    pub fn load_finished(&mut self) {
        self.loading = None;
    }

    pub fn loading(&self) -> Option<&str> {
        self.loading.as_deref()
    }

    fn preview(
        &mut self,
        ctx: &Context,
        paths: &AssetPaths,
        model: &PlayerModel,
    ) -> Option<TextureHandle> {
        self.previews
            .entry(model.name.clone())
            .or_insert_with(|| {
                let path = paths.model_preview(&model.asset_path);
                match assets::load_image(&path) {
                    Ok(image) => {
                        let size = [image.width() as usize, image.height() as usize];
                        let color =
                            egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                        Some(ctx.load_texture(
                            format!("preview-{}", model.name),
                            color,
                            egui::TextureOptions::LINEAR,
                        ))
                    }
                    Err(e) => {
                        tracing::warn!("no preview for {}: {}", model.name, e);
                        None
                    }
                }
            })
            .clone()
    }

    pub fn show(
        &mut self,
        ctx: &Context,
        models: &[PlayerModel],
        paths: &AssetPaths,
        can_close: bool,
    ) -> ModelSelectAction {
        let mut action = ModelSelectAction::None;

        egui::Area::new(egui::Id::new("model_dim"))
            .order(egui::Order::Background)
            .fixed_pos(egui::Pos2::ZERO)
            .show(ctx, |ui| {
                ui.painter()
                    .rect_filled(ctx.screen_rect(), 0.0, GameTheme::OVERLAY_DIM);
            });

        let screen = ctx.screen_rect();
        let per_row = if screen.width() > screen.height() { 3 } else { 2 };

        egui::Window::new("Choose your look")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::Grid::new("model_grid").show(ui, |ui| {
                    for (i, model) in models.iter().enumerate() {
                        let preview = self.preview(ctx, paths, model);

                        ui.vertical_centered(|ui| {
                            let tile = egui::Frame::new()
                                .fill(GameTheme::CARD_BG)
                                .corner_radius(10.0)
                                .inner_margin(8.0)
                                .show(ui, |ui| {
                                    match &preview {
                                        Some(texture) => {
                                            ui.add(
                                                egui::Image::new(texture)
                                                    .fit_to_exact_size(egui::vec2(120.0, 120.0)),
                                            );
                                        }
                                        None => {
                                            ui.add_sized(
                                                [120.0, 120.0],
                                                egui::Label::new(&model.name),
                                            );
                                        }
                                    }
                                    if self.loading.as_deref() == Some(model.name.as_str()) {
                                        ui.label("Loading...");
                                    } else {
                                        ui.label(&model.name);
                                    }
                                });

                            let response = tile
                                .response
                                .interact(egui::Sense::click())
                                .on_hover_cursor(egui::CursorIcon::PointingHand);
                            if response.clicked() && self.loading.is_none() {
                                self.loading = Some(model.name.clone());
                                action = ModelSelectAction::Selected(model.clone());
                            }
                        });

                        if (i + 1) % per_row == 0 {
                            ui.end_row();
                        }
                    }
                });

                if can_close {
                    ui.add_space(8.0);
                    if ui.button("Close").clicked() {
                        action = ModelSelectAction::Close;
                    }
                }
            });

        action
    }
}

impl Default for ModelSelectScreen {
    fn default() -> Self {
        Self::new()
    }
}
