//! Timeline overlay: narration, chronological axis, placement rounds.

use std::collections::HashMap;

use egui::{Align, Color32, Context, Pos2, Rect, TextureHandle, Vec2};

use crate::assets::{self, AssetPaths};
use crate::audio::{AudioEngine, Playback};
use crate::game::{
    timeline, CompletionSet, PlacementOutcome, RewardPools, TimelineConfig, TimelineGame,
};
use crate::ui::theme::GameTheme;
use crate::world::markers::Marker;

/// What the timeline screen wants the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineAction {
    None,
    /// Close the overlay
    Close,
    /// Progress changed this frame; persist it
    ProgressChanged,
}

/// Phase of an active round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundPhase {
    /// Narration audio playing, portrait on screen
    Narration,
    /// Player is placing the figure on the axis
    Placing,
}

struct RoundState {
    game: TimelineGame,
    title: String,
    phase: RoundPhase,
}

struct RewardOverlay {
    texture: Option<TextureHandle>,
    playback: Option<Playback>,
}

/// The timeline overlay.
///
/// Opened either from the timeline button (browsing) or by triggering a
/// marker (a placement round with narration first).
pub struct TimelineScreen {
    round: Option<RoundState>,
    narration: Option<Playback>,
    rejection: Option<Playback>,
    rejected_slot: Option<String>,
    reward: Option<RewardOverlay>,
    pending_firework: Option<String>,
    images: HashMap<String, Option<TextureHandle>>,
    scroll_to: Option<String>,
}

impl TimelineScreen {
    pub fn new() -> Self {
        Self {
            round: None,
            narration: None,
            rejection: None,
            rejected_slot: None,
            reward: None,
            pending_firework: None,
            images: HashMap::new(),
            scroll_to: None,
        }
    }

    /// Open in browsing mode.
    pub fn open_browse(&mut self) {
        self.round = None;
        self.scroll_to = None;
    }

    /// Start a placement round for a triggered marker; plays its narration.
    pub fn begin_round(
        &mut self,
        marker: &Marker,
        progress: &CompletionSet,
        audio: Option<&AudioEngine>,
        paths: &AssetPaths,
    ) {
        let game = TimelineGame::begin(&marker.name, progress);
        let already_solved = game.solved();

        self.narration = audio.and_then(|engine| {
            match engine.play_file(&paths.marker_sound(&marker.name)) {
                Ok(playback) => Some(playback),
                Err(e) => {
                    tracing::warn!("narration unavailable: {}", e);
                    None
                }
            }
        });

        let phase = if self.narration.is_some() {
            RoundPhase::Narration
        } else {
            RoundPhase::Placing
        };

        self.round = Some(RoundState {
            game,
            title: marker.title.clone(),
            phase,
        });
        self.scroll_to = already_solved.then(|| marker.name.clone());
    }

    /// Drop any playing cues (overlay closed).
    fn stop_cues(&mut self) {
        if let Some(narration) = self.narration.take() {
            narration.pause();
        }
        if let Some(reward) = &self.reward {
            if let Some(playback) = &reward.playback {
                playback.stop();
            }
        }
        self.reward = None;
        self.rejection = None;
        self.rejected_slot = None;
    }

    /// Advance cue-driven state: the ends of narration, rejection and cheer
    /// playback each unlock the next step.
    fn poll_cues(&mut self) {
        if self.narration.as_ref().is_some_and(|p| p.is_finished()) {
            self.narration = None;
            if let Some(round) = &mut self.round {
                round.phase = RoundPhase::Placing;
            }
        }

        let rejection_done = match &self.rejection {
            Some(playback) => playback.is_finished(),
            None => self.rejected_slot.is_some(),
        };
        if rejection_done {
            self.rejection = None;
            self.rejected_slot = None;
            if let Some(round) = &mut self.round {
                round.game.rejection_finished();
            }
        }

        if let Some(reward) = &self.reward {
            let done = reward.playback.as_ref().map_or(true, |p| p.is_finished());
            if done {
                self.reward = None;
            }
        }
    }

    fn marker_image(
        &mut self,
        ctx: &Context,
        paths: &AssetPaths,
        name: &str,
    ) -> Option<TextureHandle> {
        self.images
            .entry(name.to_string())
            .or_insert_with(|| {
                match assets::load_image(&paths.marker_image(name)) {
                    Ok(image) => {
                        let size = [image.width() as usize, image.height() as usize];
                        let color =
                            egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                        Some(ctx.load_texture(
                            format!("marker-{name}"),
                            color,
                            egui::TextureOptions::LINEAR,
                        ))
                    }
                    Err(e) => {
                        tracing::warn!("no image for marker {}: {}", name, e);
                        None
                    }
                }
            })
            .clone()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn show(
        &mut self,
        ctx: &Context,
        markers: &[Marker],
        config: &TimelineConfig,
        progress: &mut CompletionSet,
        audio: Option<&AudioEngine>,
        paths: &AssetPaths,
        pools: &RewardPools,
    ) -> TimelineAction {
        self.poll_cues();

        let mut action = TimelineAction::None;

        egui::Area::new(egui::Id::new("timeline_dim"))
            .order(egui::Order::Background)
            .fixed_pos(Pos2::ZERO)
            .show(ctx, |ui| {
                ui.painter()
                    .rect_filled(ctx.screen_rect(), 0.0, GameTheme::OVERLAY_DIM);
            });

        let title = self
            .round
            .as_ref()
            .map(|r| r.title.clone())
            .unwrap_or_else(|| "Timeline".to_string());

        let screen = ctx.screen_rect();
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .fixed_size(Vec2::new(
                screen.width() - 30.0,
                screen.height() - 60.0,
            ))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("Close").clicked() {
                        self.stop_cues();
                        action = TimelineAction::Close;
                    }

                    match self.round.as_ref().map(|r| r.phase) {
                        Some(RoundPhase::Narration) => {
                            if ui.button("Skip").clicked() {
                                if let Some(narration) = self.narration.take() {
                                    narration.pause();
                                }
                                if let Some(round) = &mut self.round {
                                    round.phase = RoundPhase::Placing;
                                }
                            }
                        }
                        Some(RoundPhase::Placing) => {
                            if ui.button("Listen again").clicked() {
                                let name = self
                                    .round
                                    .as_ref()
                                    .map(|r| r.game.marker_name().to_string());
                                if let Some(name) = name {
                                    self.narration = audio.and_then(|engine| {
                                        engine.play_file(&paths.marker_sound(&name)).ok()
                                    });
                                    if self.narration.is_some() {
                                        if let Some(round) = &mut self.round {
                                            round.phase = RoundPhase::Narration;
                                        }
                                    }
                                }
                            }
                        }
                        None => {}
                    }
                });

                match self.round.as_ref().map(|r| r.phase) {
                    Some(RoundPhase::Narration) => {
                        let name = self
                            .round
                            .as_ref()
                            .map(|r| r.game.marker_name().to_string())
                            .unwrap_or_default();
                        if let Some(texture) = self.marker_image(ctx, paths, &name) {
                            ui.centered_and_justified(|ui| {
                                ui.add(
                                    egui::Image::new(&texture)
                                        .max_size(ui.available_size() * 0.9),
                                );
                            });
                        } else {
                            ui.centered_and_justified(|ui| {
                                ui.label("Listen...");
                            });
                        }
                    }
                    _ => {
                        if let Some(round) = &self.round {
                            if round.game.solved() {
                                ui.label(format!(
                                    "You placed {} on the timeline.",
                                    round.title
                                ));
                            } else {
                                ui.strong(format!("Place {} on the timeline!", round.title));
                            }
                        }

                        if let Some(result) =
                            self.show_axis(ui, ctx, markers, config, progress, audio, paths, pools)
                        {
                            action = result;
                        }
                    }
                }
            });

        self.show_reward_overlay(ctx, paths);
        action
    }

    /// The scrollable axis with tick marks and marker slots.
    #[allow(clippy::too_many_arguments)]
    fn show_axis(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &Context,
        markers: &[Marker],
        config: &TimelineConfig,
        progress: &mut CompletionSet,
        audio: Option<&AudioEngine>,
        paths: &AssetPaths,
        pools: &RewardPools,
    ) -> Option<TimelineAction> {
        let mut action = None;

        let slots = timeline::layout(markers, config);
        let content_height =
            config.year_to_px(config.end_year as f64) as f32 + config.slot_px() as f32;

        egui::ScrollArea::vertical().show(ui, |ui| {
            let (canvas, _) = ui.allocate_exact_size(
                Vec2::new(ui.available_width(), content_height),
                egui::Sense::hover(),
            );
            let painter = ui.painter_at(canvas);

            // Tick column.
            let mut year = config.start_year;
            while year <= config.end_year {
                let y = canvas.top() + config.year_to_px(year as f64) as f32;
                let text = if year % config.numeral_years == 0 {
                    year.to_string()
                } else {
                    "-".to_string()
                };
                painter.text(
                    Pos2::new(canvas.left() + 40.0, y),
                    egui::Align2::RIGHT_CENTER,
                    text,
                    egui::FontId::proportional(12.0),
                    GameTheme::TEXT_PRIMARY,
                );
                year += config.tick_years;
            }

            // Marker slots.
            let slot_px = config.slot_px() as f32;
            for (i, slot) in slots.iter().enumerate() {
                let top = canvas.top() + slot.top_px(config) as f32;
                let rect = Rect::from_min_size(
                    Pos2::new(canvas.left() + 70.0, top),
                    Vec2::splat(slot_px),
                );

                let hue = i as f32 / slots.len().max(1) as f32;
                let fill: Color32 = egui::ecolor::Hsva::new(hue, 1.0, 1.0, 0.5).into();
                painter.rect_filled(rect, 4.0, fill);

                // Connector from the slot to its true year on the axis.
                let year_y = canvas.top() + config.year_to_px(slot.year as f64) as f32;
                painter.line_segment(
                    [Pos2::new(canvas.left() + 45.0, year_y), rect.left_center()],
                    egui::Stroke::new(2.0, fill),
                );

                if progress.is_completed(&slot.name) {
                    self.draw_revealed_slot(ctx, &painter, rect, slot, paths);
                } else {
                    painter.text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "?",
                        egui::FontId::proportional(slot_px * 0.5),
                        GameTheme::TEXT_PRIMARY,
                    );
                }

                if self.rejected_slot.as_deref() == Some(slot.name.as_str()) {
                    painter.rect_filled(rect, 4.0, Color32::from_black_alpha(128));
                    painter.text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "✖",
                        egui::FontId::proportional(slot_px * 0.6),
                        Color32::RED,
                    );
                }

                if self.scroll_to.as_deref() == Some(slot.name.as_str()) {
                    ui.scroll_to_rect(rect, Some(Align::Center));
                    self.scroll_to = None;
                }

                // Tap handling only during an unsolved round.
                let round_active = self
                    .round
                    .as_ref()
                    .is_some_and(|r| !r.game.solved() && !progress.is_completed(&slot.name));
                if round_active {
                    let response = ui.interact(
                        rect,
                        ui.id().with(("slot", i)),
                        egui::Sense::click(),
                    );
                    if response.clicked() {
                        if let Some(result) =
                            self.handle_tap(&slot.name, progress, audio, paths, pools)
                        {
                            action = Some(result);
                        }
                    }
                }
            }
        });

        action
    }

    fn draw_revealed_slot(
        &mut self,
        ctx: &Context,
        painter: &egui::Painter,
        rect: Rect,
        slot: &timeline::TimelineSlot,
        paths: &AssetPaths,
    ) {
        if let Some(texture) = self.marker_image(ctx, paths, &slot.name) {
            let image_rect = rect.shrink(4.0);
            painter.image(
                texture.id(),
                image_rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        painter.text(
            rect.center_bottom() - Vec2::new(0.0, 8.0),
            egui::Align2::CENTER_CENTER,
            &slot.title,
            egui::FontId::proportional(11.0),
            GameTheme::TEXT_PRIMARY,
        );
    }

    fn handle_tap(
        &mut self,
        slot_name: &str,
        progress: &mut CompletionSet,
        audio: Option<&AudioEngine>,
        paths: &AssetPaths,
        pools: &RewardPools,
    ) -> Option<TimelineAction> {
        let round = self.round.as_mut()?;

        match round.game.tap(slot_name, progress) {
            PlacementOutcome::Correct => {
                let firework = pools.firework_path(pools.pick(pools.fireworks));
                let cheer = pools.cheer_path(pools.pick(pools.cheers));

                let playback =
                    audio.and_then(|engine| engine.play_file(&paths.media(&cheer)).ok());

                self.reward = Some(RewardOverlay {
                    texture: None,
                    playback,
                });
                self.pending_firework = Some(firework);
                self.scroll_to = Some(slot_name.to_string());
                Some(TimelineAction::ProgressChanged)
            }
            PlacementOutcome::Incorrect => {
                self.rejected_slot = Some(slot_name.to_string());
                self.rejection = audio.and_then(|engine| {
                    engine.play_file(&paths.media(pools.rejection_path())).ok()
                });
                None
            }
            PlacementOutcome::InputLocked | PlacementOutcome::AlreadySolved => None,
        }
    }

    /// Full-screen reward overlay with firework and "CORRECT" banner.
    fn show_reward_overlay(&mut self, ctx: &Context, paths: &AssetPaths) {
        let Some(reward) = &mut self.reward else {
            self.pending_firework = None;
            return;
        };

        // Load the firework texture on first show; a missing image still
        // leaves the banner and the cheer.
        if let Some(path) = self.pending_firework.take() {
            reward.texture = assets::load_image(&paths.media(&path)).ok().map(|image| {
                let size = [image.width() as usize, image.height() as usize];
                let color = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                ctx.load_texture("firework", color, egui::TextureOptions::LINEAR)
            });
        }

        egui::Area::new(egui::Id::new("reward_overlay"))
            .order(egui::Order::Foreground)
            .fixed_pos(Pos2::ZERO)
            .show(ctx, |ui| {
                let screen = ctx.screen_rect();
                ui.painter()
                    .rect_filled(screen, 0.0, GameTheme::OVERLAY_DARK);

                if let Some(texture) = &reward.texture {
                    let size = texture.size_vec2();
                    let max = screen.size() * 0.9;
                    let scale = (max.x / size.x).min(max.y / size.y).min(1.0);
                    let rect = Rect::from_center_size(screen.center(), size * scale);
                    ui.painter().image(
                        texture.id(),
                        rect,
                        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }

                ui.painter().text(
                    Pos2::new(screen.center().x, screen.top() + screen.height() * 0.1),
                    egui::Align2::CENTER_CENTER,
                    "CORRECT",
                    egui::FontId::proportional(36.0),
                    Color32::WHITE,
                );
            });
    }
}

impl Default for TimelineScreen {
    fn default() -> Self {
        Self::new()
    }
}
