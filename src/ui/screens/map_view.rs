//! The main map screen.
//!
//! Paints the raster base map as projected tile quads, the marker and
//! avatar sprites on top, and routes taps: marker pick first, then (in
//! touch mode) navigation. Corner buttons open the overlays.

use std::collections::HashMap;

use egui::{Color32, Context, Pos2, Rect, TextureHandle, Vec2};
use glam::DVec2;

use crate::geo::{GeoPosition, MercatorCoord};
use crate::input::{pick_marker, picking};
use crate::map::{MapTransform, TileFetcher, TileId};
use crate::ui::theme::GameTheme;
use crate::world::{FrameState, World};

/// What the map screen wants the app to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapAction {
    None,
    OpenSettings,
    OpenInfo,
    OpenModelSelect,
    OpenTimeline,
    /// A reachable marker was tapped
    TriggerMarker(usize),
    /// The map was tapped in touch-control mode
    Navigate(GeoPosition),
}

/// How many tiles around the center tile to keep on screen.
const TILE_RING: i32 = 2;

/// The map view.
pub struct MapViewScreen {
    tiles: HashMap<TileId, TextureHandle>,
}

impl MapViewScreen {
    pub fn new() -> Self {
        Self {
            tiles: HashMap::new(),
        }
    }

    /// Upload freshly fetched tiles and request missing ones.
    fn update_tiles(&mut self, ctx: &Context, transform: &MapTransform, fetcher: &mut TileFetcher) {
        for fetched in fetcher.poll() {
            let size = [
                fetched.image.width() as usize,
                fetched.image.height() as usize,
            ];
            let color = egui::ColorImage::from_rgba_unmultiplied(size, fetched.image.as_raw());
            let texture = ctx.load_texture(
                format!("tile-{}-{}-{}", fetched.id.z, fetched.id.x, fetched.id.y),
                color,
                egui::TextureOptions::LINEAR,
            );
            self.tiles.insert(fetched.id, texture);
        }

        for id in self.visible_tiles(transform) {
            if !self.tiles.contains_key(&id) {
                fetcher.request(id);
            }
        }
    }

    /// Tile ring around the center at the integer zoom level.
    fn visible_tiles(&self, transform: &MapTransform) -> Vec<TileId> {
        let z = transform.zoom().floor() as u8;
        let merc = MercatorCoord::from_geo(&transform.center());
        let center = TileId::containing(&merc, z);
        let n = 1i64 << z;

        let mut tiles = Vec::new();
        for dy in -TILE_RING..=TILE_RING {
            for dx in -TILE_RING..=TILE_RING {
                let x = center.x as i64 + dx as i64;
                let y = center.y as i64 + dy as i64;
                if x < 0 || y < 0 || x >= n || y >= n {
                    continue;
                }
                tiles.push(TileId {
                    z,
                    x: x as u32,
                    y: y as u32,
                });
            }
        }
        tiles
    }

    /// Draw one tile as a projected quad. The corners go through the full
    /// camera transform, so pitch and bearing come out right; within a tile
    /// the warp is affine, which at street zoom is invisible.
    fn draw_tile(
        &self,
        painter: &egui::Painter,
        transform: &MapTransform,
        id: TileId,
        texture: &TextureHandle,
    ) {
        let (mx, my) = id.mercator_origin();
        let extent = id.mercator_extent();

        let corners = [
            (mx, my),
            (mx + extent, my),
            (mx + extent, my + extent),
            (mx, my + extent),
        ];

        let mut screen = [Pos2::ZERO; 4];
        for (i, (cx, cy)) in corners.iter().enumerate() {
            let geo = MercatorCoord {
                x: *cx,
                y: *cy,
                z: 0.0,
            }
            .to_geo();
            match transform.screen_from_geo(&geo) {
                Some(p) => screen[i] = Pos2::new(p.x as f32, p.y as f32),
                None => return,
            }
        }

        let uv = [
            Pos2::new(0.0, 0.0),
            Pos2::new(1.0, 0.0),
            Pos2::new(1.0, 1.0),
            Pos2::new(0.0, 1.0),
        ];

        let mut mesh = egui::Mesh::with_texture(texture.id());
        for i in 0..4 {
            mesh.vertices.push(egui::epaint::Vertex {
                pos: screen[i],
                uv: uv[i],
                color: Color32::WHITE,
            });
        }
        mesh.indices.extend([0, 1, 2, 0, 2, 3]);
        painter.add(mesh);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        transform: &mut MapTransform,
        world: &World,
        frame: &FrameState,
        fetcher: &mut TileFetcher,
        avatar_preview: Option<&TextureHandle>,
        touch_control: bool,
    ) -> MapAction {
        let mut action = MapAction::None;

        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        transform.resize(rect.width() as f64, rect.height() as f64);

        self.update_tiles(ui.ctx(), transform, fetcher);

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_rgb(222, 222, 214));

        // Base map.
        let mut visible = self.visible_tiles(transform);
        visible.retain(|id| self.tiles.contains_key(id));
        for id in visible {
            let texture = &self.tiles[&id];
            self.draw_tile(&painter, transform, id, texture);
        }

        let origin = rect.min;
        let to_screen =
            |p: DVec2| Pos2::new(origin.x + p.x as f32, origin.y + p.y as f32);

        // Pulse ring around the avatar (the avatar is the map center).
        let center_screen = to_screen(transform.center_point());
        let ring = &world.ring;
        let ring_px =
            (ring.radius * ring.scale() * transform.pixels_per_meter()) as f32;
        if ring_px > 0.5 {
            let alpha = (ring.opacity() * 255.0) as u8;
            painter.circle_stroke(
                center_screen,
                ring_px,
                egui::Stroke::new(3.0, Color32::from_rgba_unmultiplied(190, 186, 182, alpha)),
            );
        }

        // Marker sprites, colored by closeness.
        for (marker, state) in world
            .markers
            .markers()
            .iter()
            .zip(world.markers.frames().iter())
        {
            let Some(screen) = transform.screen_from_geo(&marker.position) else {
                continue;
            };
            let pos = to_screen(screen);
            if !rect.expand(40.0).contains(pos) {
                continue;
            }

            let color = Color32::from_rgb(
                (state.color[0] * 255.0) as u8,
                (state.color[1] * 255.0) as u8,
                (state.color[2] * 255.0) as u8,
            );

            // Pin: circle head on a short stem, anchored at the ground point.
            let head = pos - Vec2::new(0.0, 22.0);
            painter.line_segment([pos, head], egui::Stroke::new(4.0, color));
            painter.circle_filled(head, 12.0, color);
            if state.reachable {
                painter.circle_stroke(
                    head,
                    14.0,
                    egui::Stroke::new(2.0, GameTheme::REACHABLE_OUTLINE),
                );
            }
        }

        // Avatar sprite at the center with a heading tick.
        let heading = world.avatar.heading_yaw;
        let dir = Vec2::new(heading.sin() as f32, -heading.cos() as f32);
        painter.circle_filled(center_screen, 8.0, GameTheme::ACCENT);
        painter.line_segment(
            [center_screen, center_screen + dir * 16.0],
            egui::Stroke::new(3.0, GameTheme::ACCENT),
        );

        // Zoom with the scroll wheel, around the center like the original.
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll.abs() > 0.0 && response.hovered() {
            transform.zoom_by(scroll as f64 * 0.005);
        }
        // Horizontal drag rotates the bearing.
        if response.dragged() {
            transform.rotate_by_deg(response.drag_delta().x as f64 * 0.3);
        }

        // Tap routing: markers first, then navigation.
        if response.clicked() {
            if let Some(click) = response.interact_pointer_pos() {
                let local = DVec2::new(
                    (click.x - origin.x) as f64,
                    (click.y - origin.y) as f64,
                );
                let ndc = picking::ndc_from_screen(local, transform.viewport());

                let picked = pick_marker(ndc, &frame.scene_projection, &world.markers)
                    .filter(|i| world.markers.frames()[*i].reachable);

                if let Some(index) = picked {
                    action = MapAction::TriggerMarker(index);
                } else if touch_control {
                    action = MapAction::Navigate(transform.point_location(local));
                }
            }
        }

        // Corner buttons.
        let button_action = self.corner_buttons(ui, rect, avatar_preview);
        if button_action != MapAction::None {
            action = button_action;
        }

        action
    }

    fn corner_buttons(
        &self,
        ui: &mut egui::Ui,
        rect: Rect,
        avatar_preview: Option<&TextureHandle>,
    ) -> MapAction {
        let mut action = MapAction::None;

        egui::Area::new(egui::Id::new("map_buttons"))
            .fixed_pos(rect.min + Vec2::new(8.0, 8.0))
            .show(ui.ctx(), |ui| {
                ui.horizontal(|ui| {
                    if ui.button("⚙").on_hover_text("Settings").clicked() {
                        action = MapAction::OpenSettings;
                    }
                    if ui.button("ℹ").on_hover_text("Info").clicked() {
                        action = MapAction::OpenInfo;
                    }
                    if ui.button("🕒").on_hover_text("Timeline").clicked() {
                        action = MapAction::OpenTimeline;
                    }

                    let avatar_clicked = match avatar_preview {
                        Some(texture) => ui
                            .add(
                                egui::ImageButton::new(
                                    egui::Image::new(texture)
                                        .fit_to_exact_size(Vec2::splat(28.0)),
                                ),
                            )
                            .clicked(),
                        None => ui.button("👤").clicked(),
                    };
                    if avatar_clicked {
                        action = MapAction::OpenModelSelect;
                    }
                });
            });

        action
    }
}

impl Default for MapViewScreen {
    fn default() -> Self {
        Self::new()
    }
}
