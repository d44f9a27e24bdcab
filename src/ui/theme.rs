//! UI theme definitions.

use egui::{Color32, Visuals};

/// The game's palette: parchment panels with leaf-green chrome.
pub struct GameTheme;

impl GameTheme {
    /// Panel background
    pub const PANEL_BG: Color32 = Color32::from_rgb(228, 237, 215);
    /// Card background
    pub const CARD_BG: Color32 = Color32::from_rgb(217, 233, 198);
    /// Accent and border color
    pub const ACCENT: Color32 = Color32::from_rgb(127, 184, 46);
    /// Primary text
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(32, 40, 24);
    /// Dim overlay behind modal panels
    pub const OVERLAY_DIM: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 77);
    /// Darker dim for reward overlays
    pub const OVERLAY_DARK: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 204);
    /// Marker sprite outline when reachable
    pub const REACHABLE_OUTLINE: Color32 = Color32::from_rgb(255, 255, 255);
}

/// egui visuals for the game look.
pub fn visuals() -> Visuals {
    let mut visuals = Visuals::light();

    visuals.panel_fill = GameTheme::PANEL_BG;
    visuals.window_fill = GameTheme::PANEL_BG;
    visuals.window_stroke = egui::Stroke::new(4.0, GameTheme::ACCENT);
    visuals.widgets.inactive.bg_fill = GameTheme::CARD_BG;
    visuals.widgets.hovered.bg_fill = GameTheme::ACCENT.gamma_multiply(0.6);
    visuals.widgets.active.bg_fill = GameTheme::ACCENT;
    visuals.override_text_color = Some(GameTheme::TEXT_PRIMARY);
    visuals.selection.bg_fill = GameTheme::ACCENT;

    visuals
}
