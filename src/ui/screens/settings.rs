//! Settings overlay.

use egui::Context;

use crate::storage::Settings;
use crate::ui::theme::GameTheme;

/// What the settings screen wants the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    None,
    /// Close without changes
    Close,
    /// Persist the edited values and close
    SaveAndClose,
    /// Persist and restart: the style change only applies to a fresh map
    SaveAndRestart,
    /// Wipe all placement progress
    ResetProgress,
}

/// Settings overlay state; edits live here until saved.
pub struct SettingsScreen {
    enable_3d: bool,
    touch_control: bool,
}

impl SettingsScreen {
    pub fn new(settings: &Settings, gps_failed: bool) -> Self {
        Self {
            enable_3d: settings.enable_3d,
            touch_control: settings.force_touch_control || gps_failed,
        }
    }

    /// Copy the edited values back into settings.
    pub fn apply(&self, settings: &mut Settings, gps_failed: bool) {
        settings.enable_3d = self.enable_3d;
        // With GPS down the checkbox is forced on and doesn't reflect a
        // preference; don't persist it as one.
        if !gps_failed {
            settings.force_touch_control = self.touch_control;
        }
    }

    pub fn show(&mut self, ctx: &Context, settings: &Settings, gps_failed: bool) -> SettingsAction {
        let mut action = SettingsAction::None;

        egui::Area::new(egui::Id::new("settings_dim"))
            .order(egui::Order::Background)
            .fixed_pos(egui::Pos2::ZERO)
            .show(ctx, |ui| {
                ui.painter()
                    .rect_filled(ctx.screen_rect(), 0.0, GameTheme::OVERLAY_DIM);
            });

        egui::Window::new("Settings")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_min_width(420.0);

                ui.heading("3D mode");
                ui.label(
                    "Renders buildings three-dimensionally on the map. Can cause \
                     performance problems on weak devices. Changing this requires \
                     a restart of the game.",
                );
                ui.checkbox(&mut self.enable_3d, "Enable 3D mode");

                ui.add_space(12.0);

                ui.heading("Controls");
                ui.label(
                    "The game is steered either by your location or by tapping \
                     the map. If your device has no location source, touch \
                     control switches on automatically.",
                );
                ui.add_enabled(
                    !gps_failed,
                    egui::Checkbox::new(&mut self.touch_control, "Use touch control"),
                );

                ui.add_space(12.0);

                ui.heading("Progress");
                ui.label("Removes every placed figure from the timeline.");
                if ui.button("Reset all progress").clicked() {
                    action = SettingsAction::ResetProgress;
                }

                ui.add_space(16.0);

                // The close button doubles as the save button; its label says
                // what will happen.
                let style_changed = self.enable_3d != settings.enable_3d;
                let touch_changed =
                    self.touch_control != (settings.force_touch_control || gps_failed);
                let label = if style_changed {
                    "Save and restart"
                } else if touch_changed {
                    "Save and close"
                } else {
                    "Close"
                };

                if ui.button(label).clicked() {
                    action = if style_changed {
                        SettingsAction::SaveAndRestart
                    } else if touch_changed {
                        SettingsAction::SaveAndClose
                    } else {
                        SettingsAction::Close
                    };
                }
            });

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_respects_gps_failure() {
        let mut settings = Settings::default();

        // GPS down: the forced-on checkbox must not end up persisted.
        let screen = SettingsScreen::new(&settings, true);
        assert!(screen.touch_control);
        screen.apply(&mut settings, true);
        assert!(!settings.force_touch_control);

        // GPS fine: the preference persists.
        let mut screen = SettingsScreen::new(&settings, false);
        screen.touch_control = true;
        screen.apply(&mut settings, false);
        assert!(settings.force_touch_control);
    }
}
