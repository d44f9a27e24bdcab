//! Player avatar: selectable models, navigation, and walk-animation blend.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::geo::GeoPosition;
use crate::world::bridge::CoordinateBridge;

/// Longest time one navigation leg may take, in seconds. Commands arriving
/// faster than this (GPS fixes, rapid taps) finish in the gap between them.
pub const MAX_LEG_SECONDS: f64 = 1.5;

/// Descriptor for one loadable avatar model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerModel {
    /// Display name, also the key persisted in settings
    pub name: String,
    /// Directory holding scene.gltf, preview.png and license.txt
    pub asset_path: String,
    /// Uniform scale applied to the loaded scene
    pub scale: f32,
    /// Which animation clip is the walk cycle
    #[serde(default)]
    pub animation_index: usize,
    /// Stop the walk clip entirely when idle instead of pausing it
    #[serde(default)]
    pub stop_after_intro: bool,
    /// Playback-rate multiplier for the walk clip
    #[serde(default = "default_time_scale")]
    pub walk_time_scale: f32,
}

fn default_time_scale() -> f32 {
    1.0
}

impl PlayerModel {
    fn new(name: &str, scale: f32) -> Self {
        Self {
            name: name.to_string(),
            asset_path: format!("models/{}/", name.to_lowercase()),
            scale,
            animation_index: 0,
            stop_after_intro: false,
            walk_time_scale: 1.0,
        }
    }
}

/// The selectable avatar roster.
pub fn builtin_models() -> Vec<PlayerModel> {
    vec![
        PlayerModel::new("Mei", 3.0),
        PlayerModel::new("Paul", 1.5),
        PlayerModel::new("Sonic", 1.5),
        PlayerModel {
            animation_index: 4,
            stop_after_intro: true,
            ..PlayerModel::new("Naruto", 3.0)
        },
        PlayerModel {
            stop_after_intro: true,
            ..PlayerModel::new("Luoli", 0.03)
        },
        PlayerModel {
            walk_time_scale: 2.0,
            ..PlayerModel::new("Timo", 1.0)
        },
    ]
}

/// Walk-clip playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    /// Clip advancing
    Walking,
    /// Clip frozen mid-cycle
    #[default]
    Paused,
    /// Clip reset to its start (stop_after_intro models)
    Stopped,
}

/// The active avatar.
#[derive(Debug, Clone)]
pub struct Avatar {
    /// Which model is loaded
    pub model: PlayerModel,
    /// Heading in radians; the avatar snaps to face each new target
    pub heading_yaw: f64,
    /// Current walk-clip state
    pub animation: AnimationState,
}

impl Avatar {
    pub fn new(model: PlayerModel) -> Self {
        Self {
            model,
            heading_yaw: 0.0,
            animation: AnimationState::Paused,
        }
    }

    /// Snap the heading to face a geographic target. No turn animation: a
    /// new command re-aims instantly.
    pub fn face(&mut self, bridge: &CoordinateBridge, target: &GeoPosition) {
        let dir = bridge.scene_from_geo(target);
        if DVec3::new(dir.x, 0.0, dir.z).length() > 1e-9 {
            self.heading_yaw = dir.x.atan2(dir.z);
        }
    }

    fn settle(&mut self) {
        self.animation = if self.model.stop_after_intro {
            AnimationState::Stopped
        } else {
            AnimationState::Paused
        };
    }
}

/// Interpolates the map center toward the last commanded target.
///
/// Each command's duration equals the time since the previous command,
/// capped at [`MAX_LEG_SECONDS`]; a stream of GPS fixes therefore plays out
/// as a continuous walk, while an isolated tap takes the full cap.
#[derive(Debug, Clone)]
pub struct Navigator {
    target: GeoPosition,
    remaining: f64,
}

impl Navigator {
    pub fn new(target: GeoPosition) -> Self {
        Self {
            target,
            remaining: 0.0,
        }
    }

    pub fn target(&self) -> GeoPosition {
        self.target
    }

    /// Accept a new navigation command.
    ///
    /// `since_last_command` is the wall-clock gap to the previous command in
    /// seconds. Resets the leg timer and re-aims the avatar.
    pub fn command(
        &mut self,
        avatar: &mut Avatar,
        bridge: &CoordinateBridge,
        target: GeoPosition,
        since_last_command: f64,
    ) {
        avatar.face(bridge, &target);
        avatar.animation = AnimationState::Walking;
        self.remaining = since_last_command.min(MAX_LEG_SECONDS).max(0.0);
        self.target = target;
    }

    /// Advance one frame; moves `center` toward the target and settles the
    /// walk clip when the leg runs out. Returns true while still moving.
    pub fn update(&mut self, avatar: &mut Avatar, center: &mut GeoPosition, dt: f64) -> bool {
        if self.remaining <= 0.0 {
            avatar.settle();
            return false;
        }

        avatar.animation = AnimationState::Walking;

        let t = (dt / self.remaining).min(1.0);
        *center = center.lerp(&self.target, t);
        self.remaining -= dt;

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge_at(center: &GeoPosition) -> CoordinateBridge {
        CoordinateBridge::new(center)
    }

    #[test]
    fn test_builtin_roster() {
        let models = builtin_models();
        assert_eq!(models.len(), 6);
        assert!(models
            .iter()
            .any(|m| m.name == "Naruto" && m.animation_index == 4));
        assert_eq!(models[0].asset_path, "models/mei/");
    }

    #[test]
    fn test_navigation_reaches_target() {
        let start = GeoPosition::new(9.0, 49.0);
        let target = GeoPosition::new(9.001, 49.001);
        let mut avatar = Avatar::new(builtin_models().remove(0));
        let mut nav = Navigator::new(start);
        let mut center = start;

        nav.command(&mut avatar, &bridge_at(&center), target, 10.0);
        assert_eq!(avatar.animation, AnimationState::Walking);

        // Leg capped at 1.5 s; sixteen 0.1 s frames are plenty.
        for _ in 0..16 {
            nav.update(&mut avatar, &mut center, 0.1);
        }

        assert!((center.lng - target.lng).abs() < 1e-9);
        assert!((center.lat - target.lat).abs() < 1e-9);
        assert_eq!(avatar.animation, AnimationState::Paused);
    }

    #[test]
    fn test_rapid_commands_use_command_gap() {
        let start = GeoPosition::new(9.0, 49.0);
        let mut avatar = Avatar::new(builtin_models().remove(0));
        let mut nav = Navigator::new(start);
        let mut center = start;

        // A GPS fix 0.2 s after the previous one finishes in 0.2 s.
        nav.command(
            &mut avatar,
            &bridge_at(&center),
            GeoPosition::new(9.0005, 49.0),
            0.2,
        );

        assert!(nav.update(&mut avatar, &mut center, 0.1));
        assert!(nav.update(&mut avatar, &mut center, 0.1));
        assert!(!nav.update(&mut avatar, &mut center, 0.1));
        assert!((center.lng - 9.0005).abs() < 1e-9);
    }

    #[test]
    fn test_stop_after_intro_models_stop() {
        let start = GeoPosition::new(9.0, 49.0);
        let luoli = builtin_models()
            .into_iter()
            .find(|m| m.stop_after_intro)
            .unwrap();
        let mut avatar = Avatar::new(luoli);
        let mut nav = Navigator::new(start);
        let mut center = start;

        nav.command(
            &mut avatar,
            &bridge_at(&center),
            GeoPosition::new(9.0001, 49.0),
            5.0,
        );
        while nav.update(&mut avatar, &mut center, 0.25) {}

        assert_eq!(avatar.animation, AnimationState::Stopped);
    }

    #[test]
    fn test_new_command_snaps_heading() {
        let center = GeoPosition::new(9.0, 49.0);
        let mut avatar = Avatar::new(builtin_models().remove(0));
        let mut nav = Navigator::new(center);

        // Target due east: heading along +x.
        nav.command(
            &mut avatar,
            &bridge_at(&center),
            GeoPosition::new(9.001, 49.0),
            1.0,
        );
        assert!((avatar.heading_yaw - std::f64::consts::FRAC_PI_2).abs() < 1e-6);

        // Re-aim due north (negative z): yaw flips to ±π.
        nav.command(
            &mut avatar,
            &bridge_at(&center),
            GeoPosition::new(9.0, 49.001),
            1.0,
        );
        assert!((avatar.heading_yaw.abs() - std::f64::consts::PI).abs() < 1e-6);
    }
}
