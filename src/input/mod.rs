//! Input handling: control-mode resolution, geolocation, pointer picking.

pub mod geolocation;
pub mod picking;

pub use geolocation::{GeoError, GeoEvent, GeoProvider, GeoWatcher, ReplayProvider};
pub use picking::pick_marker;

/// Which input modality currently steers the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Follow geolocation fixes
    Gps,
    /// Steer by tapping the map
    Touch,
}

/// Resolves the active control mode.
///
/// Touch control is active when the player forced it in settings or when
/// geolocation has failed this session; a GPS failure is permanent until
/// restart.
#[derive(Debug, Clone, Default)]
pub struct ControlState {
    /// Player preference from settings
    pub force_touch: bool,
    /// Set once geolocation errors; never cleared within a session
    gps_failed: bool,
}

impl ControlState {
    pub fn new(force_touch: bool) -> Self {
        Self {
            force_touch,
            gps_failed: false,
        }
    }

    pub fn mark_gps_failed(&mut self) {
        self.gps_failed = true;
    }

    pub fn gps_failed(&self) -> bool {
        self.gps_failed
    }

    pub fn mode(&self) -> ControlMode {
        if self.force_touch || self.gps_failed {
            ControlMode::Touch
        } else {
            ControlMode::Gps
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gps_failure_forces_touch_permanently() {
        let mut state = ControlState::new(false);
        assert_eq!(state.mode(), ControlMode::Gps);

        state.mark_gps_failed();
        assert_eq!(state.mode(), ControlMode::Touch);

        // Un-forcing touch cannot bring GPS back after a failure.
        state.force_touch = false;
        assert_eq!(state.mode(), ControlMode::Touch);
    }

    #[test]
    fn test_forced_touch_overrides_working_gps() {
        let state = ControlState::new(true);
        assert_eq!(state.mode(), ControlMode::Touch);
    }
}
