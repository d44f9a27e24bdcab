//! Historical-figure markers and per-frame reachability.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::color::{self, Srgb};
use super::ramp;
use crate::geo::GeoPosition;
use crate::world::bridge::CoordinateBridge;

/// A historical-figure marker placed in the world.
///
/// Immutable after load; the per-frame scene state lives in
/// [`MarkerFrame`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    /// Display name of the historical figure
    pub title: String,
    /// Unique key, also the media directory name
    pub name: String,
    /// Where the marker stands
    pub position: GeoPosition,
    /// Year the figure is associated with
    pub year: i32,
}

impl Marker {
    pub fn new(title: &str, name: &str, lng: f64, lat: f64, year: i32) -> Self {
        Self {
            title: title.to_string(),
            name: name.to_string(),
            position: GeoPosition::new(lng, lat),
            year,
        }
    }
}

/// Distance thresholds for marker interaction, tuned by eye in the original
/// campaign; kept as named configuration instead of magic numbers.
#[derive(Debug, Clone)]
pub struct ReachabilityConfig {
    /// Distance at which a marker counts as fully close, in meters
    pub near_m: f64,
    /// Distance at which a marker counts as fully far, in meters
    pub far_m: f64,
    /// Closeness value above which the marker becomes reachable
    pub reachable_cutoff: f64,
}

impl Default for ReachabilityConfig {
    fn default() -> Self {
        Self {
            near_m: 40.0,
            far_m: 60.0,
            reachable_cutoff: 0.5,
        }
    }
}

/// Highlight colors for the closeness sweep.
#[derive(Debug, Clone)]
pub struct HighlightPalette {
    /// Color of a marker within reach
    pub near: Srgb,
    /// Color of a distant marker
    pub far: Srgb,
}

impl Default for HighlightPalette {
    fn default() -> Self {
        Self {
            near: color::from_u8(0, 0, 139),
            far: color::from_u8(44, 136, 255),
        }
    }
}

/// Transient per-frame scene state of one marker.
#[derive(Debug, Clone, Copy)]
pub struct MarkerFrame {
    /// Scene position in meters relative to the map center
    pub scene_position: DVec3,
    /// Yaw toward the camera ground point, in radians
    pub facing_yaw: f64,
    /// Normalized proximity, 1 at `near_m` and closer, 0 at `far_m` and beyond
    pub closeness: f64,
    /// Current highlight color
    pub color: Srgb,
    /// Whether tapping this marker triggers it
    pub reachable: bool,
}

impl Default for MarkerFrame {
    fn default() -> Self {
        Self {
            scene_position: DVec3::ZERO,
            facing_yaw: 0.0,
            closeness: 0.0,
            color: HighlightPalette::default().far,
            reachable: false,
        }
    }
}

/// All markers plus their per-frame state.
pub struct MarkerSet {
    markers: Vec<Marker>,
    frames: Vec<MarkerFrame>,
    config: ReachabilityConfig,
    palette: HighlightPalette,
}

impl MarkerSet {
    pub fn new(markers: Vec<Marker>, config: ReachabilityConfig, palette: HighlightPalette) -> Self {
        let frames = vec![MarkerFrame::default(); markers.len()];
        Self {
            markers,
            frames,
            config,
            palette,
        }
    }

    pub fn with_defaults(markers: Vec<Marker>) -> Self {
        Self::new(
            markers,
            ReachabilityConfig::default(),
            HighlightPalette::default(),
        )
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn frames(&self) -> &[MarkerFrame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<(&Marker, &MarkerFrame)> {
        Some((self.markers.get(index)?, self.frames.get(index)?))
    }

    pub fn by_name(&self, name: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.name == name)
    }

    /// Recompute every marker's scene state for the current frame.
    ///
    /// `camera_ground` is the camera look point with its height dropped to
    /// the ground plane; the distance measure is planar on purpose, the
    /// camera's altitude must not push markers out of reach.
    pub fn update_frame(&mut self, bridge: &CoordinateBridge, camera_ground: DVec3) {
        for (marker, frame) in self.markers.iter().zip(self.frames.iter_mut()) {
            let scene_position = bridge.scene_from_geo(&marker.position);

            let to_camera = camera_ground - scene_position;
            let facing_yaw = to_camera.x.atan2(to_camera.z);

            let distance = scene_position.length();
            let farness = ramp(self.config.near_m, self.config.far_m, distance);
            let closeness = 1.0 - farness;

            *frame = MarkerFrame {
                scene_position,
                facing_yaw,
                closeness,
                color: color::mix(self.palette.far, self.palette.near, closeness as f32),
                reachable: closeness > self.config.reachable_cutoff,
            };
        }
    }
}

/// The built-in campaign: ten figures from a millennium of town history.
pub fn builtin_markers() -> Vec<Marker> {
    vec![
        Marker::new("Liudolf", "stiftskirche", 9.146006727402352, 49.973420131538234, 950),
        Marker::new("Willigis", "willigis_bruecke", 9.141077866185924, 49.97184032912233, 989),
        Marker::new("Hund Otto", "altstadt", 9.143238557511694, 49.973269579558774, 1122),
        Marker::new(
            "Albrecht von Brandenburg",
            "schoental_ruine",
            9.151180069019205,
            49.97534736445891,
            1544,
        ),
        Marker::new("Georg Ridinger", "schloss", 9.142131607183956, 49.9755936415456, 1605),
        Marker::new(
            "Johann Schweickard von Kronberg",
            "kronberg",
            9.143592104550777,
            49.97546881166781,
            1620,
        ),
        Marker::new("Pilger", "pilgerbrunnen", 9.145791266971258, 49.97387844558844, 1700),
        Marker::new(
            "Friedrich Carl von Erthal",
            "schoental",
            9.153218714184447,
            49.97449013687282,
            1775,
        ),
        Marker::new(
            "Karl Theodor von Dalberg",
            "stadttheater",
            9.144483317758414,
            49.9744341620889,
            1811,
        ),
        Marker::new(
            "Ludwig I von Bayern",
            "pompejanum",
            9.136472355974632,
            49.97739471769839,
            1840,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_markers_sorted_and_unique() {
        let markers = builtin_markers();
        assert_eq!(markers.len(), 10);

        for pair in markers.windows(2) {
            assert!(pair[0].year < pair[1].year);
        }

        let mut names: Vec<_> = markers.iter().map(|m| m.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_reachable_flips_at_cutoff() {
        // Center the world right on a marker, then walk the center away and
        // watch the flag flip exactly once.
        let marker = Marker::new("Test", "test", 9.0, 49.0, 1000);
        let mut set = MarkerSet::with_defaults(vec![marker]);

        let mut last_reachable = true;
        let mut flips = 0;
        for step in 0..200 {
            // ~0.7 m per step of eastward center drift
            let center = GeoPosition::new(9.0 + step as f64 * 1e-5, 49.0);
            let bridge = CoordinateBridge::new(&center);
            set.update_frame(&bridge, DVec3::ZERO);

            let reachable = set.frames()[0].reachable;
            if reachable != last_reachable {
                flips += 1;
                // The flag must only ever flip off as distance grows.
                assert!(!reachable);
            }
            last_reachable = reachable;
        }

        assert_eq!(flips, 1);
    }

    #[test]
    fn test_closeness_ramp_bounds() {
        let marker = Marker::new("Test", "test", 9.0, 49.0, 1000);
        let mut set = MarkerSet::with_defaults(vec![marker]);

        // On top of the marker: fully close, near color.
        let bridge = CoordinateBridge::new(&GeoPosition::new(9.0, 49.0));
        set.update_frame(&bridge, DVec3::ZERO);
        assert!((set.frames()[0].closeness - 1.0).abs() < 1e-9);
        assert!(set.frames()[0].reachable);

        // Far away: fully far, not reachable.
        let bridge = CoordinateBridge::new(&GeoPosition::new(9.01, 49.0));
        set.update_frame(&bridge, DVec3::ZERO);
        assert!(set.frames()[0].closeness.abs() < 1e-9);
        assert!(!set.frames()[0].reachable);
    }
}
