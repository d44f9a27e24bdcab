//! Coordinate bridge between the map and the 3D scene.
//!
//! Scene space is y-up with one unit per meter, centered on the current map
//! center. The bridge is rebuilt every frame on the new center; keeping the
//! origin at the center is what preserves f32-friendly magnitudes at high
//! zoom; without it the scene jitters.

use glam::{DMat4, DVec3};
use std::f64::consts::FRAC_PI_2;

use crate::geo::{GeoPosition, MercatorCoord};

/// Per-frame converter between geographic and scene coordinates.
#[derive(Debug, Clone)]
pub struct CoordinateBridge {
    center: MercatorCoord,
    /// Mercator units spanned by one meter at the center latitude
    units_per_meter: f64,
}

impl CoordinateBridge {
    pub fn new(center: &GeoPosition) -> Self {
        let center = MercatorCoord::from_geo(&GeoPosition::new(center.lng, center.lat));
        Self {
            units_per_meter: center.meter_in_mercator_units(),
            center,
        }
    }

    /// Mercator (x, y, z) into scene axes: x stays east, Mercator z (up)
    /// becomes scene y, Mercator y (south) becomes scene z.
    fn scene_from_mercator(&self, merc: &MercatorCoord) -> DVec3 {
        DVec3::new(merc.x, merc.z, merc.y) / self.units_per_meter
    }

    /// Scene position of a geographic point, in meters relative to the map
    /// center.
    pub fn scene_from_geo(&self, pos: &GeoPosition) -> DVec3 {
        self.scene_from_mercator(&MercatorCoord::from_geo(pos))
            - self.scene_from_mercator(&self.center)
    }

    /// Inverse of [`scene_from_geo`](Self::scene_from_geo).
    pub fn geo_from_scene(&self, scene: DVec3) -> GeoPosition {
        let s = self.units_per_meter;
        let merc = MercatorCoord {
            x: self.center.x + scene.x * s,
            y: self.center.y + scene.z * s,
            z: self.center.z + scene.y * s,
        };
        merc.to_geo()
    }

    /// Compose the map's mercator-space view-projection into a scene-space
    /// projection matrix.
    ///
    /// Translation moves scene origin to the mercator center, the
    /// non-uniform scale (y flipped) converts meters back to mercator units,
    /// and the quarter-turn around x reconciles the differing up axes.
    pub fn scene_projection(&self, mercator_view_proj: &DMat4) -> DMat4 {
        let s = self.units_per_meter;
        *mercator_view_proj
            * DMat4::from_translation(DVec3::new(self.center.x, self.center.y, self.center.z))
            * DMat4::from_scale(DVec3::new(s, -s, s))
            * DMat4::from_rotation_x(FRAC_PI_2)
    }
}
