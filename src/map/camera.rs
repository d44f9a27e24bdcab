//! Camera pose recovery.
//!
//! The map transform never stores an explicit camera position; this inverts
//! its known perspective construction to recover one. Pitch drives altitude
//! through a cosine and a ground offset through a tangent; the offset point
//! is pushed back through the transform's own ground unprojection, and the
//! pixel altitude is converted to meters with the Mercator vertical scale at
//! that latitude.

use glam::DVec2;
use std::f64::consts::PI;

use super::transform::MapTransform;
use crate::geo::GeoPosition;

/// WGS84 equatorial radius in meters, as used by the vertical scale constant.
const WGS84_EQUATORIAL_RADIUS_M: f64 = 6_378_137.0;

/// Synthetic camera pose derived from the map transform.
#[derive(Debug, Clone, Copy)]
pub struct CameraPose {
    /// Ground position beneath the camera, altitude in meters.
    pub position: GeoPosition,
    /// Camera pitch in degrees.
    pub pitch_deg: f64,
}

impl CameraPose {
    /// One-shot closed-form extraction; invoked once per rendered frame.
    pub fn extract(transform: &MapTransform) -> Self {
        let pitch = transform.pitch();
        let distance = transform.camera_to_center_distance();

        let altitude_px = pitch.cos() * distance;
        let lat_offset_px = pitch.tan() * distance;

        let ground_point = transform.center_point() + DVec2::new(0.0, lat_offset_px);
        let ground = transform.point_location(ground_point);

        let vertical_scale = transform.world_size()
            / (2.0 * PI * WGS84_EQUATORIAL_RADIUS_M * ground.lat.to_radians().cos().abs());
        let altitude_m = altitude_px / vertical_scale;

        Self {
            position: GeoPosition::with_altitude(ground.lng, ground.lat, altitude_m),
            pitch_deg: pitch.to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::transform::MapOptions;

    #[test]
    fn test_pose_over_center_when_looking_straight_down() {
        let options = MapOptions {
            pitch_deg: 0.0,
            min_pitch_deg: 0.0,
            ..MapOptions::default()
        };
        let center = GeoPosition::new(9.1422, 49.9769);
        let mut transform = MapTransform::new(center, &options, 1280.0, 800.0);
        transform.set_pitch_deg(0.0);

        let pose = CameraPose::extract(&transform);
        assert!((pose.position.lng - center.lng).abs() < 1e-9);
        assert!((pose.position.lat - center.lat).abs() < 1e-9);
        assert!(pose.pitch_deg.abs() < 1e-9);
        assert!(pose.position.altitude.unwrap() > 0.0);
    }

    #[test]
    fn test_altitude_shrinks_as_pitch_grows() {
        let center = GeoPosition::new(9.1422, 49.9769);
        let mut transform =
            MapTransform::new(center, &MapOptions::default(), 1280.0, 800.0);

        transform.set_pitch_deg(10.0);
        let shallow = CameraPose::extract(&transform);
        transform.set_pitch_deg(50.0);
        let steep = CameraPose::extract(&transform);

        // cos(pitch) scaling: the camera slides down toward the horizon.
        assert!(steep.position.altitude.unwrap() < shallow.position.altitude.unwrap());
    }
}
