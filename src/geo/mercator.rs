//! Web-Mercator projection.
//!
//! Coordinates are normalized so the whole world spans [0, 1] on both axes,
//! with (0, 0) at the north-west corner. The z axis carries altitude in the
//! same normalized units.

use super::GeoPosition;
use std::f64::consts::PI;

/// Mean earth radius in meters (spherical Mercator convention).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Earth circumference at the equator in meters.
pub const EARTH_CIRCUMFERENCE_M: f64 = 2.0 * PI * EARTH_RADIUS_M;

/// A position projected into normalized Web-Mercator space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorCoord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MercatorCoord {
    /// Project a geographic position.
    pub fn from_geo(pos: &GeoPosition) -> Self {
        let lat_rad = pos.lat.to_radians();
        let x = (180.0 + pos.lng) / 360.0;
        let y = (180.0 - (180.0 / PI) * ((PI / 4.0 + lat_rad / 2.0).tan()).ln()) / 360.0;
        let z = pos
            .altitude
            .map(|alt| alt / circumference_at_latitude(pos.lat))
            .unwrap_or(0.0);
        Self { x, y, z }
    }

    /// Exact inverse projection back to geographic coordinates.
    pub fn to_geo(&self) -> GeoPosition {
        let lng = self.x * 360.0 - 180.0;
        let lat_rad = 2.0 * ((PI * (1.0 - 2.0 * self.y)).exp().atan()) - PI / 2.0;
        let lat = lat_rad.to_degrees();
        let altitude = if self.z != 0.0 {
            Some(self.z * circumference_at_latitude(lat))
        } else {
            None
        };
        GeoPosition { lng, lat, altitude }
    }

    /// How many Mercator units one meter spans at this coordinate's latitude.
    ///
    /// Supplied to the scene bridge as the meters-per-unit scale factor; it
    /// varies with latitude because Mercator stretches toward the poles.
    pub fn meter_in_mercator_units(&self) -> f64 {
        mercator_scale(self.latitude()) / EARTH_CIRCUMFERENCE_M
    }

    /// Latitude in degrees recovered from the y coordinate.
    pub fn latitude(&self) -> f64 {
        let lat_rad = 2.0 * ((PI * (1.0 - 2.0 * self.y)).exp().atan()) - PI / 2.0;
        lat_rad.to_degrees()
    }
}

/// Mercator horizontal stretch factor at a latitude.
pub fn mercator_scale(lat_deg: f64) -> f64 {
    1.0 / lat_deg.to_radians().cos()
}

/// Earth circumference along the parallel at a latitude, in meters.
pub fn circumference_at_latitude(lat_deg: f64) -> f64 {
    EARTH_CIRCUMFERENCE_M * lat_deg.to_radians().cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_round_trip() {
        let pos = GeoPosition::with_altitude(9.142202119898826, 49.97692244755174, 120.0);
        let merc = MercatorCoord::from_geo(&pos);
        let back = merc.to_geo();

        assert!((back.lng - pos.lng).abs() < 1e-9);
        assert!((back.lat - pos.lat).abs() < 1e-9);
        assert!((back.altitude.unwrap() - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_equator_midpoint() {
        let merc = MercatorCoord::from_geo(&GeoPosition::new(0.0, 0.0));
        assert!((merc.x - 0.5).abs() < 1e-12);
        assert!((merc.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_meter_scale_grows_with_latitude() {
        let equator = MercatorCoord::from_geo(&GeoPosition::new(0.0, 0.0));
        let north = MercatorCoord::from_geo(&GeoPosition::new(0.0, 60.0));
        assert!(north.meter_in_mercator_units() > equator.meter_in_mercator_units());

        // At 60° north a meter spans twice the Mercator units it does at the
        // equator (1/cos 60° = 2).
        let ratio = north.meter_in_mercator_units() / equator.meter_in_mercator_units();
        assert!((ratio - 2.0).abs() < 1e-6);
    }
}
