//! Geographic primitives.

pub mod mercator;

pub use mercator::MercatorCoord;

use serde::{Deserialize, Serialize};

/// A WGS84 position in degrees, with optional altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Longitude in degrees
    pub lng: f64,
    /// Latitude in degrees
    pub lat: f64,
    /// Altitude in meters above the ellipsoid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl GeoPosition {
    /// Create a position at ground level.
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            lng,
            lat,
            altitude: None,
        }
    }

    /// Create a position with an altitude in meters.
    pub fn with_altitude(lng: f64, lat: f64, altitude: f64) -> Self {
        Self {
            lng,
            lat,
            altitude: Some(altitude),
        }
    }

    /// Linear interpolation toward another position.
    ///
    /// Used by avatar navigation; fine for the sub-kilometer distances the
    /// game deals in.
    pub fn lerp(&self, other: &GeoPosition, t: f64) -> GeoPosition {
        GeoPosition {
            lng: self.lng * (1.0 - t) + other.lng * t,
            lat: self.lat * (1.0 - t) + other.lat * t,
            altitude: self.altitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        let a = GeoPosition::new(9.0, 49.0);
        let b = GeoPosition::new(10.0, 50.0);

        let start = a.lerp(&b, 0.0);
        assert!((start.lng - 9.0).abs() < 1e-12);
        assert!((start.lat - 49.0).abs() < 1e-12);

        let end = a.lerp(&b, 1.0);
        assert!((end.lng - 10.0).abs() < 1e-12);
        assert!((end.lat - 50.0).abs() < 1e-12);
    }
}
