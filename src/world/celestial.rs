//! Sun tracking for scene lighting.
//!
//! Computes solar azimuth/altitude for the observer's location and drives a
//! plain directional-light value from it. The light is a value plus an
//! update function, not a subtype of anything the renderer owns.

use chrono::{DateTime, Utc};
use glam::DVec3;
use std::f64::consts::PI;

use crate::geo::GeoPosition;

/// Solar position as seen from an observer.
#[derive(Debug, Clone, Copy)]
pub struct SolarPosition {
    /// Azimuth in radians, measured from south, positive westward
    pub azimuth: f64,
    /// Altitude above the horizon in radians
    pub altitude: f64,
}

const DAY_MS: f64 = 1000.0 * 60.0 * 60.0 * 24.0;
const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;

/// Obliquity of the ecliptic.
const OBLIQUITY: f64 = 23.4397 * PI / 180.0;

fn to_days(date: DateTime<Utc>) -> f64 {
    date.timestamp_millis() as f64 / DAY_MS - 0.5 + J1970 - J2000
}

fn solar_mean_anomaly(days: f64) -> f64 {
    (357.5291 + 0.98560028 * days).to_radians()
}

fn ecliptic_longitude(mean_anomaly: f64) -> f64 {
    let center = (1.9148 * mean_anomaly.sin()
        + 0.02 * (2.0 * mean_anomaly).sin()
        + 0.0003 * (3.0 * mean_anomaly).sin())
    .to_radians();
    let perihelion = 102.9372f64.to_radians();
    mean_anomaly + center + perihelion + PI
}

fn declination(ecliptic_lng: f64) -> f64 {
    (ecliptic_lng.sin() * OBLIQUITY.sin()).asin()
}

fn right_ascension(ecliptic_lng: f64) -> f64 {
    (ecliptic_lng.sin() * OBLIQUITY.cos()).atan2(ecliptic_lng.cos())
}

fn sidereal_time(days: f64, lw: f64) -> f64 {
    (280.16 + 360.9856235 * days).to_radians() - lw
}

/// Solar position for a date and observer location.
pub fn solar_position(date: DateTime<Utc>, observer: &GeoPosition) -> SolarPosition {
    let lw = (-observer.lng).to_radians();
    let phi = observer.lat.to_radians();
    let days = to_days(date);

    let mean_anomaly = solar_mean_anomaly(days);
    let ecliptic_lng = ecliptic_longitude(mean_anomaly);
    let dec = declination(ecliptic_lng);
    let ra = right_ascension(ecliptic_lng);
    let hour_angle = sidereal_time(days, lw) - ra;

    let altitude =
        (phi.sin() * dec.sin() + phi.cos() * dec.cos() * hour_angle.cos()).asin();
    let azimuth = hour_angle
        .sin()
        .atan2(hour_angle.cos() * phi.sin() - dec.tan() * phi.cos());

    SolarPosition { azimuth, altitude }
}

/// Fraction of the half-circle near the horizon where the sun light is
/// faded out rather than cast.
const HORIZON_MARGIN: f64 = 0.05;

/// A directional sun light tracking the real sky.
#[derive(Debug, Clone)]
pub struct CelestialLight {
    /// Light color
    pub color: [f32; 3],
    /// Light intensity
    pub intensity: f32,
    /// Distance of the light from the scene origin, in meters
    pub radius: f64,
    /// Current direction-scaled position in scene space
    pub position: DVec3,
    /// Whether the light currently casts (sun above the margin)
    pub visible: bool,
}

impl CelestialLight {
    pub fn sun(radius: f64) -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 0.4,
            radius,
            position: DVec3::new(0.0, radius, 0.0),
            visible: true,
        }
    }

    /// Reposition the light for a date and observer location.
    ///
    /// Runs on a low-frequency timer, not per frame; the sun does not move
    /// fast enough to warrant more.
    pub fn update_position(&mut self, date: DateTime<Utc>, observer: &GeoPosition) {
        let pos = solar_position(date, observer);

        let altitude = (pos.altitude + 2.0 * PI) % (2.0 * PI);
        self.visible =
            altitude > PI * HORIZON_MARGIN && altitude < PI * (1.0 - HORIZON_MARGIN);

        let (az, alt) = (pos.azimuth, pos.altitude);
        self.position = DVec3::new(
            az.cos() * alt.cos(),
            alt.sin(),
            -az.sin() * alt.cos(),
        ) * self.radius;
    }

    /// Direction light travels, for shading.
    pub fn direction(&self) -> DVec3 {
        -self.position.normalize_or_zero()
    }
}
