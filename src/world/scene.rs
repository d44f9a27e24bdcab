//! Scene chrome around the avatar: lighting, shadow plane, pulse ring.

use glam::Vec3;

use super::ramp;

/// Ambient fill light.
#[derive(Debug, Clone)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 0.8,
        }
    }
}

/// Shadow-receiving plane under the avatar.
#[derive(Debug, Clone)]
pub struct ShadowPlane {
    /// Edge length in meters
    pub size: f64,
    /// Shadow darkness
    pub opacity: f32,
}

impl Default for ShadowPlane {
    fn default() -> Self {
        Self {
            size: 300.0,
            opacity: 0.3,
        }
    }
}

/// Phase boundaries of the pulse cycle: grow until the first, hold through
/// the second, fade until the third.
const PULSE_PHASES: [f64; 3] = [0.75, 0.9, 1.25];

/// Animated circle pulsing around the avatar's feet.
#[derive(Debug, Clone)]
pub struct PulseRing {
    /// Base radius in meters
    pub radius: f64,
    t: f64,
}

impl PulseRing {
    pub fn new(radius: f64) -> Self {
        Self { radius, t: 0.0 }
    }

    /// Advance the cycle.
    pub fn update(&mut self, dt: f64) {
        self.t = (self.t + dt * PULSE_PHASES[2] / 5.0) % PULSE_PHASES[2];
    }

    /// Current scale factor in [0, 1].
    pub fn scale(&self) -> f64 {
        ramp(PULSE_PHASES[0], PULSE_PHASES[1], self.t).powi(2)
    }

    /// Current opacity in [0, 0.8].
    pub fn opacity(&self) -> f64 {
        (1.0 - ramp(PULSE_PHASES[1], PULSE_PHASES[2], self.t)).powi(2) * 0.8
    }
}

impl Default for PulseRing {
    fn default() -> Self {
        Self::new(25.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_cycle_stays_bounded() {
        let mut ring = PulseRing::default();
        for _ in 0..500 {
            ring.update(0.033);
            assert!((0.0..=1.0).contains(&ring.scale()));
            assert!((0.0..=0.8).contains(&ring.opacity()));
        }
    }

    #[test]
    fn test_pulse_fades_after_growing() {
        let mut ring = PulseRing::default();

        // Walk to the hold phase: fully grown, fully opaque.
        while ring.t < PULSE_PHASES[1] {
            ring.update(0.01);
        }
        assert!(ring.scale() > 0.9);

        // Into the fade phase the opacity drops off.
        let before = ring.opacity();
        ring.update(0.5);
        if ring.t > PULSE_PHASES[1] {
            assert!(ring.opacity() < before);
        }
    }
}
