//! Pointer picking against marker scene nodes.
//!
//! A tap is turned into a ray by pushing the pointer's clip-space position
//! through the inverse of the current scene projection matrix, then tested
//! against a bounding sphere per marker. The nearest hit wins; reachability
//! is checked by the caller.

use glam::{DMat4, DVec2, DVec3};

use crate::world::markers::MarkerSet;

/// Bounding-sphere radius around a marker pin, in meters.
pub const MARKER_PICK_RADIUS: f64 = 25.0;

/// Pointer position in normalized device coordinates.
pub fn ndc_from_screen(screen: DVec2, viewport: DVec2) -> DVec2 {
    DVec2::new(
        (screen.x / viewport.x) * 2.0 - 1.0,
        1.0 - (screen.y / viewport.y) * 2.0,
    )
}

/// Cast a pick ray and return the index of the nearest marker hit.
pub fn pick_marker(ndc: DVec2, scene_projection: &DMat4, markers: &MarkerSet) -> Option<usize> {
    let inverse = scene_projection.inverse();

    // Camera origin and a far point under the pointer, both unprojected.
    let origin = inverse.project_point3(DVec3::ZERO);
    let far = inverse.project_point3(DVec3::new(ndc.x, ndc.y, 1.0));
    let direction = (far - origin).normalize_or_zero();
    if direction == DVec3::ZERO {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (index, frame) in markers.frames().iter().enumerate() {
        // Sphere centered halfway up the pin
        let center = frame.scene_position + DVec3::new(0.0, MARKER_PICK_RADIUS, 0.0);
        if let Some(t) = ray_sphere(origin, direction, center, MARKER_PICK_RADIUS) {
            if best.map(|(_, bt)| t < bt).unwrap_or(true) {
                best = Some((index, t));
            }
        }
    }

    best.map(|(index, _)| index)
}

/// Nearest positive intersection of a ray with a sphere.
fn ray_sphere(origin: DVec3, direction: DVec3, center: DVec3, radius: f64) -> Option<f64> {
    let oc = origin - center;
    let b = oc.dot(direction);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }

    let sqrt_disc = disc.sqrt();
    let t_near = -b - sqrt_disc;
    let t_far = -b + sqrt_disc;
    if t_near > 0.0 {
        Some(t_near)
    } else if t_far > 0.0 {
        Some(t_far)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPosition;
    use crate::map::{MapOptions, MapTransform};
    use crate::world::bridge::CoordinateBridge;
    use crate::world::markers::{Marker, MarkerSet};

    fn setup() -> (MapTransform, CoordinateBridge, MarkerSet) {
        let center = GeoPosition::new(9.1422, 49.9769);
        let transform = MapTransform::new(center, &MapOptions::default(), 1280.0, 800.0);
        let bridge = CoordinateBridge::new(&center);

        // One marker ~40 m east of center.
        let marker = Marker::new("Test", "test", 9.14275, 49.9769, 1000);
        let mut set = MarkerSet::with_defaults(vec![marker]);
        set.update_frame(&bridge, DVec3::ZERO);

        (transform, bridge, set)
    }

    #[test]
    fn test_pick_hits_marker_under_pointer() {
        let (transform, bridge, set) = setup();
        let projection = bridge.scene_projection(&transform.mercator_matrix());

        // Project the marker's pin center to the screen and pick there.
        let world = set.frames()[0].scene_position + DVec3::new(0.0, MARKER_PICK_RADIUS, 0.0);
        let clip = projection * world.extend(1.0);
        let ndc = DVec2::new(clip.x / clip.w, clip.y / clip.w);

        assert_eq!(pick_marker(ndc, &projection, &set), Some(0));
    }

    #[test]
    fn test_pick_misses_away_from_marker() {
        let (transform, bridge, set) = setup();
        let projection = bridge.scene_projection(&transform.mercator_matrix());

        // Aim well off the marker's screen footprint; at ~40 m distance the
        // pick sphere spans far less than half the viewport.
        let world = set.frames()[0].scene_position + DVec3::new(0.0, MARKER_PICK_RADIUS, 0.0);
        let clip = projection * world.extend(1.0);
        let ndc = DVec2::new(clip.x / clip.w + 0.5, clip.y / clip.w + 0.5);

        assert_eq!(pick_marker(ndc, &projection, &set), None);
    }

    #[test]
    fn test_ndc_conversion() {
        let viewport = DVec2::new(1280.0, 800.0);
        let center = ndc_from_screen(DVec2::new(640.0, 400.0), viewport);
        assert!(center.length() < 1e-12);

        let corner = ndc_from_screen(DVec2::new(0.0, 0.0), viewport);
        assert!((corner.x + 1.0).abs() < 1e-12);
        assert!((corner.y - 1.0).abs() < 1e-12);
    }
}
