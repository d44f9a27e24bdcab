//! Map transform and camera pose extraction.

use glam::DVec2;
use timewalk::geo::GeoPosition;
use timewalk::map::{CameraPose, MapOptions, MapTransform};

fn transform_at(pitch_deg: f64) -> MapTransform {
    let options = MapOptions {
        pitch_deg,
        min_pitch_deg: 0.0,
        ..MapOptions::default()
    };
    MapTransform::new(
        GeoPosition::new(9.142202119898826, 49.97692244755174),
        &options,
        1280.0,
        800.0,
    )
}

#[test]
fn test_projection_and_unprojection_agree() {
    let transform = transform_at(45.0);

    for (dlng, dlat) in [(0.0, 0.0), (0.0008, 0.0), (0.0, -0.0006), (-0.0005, 0.0004)] {
        let pos = GeoPosition::new(9.142202119898826 + dlng, 49.97692244755174 + dlat);
        let screen = transform.screen_from_geo(&pos).unwrap();
        let back = transform.point_location(screen);

        assert!((back.lng - pos.lng).abs() < 1e-9);
        assert!((back.lat - pos.lat).abs() < 1e-9);
    }
}

#[test]
fn test_bearing_rotates_the_view() {
    let mut transform = transform_at(45.0);
    transform.set_bearing_deg(0.0);

    // North up: a point to the north appears above the center.
    let north = GeoPosition::new(9.142202119898826, 49.9775);
    let screen_up = transform.screen_from_geo(&north).unwrap();
    assert!(screen_up.y < 400.0);

    // Map turned 180°: the same point appears below.
    transform.set_bearing_deg(180.0);
    let screen_down = transform.screen_from_geo(&north).unwrap();
    assert!(screen_down.y > 400.0);
}

#[test]
fn test_camera_pose_sits_over_center_at_zero_pitch() {
    let transform = transform_at(0.0);
    let pose = CameraPose::extract(&transform);

    assert!((pose.position.lng - transform.center().lng).abs() < 1e-9);
    assert!((pose.position.lat - transform.center().lat).abs() < 1e-9);
    assert!(pose.pitch_deg.abs() < 1e-9);
}

#[test]
fn test_camera_pose_altitude_uses_cosine_of_pitch() {
    let flat = CameraPose::extract(&transform_at(0.0));
    let pitched = CameraPose::extract(&transform_at(45.0));

    let ratio = pitched.position.altitude.unwrap() / flat.position.altitude.unwrap();

    // Altitude scales with cos(pitch); the ground point drifting toward the
    // horizon nudges the vertical scale, hence the loose tolerance.
    assert!((ratio - 45f64.to_radians().cos()).abs() < 0.05);
}

#[test]
fn test_camera_pose_ground_point_moves_with_pitch() {
    let transform = transform_at(45.0);
    let pose = CameraPose::extract(&transform);

    // Pitched camera sits away from the center, not on it.
    let offset = DVec2::new(
        pose.position.lng - transform.center().lng,
        pose.position.lat - transform.center().lat,
    );
    assert!(offset.length() > 1e-6);
}

#[test]
fn test_zoom_changes_ground_resolution() {
    let mut transform = transform_at(45.0);

    let east = GeoPosition::new(9.1430, 49.97692244755174);

    transform.set_zoom(16.0);
    let coarse = transform.screen_from_geo(&east).unwrap();
    transform.set_zoom(19.0);
    let fine = transform.screen_from_geo(&east).unwrap();

    // Zooming in pushes the same point further from the screen center.
    let center = DVec2::new(640.0, 400.0);
    assert!((fine - center).length() > (coarse - center).length());
}
