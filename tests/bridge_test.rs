//! Round-trip and precision tests for the coordinate bridge.

use glam::DVec3;
use timewalk::geo::{GeoPosition, MercatorCoord};
use timewalk::world::bridge::CoordinateBridge;

#[test]
fn test_scene_round_trip_across_valid_range() {
    // Projecting to scene space and back recovers the coordinate within
    // floating-point tolerance, all over the Mercator-valid globe.
    let lngs = [-179.9, -120.0, -45.0, 0.0, 9.1422, 91.5, 179.9];
    let lats = [-84.9, -60.0, -23.5, 0.0, 49.9769, 66.5, 84.9];

    for &lng in &lngs {
        for &lat in &lats {
            let center = GeoPosition::new(lng, lat);
            let bridge = CoordinateBridge::new(&center);

            // A point a few hundred meters off center.
            let pos = GeoPosition::new(lng + 0.003, lat - 0.002);
            let scene = bridge.scene_from_geo(&pos);
            let back = bridge.geo_from_scene(scene);

            assert!(
                (back.lng - pos.lng).abs() < 1e-9,
                "lng drift at ({lng}, {lat})"
            );
            assert!(
                (back.lat - pos.lat).abs() < 1e-9,
                "lat drift at ({lng}, {lat})"
            );
        }
    }
}

#[test]
fn test_altitude_round_trip() {
    let center = GeoPosition::new(9.1422, 49.9769);
    let bridge = CoordinateBridge::new(&center);

    let pos = GeoPosition::with_altitude(9.1435, 49.9772, 57.5);
    let scene = bridge.scene_from_geo(&pos);
    let back = bridge.geo_from_scene(scene);

    assert!((back.altitude.unwrap() - 57.5).abs() < 1e-6);
}

#[test]
fn test_mercator_inverse_is_exact() {
    for lat in [-80.0, -30.0, 0.0, 30.0, 49.9769, 80.0] {
        for lng in [-170.0, -90.0, 0.0, 9.1422, 170.0] {
            let pos = GeoPosition::new(lng, lat);
            let back = MercatorCoord::from_geo(&pos).to_geo();
            assert!((back.lng - lng).abs() < 1e-9);
            assert!((back.lat - lat).abs() < 1e-9);
        }
    }
}

#[test]
fn test_recentering_keeps_scene_coordinates_small() {
    // The precision trick: whatever the absolute world position, scene
    // coordinates near the center stay at walking-distance magnitudes.
    let far_east = GeoPosition::new(179.5, 63.2);
    let bridge = CoordinateBridge::new(&far_east);

    let neighbor = GeoPosition::new(179.5008, 63.2004);
    let scene = bridge.scene_from_geo(&neighbor);

    assert!(scene.length() < 150.0, "scene magnitude {}", scene.length());
    assert!(scene.length() > 10.0);
}

#[test]
fn test_scene_projection_round_trips_through_matrix() {
    use timewalk::map::{MapOptions, MapTransform};

    let center = GeoPosition::new(9.1422, 49.9769);
    let transform = MapTransform::new(center, &MapOptions::default(), 1280.0, 800.0);
    let bridge = CoordinateBridge::new(&center);

    // Composing the mercator matrix with the bridge transform must land a
    // ground point at the same clip position as projecting it as a map
    // point; the two paths describe one camera.
    let pos = GeoPosition::new(9.1430, 49.9772);

    let scene_proj = bridge.scene_projection(&transform.mercator_matrix());
    let scene = bridge.scene_from_geo(&pos);
    let via_scene = scene_proj * scene.extend(1.0);
    let via_scene = DVec3::new(
        via_scene.x / via_scene.w,
        via_scene.y / via_scene.w,
        via_scene.z / via_scene.w,
    );

    let merc = MercatorCoord::from_geo(&pos);
    let via_map = transform.mercator_matrix() * glam::DVec4::new(merc.x, merc.y, merc.z, 1.0);
    let via_map = DVec3::new(
        via_map.x / via_map.w,
        via_map.y / via_map.w,
        via_map.z / via_map.w,
    );

    assert!((via_scene - via_map).length() < 1e-9);
}
