//! Map camera transform.
//!
//! Owns the camera state of the slippy map (center, zoom, pitch, bearing,
//! viewport) and derives the matrices everything else consumes: the
//! mercator-space view-projection for the 3D overlay, screen projection for
//! tile drawing, and ground-plane unprojection for hit testing and camera
//! pose recovery.
//!
//! All matrix work is done in f64; the renderer downcasts at the GPU
//! boundary.

use glam::{DMat4, DVec2, DVec3};
use std::f64::consts::PI;

use crate::geo::{GeoPosition, MercatorCoord};

/// Tile edge length in pixels at the nominal resolution.
pub const TILE_SIZE: f64 = 512.0;

/// Vertical field of view in radians (atan(3/4), the slippy-map classic).
pub const FIELD_OF_VIEW: f64 = 0.6435011087932844;

/// Static camera limits and initial pose.
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom: f64,
    pub min_pitch_deg: f64,
    pub pitch_deg: f64,
    pub bearing_deg: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            min_zoom: 15.0,
            max_zoom: 20.0,
            zoom: 18.0,
            min_pitch_deg: 1.0,
            pitch_deg: 45.0,
            bearing_deg: 180.0,
        }
    }
}

/// The map camera.
#[derive(Debug, Clone)]
pub struct MapTransform {
    center: GeoPosition,
    zoom: f64,
    /// Pitch in radians, 0 = straight down
    pitch: f64,
    /// Bearing in radians, 0 = north up
    bearing: f64,
    width: f64,
    height: f64,
    min_zoom: f64,
    max_zoom: f64,
    min_pitch: f64,
}

impl MapTransform {
    pub fn new(center: GeoPosition, options: &MapOptions, width: f64, height: f64) -> Self {
        let mut transform = Self {
            center,
            zoom: options.zoom,
            pitch: options.pitch_deg.to_radians(),
            bearing: options.bearing_deg.to_radians(),
            width: width.max(1.0),
            height: height.max(1.0),
            min_zoom: options.min_zoom,
            max_zoom: options.max_zoom,
            min_pitch: options.min_pitch_deg.to_radians(),
        };
        transform.set_zoom(options.zoom);
        transform
    }

    pub fn center(&self) -> GeoPosition {
        self.center
    }

    pub fn set_center(&mut self, center: GeoPosition) {
        self.center = center;
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.set_zoom(self.zoom + delta);
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn set_pitch_deg(&mut self, pitch_deg: f64) {
        self.pitch = pitch_deg.to_radians().clamp(self.min_pitch, 60f64.to_radians());
    }

    pub fn bearing(&self) -> f64 {
        self.bearing
    }

    pub fn set_bearing_deg(&mut self, bearing_deg: f64) {
        self.bearing = bearing_deg.to_radians();
    }

    pub fn rotate_by_deg(&mut self, delta_deg: f64) {
        self.bearing += delta_deg.to_radians();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
    }

    pub fn viewport(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }

    /// World scale: how many tiles span the equator at the current zoom.
    pub fn scale(&self) -> f64 {
        2f64.powf(self.zoom)
    }

    /// World size in pixels at the current zoom.
    pub fn world_size(&self) -> f64 {
        TILE_SIZE * self.scale()
    }

    /// Distance from the camera to the map center, in pixels.
    pub fn camera_to_center_distance(&self) -> f64 {
        0.5 / (FIELD_OF_VIEW / 2.0).tan() * self.height
    }

    /// Screen-space center point.
    pub fn center_point(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Pixels per meter at the center latitude.
    pub fn pixels_per_meter(&self) -> f64 {
        self.world_size() / crate::geo::mercator::circumference_at_latitude(self.center.lat)
    }

    /// View-projection matrix over pixel-world coordinates.
    ///
    /// Pixel-world space has x east, y south (Mercator convention), z up,
    /// with one unit per screen pixel at the center zoom level.
    fn pixel_world_to_clip(&self) -> DMat4 {
        let distance = self.camera_to_center_distance();
        let half_fov = FIELD_OF_VIEW / 2.0;

        // Far plane just beyond the most distant visible ground point; the
        // horizon creeps away as the camera pitches.
        let ground_angle = PI / 2.0 + self.pitch;
        let top_half_surface = half_fov.sin() * distance / (PI - ground_angle - half_fov).sin();
        let furthest = (PI / 2.0 - self.pitch).cos() * top_half_surface + distance;
        let far_z = furthest * 1.01;
        let near_z = self.height / 50.0;

        let center_world = self.center_world_point();

        DMat4::perspective_rh(FIELD_OF_VIEW, self.width / self.height, near_z, far_z)
            * DMat4::from_scale(DVec3::new(1.0, -1.0, 1.0))
            * DMat4::from_translation(DVec3::new(0.0, 0.0, -distance))
            * DMat4::from_rotation_x(self.pitch)
            * DMat4::from_rotation_z(-self.bearing)
            * DMat4::from_translation(DVec3::new(-center_world.x, -center_world.y, 0.0))
    }

    /// The map center in pixel-world coordinates.
    fn center_world_point(&self) -> DVec2 {
        let merc = MercatorCoord::from_geo(&self.center);
        DVec2::new(merc.x, merc.y) * self.world_size()
    }

    /// View-projection matrix over normalized Mercator coordinates.
    ///
    /// This is the matrix handed to the 3D overlay each frame; the bridge
    /// composes its own translation/scale/rotation against it.
    pub fn mercator_matrix(&self) -> DMat4 {
        let size = self.world_size();
        self.pixel_world_to_clip() * DMat4::from_scale(DVec3::splat(size))
    }

    /// Clip space → screen pixels.
    fn viewport_matrix(&self) -> DMat4 {
        DMat4::from_translation(DVec3::new(self.width / 2.0, self.height / 2.0, 0.0))
            * DMat4::from_scale(DVec3::new(self.width / 2.0, -self.height / 2.0, 1.0))
    }

    /// Project a geographic position to screen pixels.
    ///
    /// Returns `None` for points behind the camera plane.
    pub fn screen_from_geo(&self, pos: &GeoPosition) -> Option<DVec2> {
        let merc = MercatorCoord::from_geo(pos);
        let world = DVec3::new(merc.x, merc.y, 0.0) * self.world_size();
        let clip = self.pixel_world_to_clip() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip / clip.w;
        let screen = self.viewport_matrix() * ndc;
        Some(DVec2::new(screen.x, screen.y))
    }

    /// Unproject a screen point onto the ground plane.
    ///
    /// Casts through the inverted pixel matrix at two depths and intersects
    /// z = 0, the standard slippy-map ground query.
    pub fn point_location(&self, point: DVec2) -> GeoPosition {
        let inverse = (self.viewport_matrix() * self.pixel_world_to_clip()).inverse();

        let near = inverse.project_point3(DVec3::new(point.x, point.y, 0.0));
        let far = inverse.project_point3(DVec3::new(point.x, point.y, 1.0));

        let t = if (near.z - far.z).abs() > f64::EPSILON {
            near.z / (near.z - far.z)
        } else {
            0.0
        };
        let ground = near.lerp(far, t);

        let size = self.world_size();
        MercatorCoord {
            x: ground.x / size,
            y: ground.y / size,
            z: 0.0,
        }
        .to_geo()
    }
}
