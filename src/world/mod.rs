//! The 3D game world synchronized to the map camera.
//!
//! Per frame the world re-derives its coordinate bridge from the current map
//! center, recovers the synthetic camera pose, advances avatar navigation
//! and the pulse ring, and refreshes marker reachability. The renderer
//! consumes the resulting frame state plus the composed projection matrix.

pub mod avatar;
pub mod bridge;
pub mod celestial;
pub mod color;
pub mod markers;
pub mod renderer;
pub mod scene;

use std::sync::Arc;

use glam::{DMat4, DVec3};
use thiserror::Error;

use crate::assets::MeshData;
use crate::geo::GeoPosition;
use crate::map::{CameraPose, MapTransform};

use avatar::{Avatar, Navigator, PlayerModel};
use bridge::CoordinateBridge;
use celestial::CelestialLight;
use markers::{HighlightPalette, Marker, MarkerSet, ReachabilityConfig};
use renderer::OverlayRenderer;
use scene::{AmbientLight, PulseRing, ShadowPlane};

/// Errors that can occur in the world module.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("GPU initialization failed: {0}")]
    GpuInit(String),

    #[error("render error: {0}")]
    Render(String),
}

/// Clamped linear ramp: 0 at `min`, 1 at `max`.
pub(crate) fn ramp(min: f64, max: f64, x: f64) -> f64 {
    ((x - min) / (max - min)).clamp(0.0, 1.0)
}

/// Everything the world computed for one frame.
#[derive(Debug, Clone)]
pub struct FrameState {
    /// This frame's coordinate bridge (centered on the current map center)
    pub bridge: CoordinateBridge,
    /// Synthetic camera pose recovered from the map transform
    pub camera: CameraPose,
    /// Camera look point projected onto the ground plane
    pub camera_ground: DVec3,
    /// Scene-space projection matrix for the overlay renderer
    pub scene_projection: DMat4,
}

/// The game world.
pub struct World {
    pub markers: MarkerSet,
    pub avatar: Avatar,
    pub navigator: Navigator,
    pub sun: CelestialLight,
    pub ambient: AmbientLight,
    pub ring: PulseRing,
    pub shadow_plane: ShadowPlane,
    /// GPU overlay renderer; absent until a device is attached
    renderer: Option<OverlayRenderer>,
    /// Avatar mesh kept for a renderer attached later
    avatar_meshes: Vec<MeshData>,
}

impl World {
    pub fn new(markers: Vec<Marker>, model: PlayerModel, start: GeoPosition) -> Self {
        Self {
            markers: MarkerSet::new(
                markers,
                ReachabilityConfig::default(),
                HighlightPalette::default(),
            ),
            avatar: Avatar::new(model),
            navigator: Navigator::new(start),
            sun: CelestialLight::sun(25.0),
            ambient: AmbientLight::default(),
            ring: PulseRing::default(),
            shadow_plane: ShadowPlane::default(),
            renderer: None,
            avatar_meshes: Vec::new(),
        }
    }

    /// Attach the GPU renderer.
    ///
    /// Must be called with the wgpu device and queue from the embedding
    /// layer before the overlay can draw; without it the world still
    /// updates and the map view paints its 2D stand-ins.
    pub fn init_renderer(
        &mut self,
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        width: u32,
        height: u32,
    ) -> Result<(), WorldError> {
        let mut renderer = OverlayRenderer::new(device, queue, width, height)?;
        if !self.avatar_meshes.is_empty() {
            renderer.set_avatar_mesh(&self.avatar_meshes);
        }
        self.renderer = Some(renderer);
        Ok(())
    }

    pub fn is_renderer_initialized(&self) -> bool {
        self.renderer.is_some()
    }

    /// Swap in a newly loaded avatar mesh.
    pub fn set_avatar_mesh(&mut self, meshes: Vec<MeshData>) {
        if let Some(renderer) = &mut self.renderer {
            renderer.set_avatar_mesh(&meshes);
        }
        self.avatar_meshes = meshes;
    }

    /// Render the overlay for the frame, if a renderer is attached.
    pub fn render(&mut self, frame: &FrameState, width: u32, height: u32) {
        let Some(mut renderer) = self.renderer.take() else {
            return;
        };
        renderer.resize(width, height);
        renderer.render(self, frame);
        self.renderer = Some(renderer);
    }

    /// Issue a navigation command (GPS fix or tap).
    pub fn set_target(
        &mut self,
        transform: &MapTransform,
        target: GeoPosition,
        since_last_command: f64,
    ) {
        let bridge = CoordinateBridge::new(&transform.center());
        self.navigator
            .command(&mut self.avatar, &bridge, target, since_last_command);
    }

    /// Advance one frame and derive the state the renderer needs.
    ///
    /// Navigation moves the map center, so the bridge is rebuilt afterwards;
    /// recentering every frame is what keeps the scene numerically stable.
    pub fn update(&mut self, transform: &mut MapTransform, dt: f64) -> FrameState {
        let mut center = transform.center();
        self.navigator.update(&mut self.avatar, &mut center, dt);
        transform.set_center(center);

        self.ring.update(dt);

        let bridge = CoordinateBridge::new(&transform.center());
        let camera = CameraPose::extract(transform);

        let mut camera_ground = bridge.scene_from_geo(&camera.position);
        camera_ground.y = 0.0;

        self.markers.update_frame(&bridge, camera_ground);

        let scene_projection = bridge.scene_projection(&transform.mercator_matrix());

        FrameState {
            bridge,
            camera,
            camera_ground,
            scene_projection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapOptions;

    #[test]
    fn test_world_frame_recenters_bridge() {
        let start = GeoPosition::new(9.1422, 49.9769);
        let mut world = World::new(
            markers::builtin_markers(),
            avatar::builtin_models().remove(0),
            start,
        );
        let mut transform = MapTransform::new(start, &MapOptions::default(), 1280.0, 800.0);

        // Command a walk east, run a few frames: the map center moves and
        // the bridge keeps the avatar (= center) at the scene origin.
        world.set_target(&transform, GeoPosition::new(9.1432, 49.9769), 10.0);
        for _ in 0..16 {
            let frame = world.update(&mut transform, 0.1);
            let avatar_scene = frame.bridge.scene_from_geo(&transform.center());
            assert!(avatar_scene.length() < 1e-9);
        }

        assert!((transform.center().lng - 9.1432).abs() < 1e-9);
    }

    #[test]
    fn test_projection_places_center_at_clip_origin() {
        let start = GeoPosition::new(9.1422, 49.9769);
        let mut world = World::new(
            markers::builtin_markers(),
            avatar::builtin_models().remove(0),
            start,
        );
        let mut transform = MapTransform::new(start, &MapOptions::default(), 1280.0, 800.0);

        let frame = world.update(&mut transform, 0.016);

        // The scene origin is the map center, which projects to the middle
        // of the screen.
        let clip = frame.scene_projection * glam::DVec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
    }
}
