//! GPU overlay renderer using wgpu.
//!
//! Renders the scene (markers, avatar, pulse ring, shadow plane) into an
//! offscreen texture using the composed scene projection matrix, so the
//! overlay lands pixel-exact on the base map. Integrates with eframe's wgpu
//! backend to share the GPU context.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{DMat4, Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::avatar::Avatar;
use super::markers::MarkerSet;
use super::scene::{PulseRing, ShadowPlane};
use super::{FrameState, World, WorldError};
use crate::assets::MeshData;

/// Vertex format for overlay rendering.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Frame-global uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub sun_direction: [f32; 4],
    pub sun_color: [f32; 4],
    pub ambient_color: [f32; 4],
}

impl Uniforms {
    fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            sun_direction: [0.0, -1.0, 0.0, 0.0],
            sun_color: [1.0, 1.0, 1.0, 1.0],
            ambient_color: [0.8, 0.8, 0.8, 1.0],
        }
    }

    fn update(&mut self, scene_projection: &DMat4, world: &World) {
        self.view_proj = scene_projection.as_mat4().to_cols_array_2d();

        let dir = world.sun.direction().as_vec3();
        self.sun_direction = [dir.x, dir.y, dir.z, 0.0];

        let sun_strength = if world.sun.visible {
            world.sun.intensity
        } else {
            0.0
        };
        self.sun_color = [
            world.sun.color[0] * sun_strength,
            world.sun.color[1] * sun_strength,
            world.sun.color[2] * sun_strength,
            1.0,
        ];

        let ambient = world.ambient.color * world.ambient.intensity;
        self.ambient_color = [ambient.x, ambient.y, ambient.z, 1.0];
    }
}

/// Per-object model matrix.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct ModelUniforms {
    model: [[f32; 4]; 4],
}

/// Uploaded mesh.
struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

/// GPU renderer for the map overlay.
pub struct OverlayRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    render_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    identity_model_bind_group: wgpu::BindGroup,
    avatar_model_buffer: wgpu::Buffer,
    avatar_model_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    output_texture: wgpu::Texture,
    output_view: wgpu::TextureView,
    width: u32,
    height: u32,
    uniforms: Uniforms,
    avatar_mesh: Option<Mesh>,
}

impl std::fmt::Debug for OverlayRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayRenderer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("has_avatar_mesh", &self.avatar_mesh.is_some())
            .finish()
    }
}

impl OverlayRenderer {
    /// Create the renderer from eframe's shared device and queue.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        width: u32,
        height: u32,
    ) -> Result<Self, WorldError> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/overlay.wgsl").into()),
        });

        let uniforms = Uniforms::new();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let identity = ModelUniforms {
            model: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let identity_model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Identity Model Buffer"),
            contents: bytemuck::cast_slice(&[identity]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let identity_model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Identity Model Bind Group"),
            layout: &model_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: identity_model_buffer.as_entire_binding(),
            }],
        });

        let avatar_model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Avatar Model Buffer"),
            contents: bytemuck::cast_slice(&[identity]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let avatar_model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Avatar Model Bind Group"),
            layout: &model_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: avatar_model_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &model_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Overlay Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba8UnormSrgb,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Marker billboards and the ring are visible from both sides
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let depth_view = Self::create_depth_texture(&device, width, height);
        let (output_texture, output_view) = Self::create_output_texture(&device, width, height);

        Ok(Self {
            device,
            queue,
            render_pipeline,
            uniform_buffer,
            uniform_bind_group,
            identity_model_bind_group,
            avatar_model_buffer,
            avatar_model_bind_group,
            depth_view,
            output_texture,
            output_view,
            width,
            height,
            uniforms,
            avatar_mesh: None,
        })
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Overlay Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_output_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Overlay Output Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Resize the render target.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.depth_view = Self::create_depth_texture(&self.device, width, height);
        let (texture, view) = Self::create_output_texture(&self.device, width, height);
        self.output_texture = texture;
        self.output_view = view;
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn output_texture(&self) -> &wgpu::Texture {
        &self.output_texture
    }

    /// Upload the avatar's mesh after a model load completes.
    pub fn set_avatar_mesh(&mut self, meshes: &[MeshData]) {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for mesh in meshes {
            let base = vertices.len() as u32;
            for (i, position) in mesh.positions.iter().enumerate() {
                let normal = mesh.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]);
                vertices.push(Vertex {
                    position: *position,
                    normal,
                    color: [0.85, 0.85, 0.9, 1.0],
                });
            }
            indices.extend(mesh.indices.iter().map(|i| i + base));
        }

        if vertices.is_empty() {
            self.avatar_mesh = None;
            return;
        }

        self.avatar_mesh = Some(self.upload_mesh(&vertices, &indices, "Avatar"));
    }

    fn upload_mesh(&self, vertices: &[Vertex], indices: &[u32], label: &str) -> Mesh {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Mesh {
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }

    /// Pin-shaped billboard quads for all markers, colored by closeness and
    /// turned toward the camera. Rebuilt per frame; ten quads is nothing.
    fn build_marker_mesh(&self, markers: &MarkerSet) -> Option<Mesh> {
        const PIN_HEIGHT: f32 = 50.0;
        const PIN_HALF_WIDTH: f32 = 18.0;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for frame in markers.frames() {
            let yaw = frame.facing_yaw as f32;
            let (sin, cos) = (yaw.sin(), yaw.cos());
            let right = Vec3::new(cos, 0.0, -sin) * PIN_HALF_WIDTH;
            let up = Vec3::new(0.0, PIN_HEIGHT, 0.0);
            let base = Vec3::new(
                frame.scene_position.x as f32,
                frame.scene_position.y as f32,
                frame.scene_position.z as f32,
            );
            let normal = [sin, 0.0, cos];
            let color = [frame.color[0], frame.color[1], frame.color[2], 1.0];

            let start = vertices.len() as u32;
            for corner in [
                base - right,
                base + right,
                base + right + up,
                base - right + up,
            ] {
                vertices.push(Vertex {
                    position: corner.to_array(),
                    normal,
                    color,
                });
            }
            indices.extend([start, start + 1, start + 2, start, start + 2, start + 3]);
        }

        if vertices.is_empty() {
            return None;
        }
        Some(self.upload_mesh(&vertices, &indices, "Markers"))
    }

    /// Translucent disc pulsing around the avatar.
    fn build_ring_mesh(&self, ring: &PulseRing) -> Mesh {
        const SEGMENTS: usize = 64;

        let radius = (ring.radius * ring.scale()) as f32;
        let alpha = ring.opacity() as f32;
        let color = [0.745, 0.729, 0.714, alpha];
        let normal = [0.0, 1.0, 0.0];

        let mut vertices = vec![Vertex {
            position: [0.0, 0.01, 0.0],
            normal,
            color,
        }];
        let mut indices = Vec::new();

        for i in 0..=SEGMENTS {
            let angle = i as f32 / SEGMENTS as f32 * std::f32::consts::TAU;
            vertices.push(Vertex {
                position: [radius * angle.cos(), 0.01, radius * angle.sin()],
                normal,
                color,
            });
            if i > 0 {
                indices.extend([0, i as u32, i as u32 + 1]);
            }
        }

        self.upload_mesh(&vertices, &indices, "Pulse Ring")
    }

    /// Shadow-catcher quad under the avatar.
    fn build_shadow_mesh(&self, plane: &ShadowPlane) -> Mesh {
        let half = (plane.size / 2.0) as f32;
        let color = [0.0, 0.0, 0.0, plane.opacity * 0.25];
        let normal = [0.0, 1.0, 0.0];

        let vertices = [
            Vertex {
                position: [-half, 0.0, -half],
                normal,
                color,
            },
            Vertex {
                position: [half, 0.0, -half],
                normal,
                color,
            },
            Vertex {
                position: [half, 0.0, half],
                normal,
                color,
            },
            Vertex {
                position: [-half, 0.0, half],
                normal,
                color,
            },
        ];
        self.upload_mesh(&vertices, &[0, 1, 2, 0, 2, 3], "Shadow Plane")
    }

    fn avatar_model_matrix(avatar: &Avatar) -> Mat4 {
        Mat4::from_rotation_y(avatar.heading_yaw as f32)
            * Mat4::from_scale(Vec3::splat(avatar.model.scale * 5.0))
    }

    /// Render the overlay for one frame.
    pub fn render(&mut self, world: &World, frame: &FrameState) {
        self.uniforms.update(&frame.scene_projection, world);
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.uniforms]),
        );

        let avatar_model = ModelUniforms {
            model: Self::avatar_model_matrix(&world.avatar).to_cols_array_2d(),
        };
        self.queue.write_buffer(
            &self.avatar_model_buffer,
            0,
            bytemuck::cast_slice(&[avatar_model]),
        );

        let marker_mesh = self.build_marker_mesh(&world.markers);
        let ring_mesh = self.build_ring_mesh(&world.ring);
        let shadow_mesh = self.build_shadow_mesh(&world.shadow_plane);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Overlay Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.output_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        // Transparent clear: the base map shows through
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.render_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, &self.identity_model_bind_group, &[]);

            for mesh in [Some(&shadow_mesh), Some(&ring_mesh), marker_mesh.as_ref()]
                .into_iter()
                .flatten()
            {
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
            }

            if let Some(ref mesh) = self.avatar_mesh {
                pass.set_bind_group(1, &self.avatar_model_bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
