//! # Terrain Rendering
//!
//! Owns the window surface, the single terrain render pipeline and the
//! frame-level GPU state: depth buffer, scene uniform (view-projection,
//! camera position, sun direction) and the bind group layout every chunk's
//! model transform is bound through.
//!
//! Draw submission itself lives on `World::render`; this module sets up the
//! pass, binds the frame state and hands the pass over.

pub mod frustum;
pub mod texture;
pub mod vertex;

use cgmath::{InnerSpace, Matrix4, Point3, Vector3};
use log::warn;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::engine_state::terrain::world::World;

use frustum::Frustum;
use texture::Texture;
use vertex::TerrainVertex;

/// Clear color: a flat sky blue.
const SKY_COLOR: wgpu::Color = wgpu::Color {
    r: 0.5,
    g: 0.7,
    b: 0.9,
    a: 1.0,
};

/// Frame-level uniform data shared by every chunk draw.
///
/// Matches the WGSL `Scene` struct; the vectors are padded to `vec4`
/// alignment.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    sun_direction: [f32; 4],
}

impl SceneUniform {
    fn new() -> Self {
        let sun = Vector3::new(0.4, 0.8, 0.3).normalize();
        Self {
            view_proj: cgmath::Matrix4::from_scale(1.0).into(),
            camera_position: [0.0; 4],
            sun_direction: [sun.x, sun.y, sun.z, 0.0],
        }
    }
}

/// The terrain render pipeline and its per-frame resources.
pub struct TerrainRenderer {
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    depth_texture: Texture,
    scene_uniform: SceneUniform,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    model_bind_group_layout: wgpu::BindGroupLayout,
}

impl TerrainRenderer {
    /// Builds the render pipeline from the terrain shader source.
    pub fn new(
        device: &wgpu::Device,
        surface: wgpu::Surface<'static>,
        surface_config: wgpu::SurfaceConfiguration,
        shader_string: &str,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Terrain Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_string.into()),
        });

        let scene_uniform = SceneUniform::new();
        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniform"),
            contents: bytemuck::cast_slice(&[scene_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
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
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let model_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Chunk Model Bind Group Layout"),
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Terrain Render Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout, &model_bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Terrain Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[TerrainVertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Marching cubes does not produce a consistent winding, so
                // both faces stay on.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Texture::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let depth_texture = Texture::create_depth_texture(device, &surface_config, "Depth Texture");

        Self {
            surface,
            surface_config,
            render_pipeline,
            depth_texture,
            scene_uniform,
            scene_buffer,
            scene_bind_group,
            model_bind_group_layout,
        }
    }

    /// The layout chunk model bind groups are created against.
    pub fn model_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.model_bind_group_layout
    }

    /// Reconfigures the surface and recreates the depth buffer for a new
    /// window size. Zero-sized (minimized) windows are ignored.
    pub fn resize_surface(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.surface.configure(device, &self.surface_config);
        self.depth_texture =
            Texture::create_depth_texture(device, &self.surface_config, "Depth Texture");
    }

    /// Uploads this frame's view-projection matrix and camera position.
    pub fn update_scene(
        &mut self,
        queue: &wgpu::Queue,
        view_proj: Matrix4<f32>,
        camera_position: Point3<f32>,
    ) {
        self.scene_uniform.view_proj = view_proj.into();
        self.scene_uniform.camera_position =
            [camera_position.x, camera_position.y, camera_position.z, 0.0];
        queue.write_buffer(
            &self.scene_buffer,
            0,
            bytemuck::cast_slice(&[self.scene_uniform]),
        );
    }

    /// Renders one frame: sky clear, then every visible chunk.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped;
    /// the next redraw draws normally. Out-of-memory is fatal.
    pub fn render(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, world: &World) {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost, reconfiguring");
                self.surface.configure(device, &self.surface_config);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                panic!("out of GPU memory acquiring the surface");
            }
            Err(error) => {
                warn!("skipping frame: {error}");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let view_proj: Matrix4<f32> = self.scene_uniform.view_proj.into();
        let frustum = Frustum::from_view_proj(&view_proj);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Terrain Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SKY_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.scene_bind_group, &[]);
            world.render(&mut render_pass, &frustum);
        }

        queue.submit([encoder.finish()]);
        frame.present();
    }
}
