//! GPU pipelines for the three-pass chunk generation.
//!
//! Owns the three compute pipelines (density sampling, vertex counting,
//! vertex emission), the uploaded lookup-table buffers shared by every job,
//! and the per-job bind-group plumbing. Created once on the main thread and
//! moved into the chunk worker; `wgpu` pipelines are internally
//! synchronized, so encoding from the worker thread needs no extra locking.

use wgpu::util::DeviceExt;
use wgpu::{BindGroup, BindGroupLayout, Buffer, CommandEncoder, ComputePipeline, Device};

use super::tables;
use crate::engine_state::terrain::config;

/// Threads per workgroup axis; shaders declare `@workgroup_size(4, 4, 4)`.
const WORKGROUP_SIZE: u32 = 4;

/// Bytes of one emitted vertex: position and normal, three `f32` each.
pub const VERTEX_STRIDE: u64 = 6 * 4;

/// Bytes of the density scratch buffer: one `f32` per grid point.
pub const DENSITY_BUFFER_SIZE: u64 =
    (config::GRID_POINTS_X * config::GRID_POINTS_Y * config::GRID_POINTS_Z) as u64 * 4;

/// Bytes of the per-cell offset scratch buffer: one `u32` per cell.
pub const OFFSETS_BUFFER_SIZE: u64 =
    (config::CHUNK_WIDTH * config::CHUNK_HEIGHT * config::CHUNK_DEPTH) as u64 * 4;

/// WGSL sources for the generation pipeline, loaded by the graphics
/// builder. The density source is expected to already have the noise
/// library prepended (WGSL has no include mechanism).
pub struct MesherShaderSources {
    pub density: String,
    pub count: String,
    pub emit: String,
}

/// Per-job uniform parameters shared by all three passes.
///
/// Layout matches the WGSL `ChunkParams` struct; the trailing padding
/// rounds the struct to its 16-byte uniform alignment.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuChunkParams {
    origin: [f32; 3],
    octaves: u32,
    frequency: f32,
    persistence: f32,
    lacunarity: f32,
    height_bias: f32,
    isolevel: f32,
    _padding: [f32; 3],
}

impl GpuChunkParams {
    /// Parameters for the chunk whose minimum corner sits at `origin`,
    /// with the fixed noise configuration from `config`.
    pub fn for_origin(origin: cgmath::Point3<f32>) -> Self {
        Self {
            origin: [origin.x, origin.y, origin.z],
            octaves: config::NOISE_OCTAVES,
            frequency: config::NOISE_FREQUENCY,
            persistence: config::NOISE_PERSISTENCE,
            lacunarity: config::NOISE_LACUNARITY,
            height_bias: config::HEIGHT_BIAS,
            isolevel: config::ISOLEVEL,
            _padding: [0.0; 3],
        }
    }
}

/// The compiled generation pipelines plus the immutable lookup tables.
pub struct MesherPipelines {
    density_pipeline: ComputePipeline,
    count_pipeline: ComputePipeline,
    emit_pipeline: ComputePipeline,
    density_layout: BindGroupLayout,
    count_layout: BindGroupLayout,
    emit_layout: BindGroupLayout,
    /// 256-entry active-edge masks, uploaded once, read-only thereafter.
    edge_table_buffer: Buffer,
    /// Flattened 256x16 triangle table, uploaded once, read-only thereafter.
    tri_table_buffer: Buffer,
}

/// Uniform-buffer bind-group entry for compute passes.
fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Storage-buffer bind-group entry for compute passes.
fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn buffer_entry(binding: u32, buffer: &Buffer) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: buffer.as_entire_binding(),
    }
}

impl MesherPipelines {
    /// Compiles the three compute pipelines and uploads the lookup tables.
    ///
    /// Shader compilation failure is fatal: the sources ship with the
    /// binary, so a failure here is a build defect, not a runtime
    /// condition.
    pub fn new(device: &Device, sources: &MesherShaderSources) -> Self {
        let density_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Density Shader"),
            source: wgpu::ShaderSource::Wgsl(sources.density.as_str().into()),
        });
        let count_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Marching Cubes Count Shader"),
            source: wgpu::ShaderSource::Wgsl(sources.count.as_str().into()),
        });
        let emit_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Marching Cubes Emit Shader"),
            source: wgpu::ShaderSource::Wgsl(sources.emit.as_str().into()),
        });

        let density_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Density Bind Group Layout"),
            entries: &[uniform_entry(0), storage_entry(1, false)],
        });
        let count_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Count Bind Group Layout"),
            entries: &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, false),
                storage_entry(3, false),
                storage_entry(4, true),
            ],
        });
        let emit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Emit Bind Group Layout"),
            entries: &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
                storage_entry(4, true),
                storage_entry(5, true),
            ],
        });

        let make_pipeline = |label, layout: &BindGroupLayout, module, entry_point| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            });
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        let density_pipeline =
            make_pipeline("Density Pipeline", &density_layout, &density_module, "main");
        let count_pipeline = make_pipeline("Count Pipeline", &count_layout, &count_module, "main");
        let emit_pipeline = make_pipeline("Emit Pipeline", &emit_layout, &emit_module, "main");

        let edge_table_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Edge Table"),
            contents: bytemuck::cast_slice(&tables::EDGE_TABLE),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let tri_table_flat: Vec<i32> = tables::TRI_TABLE
            .iter()
            .flatten()
            .map(|edge| *edge as i32)
            .collect();
        let tri_table_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Triangle Table"),
            contents: bytemuck::cast_slice(&tri_table_flat),
            usage: wgpu::BufferUsages::STORAGE,
        });

        Self {
            density_pipeline,
            count_pipeline,
            emit_pipeline,
            density_layout,
            count_layout,
            emit_layout,
            edge_table_buffer,
            tri_table_buffer,
        }
    }

    /// Creates the per-job uniform buffer.
    pub fn create_params_buffer(&self, device: &Device, params: GpuChunkParams) -> Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Chunk Params"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM,
        })
    }

    /// Encodes the density pass over all `(N+1)^3` grid points.
    pub fn encode_density_pass(
        &self,
        device: &Device,
        encoder: &mut CommandEncoder,
        params: &Buffer,
        density: &Buffer,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Density Bind Group"),
            layout: &self.density_layout,
            entries: &[buffer_entry(0, params), buffer_entry(1, density)],
        });
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Density Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.density_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(
            config::GRID_POINTS_X.div_ceil(WORKGROUP_SIZE),
            config::GRID_POINTS_Y.div_ceil(WORKGROUP_SIZE),
            config::GRID_POINTS_Z.div_ceil(WORKGROUP_SIZE),
        );
    }

    /// Encodes the count pass over all `N^3` cells. Reads the density field
    /// written by the preceding pass; the pass boundary is the execution
    /// barrier between them.
    pub fn encode_count_pass(
        &self,
        device: &Device,
        encoder: &mut CommandEncoder,
        params: &Buffer,
        density: &Buffer,
        offsets: &Buffer,
        counter: &Buffer,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Count Bind Group"),
            layout: &self.count_layout,
            entries: &[
                buffer_entry(0, params),
                buffer_entry(1, density),
                buffer_entry(2, offsets),
                buffer_entry(3, counter),
                buffer_entry(4, &self.tri_table_buffer),
            ],
        });
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Count Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.count_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        self.dispatch_cells(&mut pass);
    }

    /// Encodes the emit pass over all `N^3` cells, writing compacted
    /// vertices at the offsets recorded by the count pass.
    pub fn encode_emit_pass(
        &self,
        device: &Device,
        encoder: &mut CommandEncoder,
        params: &Buffer,
        density: &Buffer,
        offsets: &Buffer,
        vertices: &Buffer,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Emit Bind Group"),
            layout: &self.emit_layout,
            entries: &[
                buffer_entry(0, params),
                buffer_entry(1, density),
                buffer_entry(2, offsets),
                buffer_entry(3, vertices),
                buffer_entry(4, &self.edge_table_buffer),
                buffer_entry(5, &self.tri_table_buffer),
            ],
        });
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Emit Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.emit_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        self.dispatch_cells(&mut pass);
    }

    fn dispatch_cells(&self, pass: &mut wgpu::ComputePass<'_>) {
        pass.dispatch_workgroups(
            config::CHUNK_WIDTH.div_ceil(WORKGROUP_SIZE),
            config::CHUNK_HEIGHT.div_ceil(WORKGROUP_SIZE),
            config::CHUNK_DEPTH.div_ceil(WORKGROUP_SIZE),
        );
    }
}
