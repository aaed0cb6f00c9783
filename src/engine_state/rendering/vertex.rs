//! Vertex format shared by the mesher's emit pass and the terrain render
//! pipeline.
//!
//! The emit shader writes each vertex as six tightly packed `f32`s
//! (position, then normal) straight into the buffer this layout describes.
//! The stride is therefore 24 bytes, not the 32 a `vec3`-padded struct
//! would occupy; keeping the compute-side writes scalar is what makes the
//! two layouts agree.

/// A terrain surface vertex: world-relative position and flat normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    /// Chunk-local position in world units.
    pub position: [f32; 3],
    /// Per-triangle face normal, unit length.
    pub normal: [f32; 3],
}

impl TerrainVertex {
    /// The vertex buffer layout matching the emit pass output.
    ///
    /// # Shader Attributes
    /// - `location = 0`: position (vec3<f32>)
    /// - `location = 1`: normal (vec3<f32>)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TerrainVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::terrain::mesher::pipelines::VERTEX_STRIDE;

    #[test]
    fn vertex_size_matches_emit_pass_stride() {
        assert_eq!(std::mem::size_of::<TerrainVertex>() as u64, VERTEX_STRIDE);
    }
}
