//! # Chunk
//!
//! A thin exclusive owner of one spatial cell's GPU mesh resources. Chunks
//! are constructed as empty shells when their generation request is issued
//! and become renderable only once `adopt_prebuilt` transfers ownership of
//! the worker-produced buffers. Dropping a chunk releases every resource it
//! holds; dropping a shell releases nothing.
//!
//! The type is deliberately neither `Clone` nor `Copy`: exactly one owner
//! of the GPU handles exists at any time, so an eviction can never race an
//! aliased draw.

use cgmath::{Point3, Vector3};

use super::config;

/// The renderable payload of a chunk, produced asynchronously by the chunk
/// worker and finalized by the streaming manager.
#[derive(Debug)]
pub struct ChunkMesh {
    /// Compacted vertex data (position + normal) written by the emit pass.
    pub vertex_buffer: wgpu::Buffer,
    /// Indirect draw arguments; the vertex count inside was finalized from
    /// the count-pass readback before this struct was built.
    pub indirect_buffer: wgpu::Buffer,
    /// Per-chunk model-transform bind group over the vertex layout -- the
    /// draw-state object built by the consumer at adoption time.
    pub model_bind_group: wgpu::BindGroup,
}

/// One fixed-size cubic region of the voxel world.
#[derive(Debug)]
pub struct Chunk {
    /// World-space position of the chunk's minimum corner. Immutable.
    origin: Point3<f32>,
    /// Mesh resources, present only once generation has completed with a
    /// non-empty surface.
    mesh: Option<ChunkMesh>,
}

impl Chunk {
    /// Creates a shell chunk: origin only, no GPU resources. Used as the
    /// placeholder for a chunk whose surface is empty (and, transiently,
    /// as the target `adopt_prebuilt` equips).
    pub fn shell(origin: Point3<f32>) -> Self {
        Self { origin, mesh: None }
    }

    pub fn origin(&self) -> Point3<f32> {
        self.origin
    }

    /// Axis-aligned bounds of the chunk in world space.
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        let max = self.origin
            + Vector3::new(
                config::CHUNK_WIDTH as f32,
                config::CHUNK_HEIGHT as f32,
                config::CHUNK_DEPTH as f32,
            );
        (self.origin, max)
    }

    /// Takes ownership of a finished mesh. Any previously held resources
    /// are dropped first, so re-adoption (the accepted late-result case)
    /// cannot leak.
    pub fn adopt_prebuilt(&mut self, mesh: ChunkMesh) {
        self.mesh = Some(mesh);
    }

    /// Whether this chunk has geometry to draw.
    pub fn is_renderable(&self) -> bool {
        self.mesh.is_some()
    }

    /// Issues the chunk's indirect draw. The vertex count comes from the
    /// indirect buffer, not the CPU; callers must have bound the terrain
    /// pipeline and frame bind group already.
    pub fn render_raw<'a, 'b>(&'a self, render_pass: &mut wgpu::RenderPass<'b>)
    where
        'a: 'b,
    {
        let Some(mesh) = &self.mesh else {
            return;
        };
        render_pass.set_bind_group(1, &mesh.model_bind_group, &[]);
        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        render_pass.draw_indirect(&mesh.indirect_buffer, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_chunk_is_not_renderable() {
        let chunk = Chunk::shell(Point3::new(64.0, -128.0, 0.0));
        assert!(!chunk.is_renderable());
        assert_eq!(chunk.origin(), Point3::new(64.0, -128.0, 0.0));
    }

    #[test]
    fn bounds_span_one_chunk() {
        let chunk = Chunk::shell(Point3::new(0.0, 0.0, 0.0));
        let (min, max) = chunk.bounds();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(
            max,
            Point3::new(
                config::CHUNK_WIDTH as f32,
                config::CHUNK_HEIGHT as f32,
                config::CHUNK_DEPTH as f32
            )
        );
    }
}
