//! # Terrain Streaming and Meshing
//!
//! The producer/consumer pipeline that turns observer movement into
//! GPU-resident chunk meshes:
//!
//! 1. `World::update` inspects the observer's chunk coordinate and pushes a
//!    `GenerationJob` for every missing chunk in range.
//! 2. The `ChunkWorker` thread pops jobs, runs the three-pass marching-cubes
//!    pipeline on the GPU (density -> count -> emit) and publishes a
//!    `GenerationResult` carrying the produced buffers and a submission
//!    fence.
//! 3. `World::collect_finished` drains results each frame, finalizes the
//!    indirect draw arguments and adopts the mesh into the active chunk map.
//!
//! The two threads meet only at the job queues; the active chunk map is
//! owned exclusively by the main thread.

use cgmath::Point3;

pub mod chunk;
pub mod config;
pub mod job_queue;
pub mod mesher;
pub mod worker;
pub mod world;

/// Integer grid coordinate identifying one chunk of the world.
///
/// Keys are dense around the observer and sparse elsewhere; they are used as
/// map keys and must stay cheap to hash and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkKey {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The chunk containing the given world-space position (floor division
    /// per axis).
    pub fn from_world(position: Point3<f32>) -> Self {
        Self {
            x: (position.x / config::CHUNK_WIDTH as f32).floor() as i32,
            y: (position.y / config::CHUNK_HEIGHT as f32).floor() as i32,
            z: (position.z / config::CHUNK_DEPTH as f32).floor() as i32,
        }
    }

    /// World-space position of this chunk's minimum corner.
    pub fn world_origin(&self) -> Point3<f32> {
        Point3::new(
            self.x as f32 * config::CHUNK_WIDTH as f32,
            self.y as f32 * config::CHUNK_HEIGHT as f32,
            self.z as f32 * config::CHUNK_DEPTH as f32,
        )
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

/// A request for the worker to generate one chunk's mesh.
///
/// Created by `World::update`, consumed exactly once by the worker.
#[derive(Debug, Clone, Copy)]
pub struct GenerationJob {
    pub key: ChunkKey,
    pub world_origin: Point3<f32>,
}

/// A finished generation, published by the worker and consumed exactly once
/// by `World::collect_finished`.
///
/// Ownership of the GPU buffers transfers with the struct. `vertex_buffer`
/// and `indirect_buffer` become the chunk's persistent mesh; the scratch
/// buffers (density field, per-cell offsets, vertex counter) are dropped by
/// the consumer once the fence has been observed complete. None of the
/// buffers may be read before `fence` resolves -- the fence is the only
/// cross-thread visibility guarantee for GPU-written data.
#[derive(Debug)]
pub struct GenerationResult {
    pub key: ChunkKey,
    pub world_origin: Point3<f32>,
    /// Compacted vertex output of the emit pass; `None` when the chunk's
    /// surface produced zero vertices.
    pub vertex_buffer: Option<wgpu::Buffer>,
    /// Indirect draw argument buffer, finalized by the consumer once the
    /// vertex count is known on the CPU.
    pub indirect_buffer: wgpu::Buffer,
    /// Total vertices emitted, read back from the count pass.
    pub vertex_count: u32,
    /// Submission index of the last GPU work touching these buffers.
    pub fence: wgpu::SubmissionIndex,
    /// Scratch: sampled density field, released after the fence resolves.
    pub density_buffer: wgpu::Buffer,
    /// Scratch: per-cell output offsets from the count pass.
    pub offsets_buffer: wgpu::Buffer,
    /// Scratch: global atomic vertex counter.
    pub counter_buffer: wgpu::Buffer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_world_floors_negative_coordinates() {
        assert_eq!(
            ChunkKey::from_world(Point3::new(-0.5, 10.0, 63.9)),
            ChunkKey::new(-1, 0, 0)
        );
        assert_eq!(
            ChunkKey::from_world(Point3::new(-64.0, -64.5, 128.0)),
            ChunkKey::new(-1, -2, 2)
        );
    }

    #[test]
    fn world_origin_inverts_from_world() {
        let key = ChunkKey::new(-3, 1, 7);
        assert_eq!(ChunkKey::from_world(key.world_origin()), key);
        assert_eq!(
            key.world_origin(),
            Point3::new(-192.0, 64.0, 448.0)
        );
    }

    #[test]
    fn offset_shifts_per_axis() {
        let key = ChunkKey::new(1, 2, 3).offset(-2, 0, 5);
        assert_eq!(key, ChunkKey::new(-1, 2, 8));
    }
}
