//! # World
//!
//! Main-thread bookkeeping for the streamed terrain: which chunks are
//! resident, which are in flight, and when each gets requested, adopted or
//! evicted. The chunk maps are owned exclusively by this thread; the only
//! contact with the worker is through the job queues.
//!
//! A key lives in at most one of the two collections:
//!
//! * `requested_keys` while its generation job is in flight, and
//! * `active_chunks` once its result (possibly an empty shell) arrives.
//!
//! Empty-surface results still become resident shell chunks. That keeps the
//! invariant simple and stops `update` from re-requesting air chunks every
//! frame.
//!
//! The request region is flatter than the eviction region: new chunks are
//! only requested within the vertical band, but a resident chunk survives
//! until its Chebyshev distance from the observer exceeds the view
//! distance. The gap is hysteresis for vertical movement -- chunks just
//! above or below the band are kept instead of being regenerated on every
//! climb and descent.

use std::collections::{HashMap, HashSet};

use cgmath::Point3;
use log::{debug, trace};
use wgpu::util::DeviceExt;

use crate::engine_state::rendering::frustum::Frustum;

use super::chunk::{Chunk, ChunkMesh};
use super::config;
use super::job_queue::{RequestQueue, ResultQueue};
use super::{ChunkKey, GenerationJob, GenerationResult};

pub struct World {
    /// Resident chunks, shells included. Main-thread only.
    active_chunks: HashMap<ChunkKey, Chunk>,
    /// Keys whose generation job is in flight.
    requested_keys: HashSet<ChunkKey>,
    /// Producer end of the job queue; closing it stops the worker.
    generation_requests: RequestQueue<GenerationJob>,
    /// Consumer end of the result queue, drained once per frame.
    generation_results: ResultQueue<GenerationResult>,
}

impl World {
    pub fn new(
        generation_requests: RequestQueue<GenerationJob>,
        generation_results: ResultQueue<GenerationResult>,
    ) -> Self {
        Self {
            active_chunks: HashMap::new(),
            requested_keys: HashSet::new(),
            generation_requests,
            generation_results,
        }
    }

    /// Re-centers the streamed region on the observer: evicts chunks that
    /// fell out of range and requests the ones newly in range.
    ///
    /// Idempotent for a stationary observer -- a key that is resident or in
    /// flight is never requested again.
    pub fn update(&mut self, observer: Point3<f32>) {
        let center = ChunkKey::from_world(observer);

        // Eviction: Chebyshev distance against the view distance, all
        // three axes. Wider vertically than the request region below.
        let in_keep_range = |key: &ChunkKey| {
            (key.x - center.x)
                .abs()
                .max((key.y - center.y).abs())
                .max((key.z - center.z).abs())
                <= config::VIEW_DISTANCE
        };

        let before = self.active_chunks.len();
        self.active_chunks.retain(|key, _| in_keep_range(key));
        let evicted = before - self.active_chunks.len();
        if evicted > 0 {
            debug!("evicted {evicted} chunks");
        }
        // Forgetting an in-flight key means its result will arrive
        // unsolicited; collect_finished adopts it anyway, and the next
        // eviction pass reclaims it if the observer has not come back.
        self.requested_keys.retain(in_keep_range);

        for dx in -config::VIEW_DISTANCE..=config::VIEW_DISTANCE {
            for dz in -config::VIEW_DISTANCE..=config::VIEW_DISTANCE {
                for dy in -config::VERTICAL_BAND..=config::VERTICAL_BAND {
                    let key = center.offset(dx, dy, dz);
                    if self.active_chunks.contains_key(&key)
                        || self.requested_keys.contains(&key)
                    {
                        continue;
                    }
                    trace!("requesting chunk ({}, {}, {})", key.x, key.y, key.z);
                    self.requested_keys.insert(key);
                    self.generation_requests.push(GenerationJob {
                        key,
                        world_origin: key.world_origin(),
                    });
                }
            }
        }
    }

    /// Drains every ready generation result, finalizes its draw state and
    /// adopts it into the active map.
    ///
    /// For each result: wait out its submission fence, patch the real
    /// vertex count into the indirect draw arguments, build the per-chunk
    /// model bind group, and insert (or re-equip) the chunk. The result's
    /// scratch buffers drop at the end of each iteration, after the fence
    /// has guaranteed the GPU is done with them.
    pub fn collect_finished(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        model_bind_group_layout: &wgpu::BindGroupLayout,
    ) {
        while let Some(result) = self.generation_results.try_pop() {
            self.requested_keys.remove(&result.key);

            // The worker already waited on the count submission, so for
            // empty results this returns immediately; for meshes it covers
            // the emit pass.
            device
                .poll(wgpu::PollType::WaitForSubmissionIndex(result.fence.clone()))
                .expect("device lost while waiting for chunk generation");

            // A late result for an evicted key is adopted anyway; eviction
            // on a later update reclaims it.
            let chunk = self
                .active_chunks
                .entry(result.key)
                .or_insert_with(|| Chunk::shell(result.world_origin));
            if let Some(mesh) = Self::build_mesh(device, queue, model_bind_group_layout, &result) {
                chunk.adopt_prebuilt(mesh);
            } else {
                trace!(
                    "chunk ({}, {}, {}) is empty",
                    result.key.x,
                    result.key.y,
                    result.key.z
                );
            }
        }
    }

    /// Finalizes a result's draw state: patches the indirect arguments and
    /// builds the per-chunk model bind group. `None` for empty surfaces.
    fn build_mesh(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        model_bind_group_layout: &wgpu::BindGroupLayout,
        result: &GenerationResult,
    ) -> Option<ChunkMesh> {
        let vertex_buffer = result.vertex_buffer.as_ref()?;

        let args = wgpu::util::DrawIndirectArgs {
            vertex_count: result.vertex_count,
            instance_count: 1,
            first_vertex: 0,
            first_instance: 0,
        };
        queue.write_buffer(&result.indirect_buffer, 0, args.as_bytes());

        let model: [[f32; 4]; 4] = cgmath::Matrix4::from_translation(cgmath::Vector3::new(
            result.world_origin.x,
            result.world_origin.y,
            result.world_origin.z,
        ))
        .into();
        let model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Chunk Model Uniform"),
            contents: bytemuck::cast_slice(&[model]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Chunk Model Bind Group"),
            layout: model_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        });

        Some(ChunkMesh {
            vertex_buffer: vertex_buffer.clone(),
            indirect_buffer: result.indirect_buffer.clone(),
            model_bind_group,
        })
    }

    /// Draws every resident chunk whose bounds intersect the frustum. The
    /// terrain pipeline and frame bind group must already be set on the
    /// pass.
    pub fn render<'a, 'b>(&'a self, render_pass: &mut wgpu::RenderPass<'b>, frustum: &Frustum)
    where
        'a: 'b,
    {
        for chunk in self.active_chunks.values() {
            if !chunk.is_renderable() {
                continue;
            }
            let (min, max) = chunk.bounds();
            if !frustum.intersects_aabb(min, max) {
                continue;
            }
            chunk.render_raw(render_pass);
        }
    }

    /// Closes the request queue. The first half of the shutdown bracket;
    /// the second is joining the worker, which must happen after this.
    pub fn close_requests(&mut self) {
        self.generation_requests.close();
    }

    /// Resident chunk count, shells included. Diagnostics only.
    pub fn active_count(&self) -> usize {
        self.active_chunks.len()
    }

    /// In-flight generation count. Diagnostics only.
    pub fn in_flight_count(&self) -> usize {
        self.requested_keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::super::job_queue::{request_queue, result_queue};
    use super::*;

    fn streamed_volume() -> usize {
        let horizontal = (2 * config::VIEW_DISTANCE + 1) as usize;
        let vertical = (2 * config::VERTICAL_BAND + 1) as usize;
        horizontal * horizontal * vertical
    }

    #[test]
    fn update_requests_every_chunk_in_range_exactly_once() {
        let (requests, receiver) = request_queue();
        let (_sender, results) = result_queue();
        let mut world = World::new(requests, results);

        world.update(Point3::new(0.0, 0.0, 0.0));
        world.update(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(world.in_flight_count(), streamed_volume());

        world.close_requests();
        let mut jobs = Vec::new();
        while let Some(job) = receiver.pop() {
            jobs.push(job.key);
        }
        assert_eq!(jobs.len(), streamed_volume());

        let unique: HashSet<_> = jobs.iter().copied().collect();
        assert_eq!(unique.len(), jobs.len(), "duplicate requests issued");
    }

    #[test]
    fn small_moves_within_a_chunk_request_nothing_new() {
        let (requests, receiver) = request_queue();
        let (_sender, results) = result_queue();
        let mut world = World::new(requests, results);

        world.update(Point3::new(1.0, 1.0, 1.0));
        world.update(Point3::new(30.0, 5.0, 60.0));

        world.close_requests();
        let mut count = 0;
        while receiver.pop().is_some() {
            count += 1;
        }
        assert_eq!(count, streamed_volume());
    }

    #[test]
    fn eviction_clears_resident_and_in_flight_state() {
        let (requests, _receiver) = request_queue();
        let (_sender, results) = result_queue();
        let mut world = World::new(requests, results);

        let far = ChunkKey::new(100, 0, 100);
        world
            .active_chunks
            .insert(far, Chunk::shell(far.world_origin()));
        world.requested_keys.insert(ChunkKey::new(100, 0, 101));

        world.update(Point3::new(0.0, 0.0, 0.0));

        assert!(!world.active_chunks.contains_key(&far));
        assert!(!world.requested_keys.contains(&ChunkKey::new(100, 0, 101)));
        assert_eq!(world.in_flight_count(), streamed_volume());
    }

    /// A resident chunk above the request band but within the view
    /// distance survives eviction; past the view distance it goes. This is
    /// the vertical hysteresis the split between the two regions buys.
    #[test]
    fn eviction_uses_view_distance_on_every_axis() {
        let (requests, _receiver) = request_queue();
        let (_sender, results) = result_queue();
        let mut world = World::new(requests, results);

        let above_band = ChunkKey::new(0, config::VERTICAL_BAND + 1, 0);
        let at_limit = ChunkKey::new(0, config::VIEW_DISTANCE, 0);
        let beyond = ChunkKey::new(0, config::VIEW_DISTANCE + 1, 0);
        for key in [above_band, at_limit, beyond] {
            world
                .active_chunks
                .insert(key, Chunk::shell(key.world_origin()));
        }

        world.update(Point3::new(0.0, 0.0, 0.0));

        assert!(world.active_chunks.contains_key(&above_band));
        assert!(world.active_chunks.contains_key(&at_limit));
        assert!(!world.active_chunks.contains_key(&beyond));
        // Surviving out-of-band chunks are kept, not re-requested.
        assert_eq!(world.in_flight_count(), streamed_volume());
    }

    #[test]
    fn resident_chunks_are_not_rerequested() {
        let (requests, receiver) = request_queue();
        let (_sender, results) = result_queue();
        let mut world = World::new(requests, results);

        let origin = ChunkKey::new(0, 0, 0);
        world
            .active_chunks
            .insert(origin, Chunk::shell(origin.world_origin()));

        world.update(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(world.in_flight_count(), streamed_volume() - 1);

        world.close_requests();
        while let Some(job) = receiver.pop() {
            assert_ne!(job.key, origin);
        }
    }
}
