//! # Chunk Worker
//!
//! The single background thread that turns `GenerationJob`s into GPU
//! meshes. It owns its own handles to the shared `wgpu` device and queue
//! (the analogue of a second GL context sharing the main context's
//! resource namespace) and the compiled mesher pipelines, so it can encode
//! and submit command buffers without touching the render thread.
//!
//! ## Per-job pipeline
//!
//! 1. Allocate the job's scratch buffers (density field, per-cell offsets,
//!    atomic counter) plus a small readback staging buffer.
//! 2. Submit density + count passes and block on the submission to read
//!    the global vertex count back -- the one synchronous readback in the
//!    pipeline, unavoidable because the output allocation is sized by it.
//! 3. Zero vertices: publish an empty result so the request is still
//!    acknowledged and the scratch buffers travel to the consumer for
//!    cleanup.
//! 4. Otherwise allocate the exactly-sized vertex buffer, submit the emit
//!    pass and publish the result with that submission index as its fence.
//!    The worker does not wait on the emit submission; the consumer does.
//!
//! Buffer allocation or shader dispatch failure inside this pipeline is
//! fatal to the process (`wgpu` surfaces it through its error handler),
//! matching the engine's fail-fast posture -- there is no per-job retry.
//!
//! ## Shutdown
//!
//! Closing the request queue is the worker's only termination signal:
//! `pop` drains what was already queued, then returns `None` and the
//! thread exits. `shutdown` must therefore only be called after the queue
//! has been closed, otherwise the join would deadlock against a blocked
//! `pop`.

use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, info, warn};
use wgpu::{Buffer, Device, Queue};

use super::job_queue::{JobReceiver, ResultSender};
use super::mesher::pipelines::{
    GpuChunkParams, MesherPipelines, DENSITY_BUFFER_SIZE, OFFSETS_BUFFER_SIZE, VERTEX_STRIDE,
};
use super::{GenerationJob, GenerationResult};

/// Handle to the background generation thread.
pub struct ChunkWorker {
    thread: Option<JoinHandle<()>>,
}

impl ChunkWorker {
    /// Spawns the worker thread. The thread runs until the request queue
    /// feeding `jobs` is closed and drained.
    pub fn start(
        device: Arc<Device>,
        queue: Arc<Queue>,
        pipelines: MesherPipelines,
        jobs: JobReceiver<GenerationJob>,
        results: ResultSender<GenerationResult>,
    ) -> Self {
        let thread = std::thread::Builder::new()
            .name("chunk-worker".into())
            .spawn(move || {
                let context = WorkerContext {
                    device,
                    queue,
                    pipelines,
                };
                info!("chunk worker started");
                while let Some(job) = jobs.pop() {
                    let result = context.generate(job);
                    results.push(result);
                }
                info!("chunk worker request queue closed, exiting");
            })
            .expect("failed to spawn chunk worker thread");

        Self {
            thread: Some(thread),
        }
    }

    /// Joins the worker thread. The request queue must already be closed;
    /// see the module docs for the shutdown ordering.
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("chunk worker thread panicked before shutdown");
            }
        }
    }
}

impl Drop for ChunkWorker {
    fn drop(&mut self) {
        // Dropping the engine drops the request queue's sender first, so a
        // missing explicit shutdown still unblocks the worker.
        self.shutdown();
    }
}

/// Everything the worker thread owns: its device/queue handles and the
/// compiled pipelines.
struct WorkerContext {
    device: Arc<Device>,
    queue: Arc<Queue>,
    pipelines: MesherPipelines,
}

impl WorkerContext {
    /// Runs the full three-pass pipeline for one job.
    fn generate(&self, job: GenerationJob) -> GenerationResult {
        let params = self
            .pipelines
            .create_params_buffer(&self.device, GpuChunkParams::for_origin(job.world_origin));

        let density_buffer = self.create_storage_buffer("Density Field", DENSITY_BUFFER_SIZE);
        let offsets_buffer = self.create_storage_buffer("Cell Offsets", OFFSETS_BUFFER_SIZE);
        let counter_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Vertex Counter"),
            size: 4,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let counter_staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Vertex Counter Staging"),
            size: 4,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let indirect_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Chunk Indirect Draw"),
            size: std::mem::size_of::<wgpu::util::DrawIndirectArgs>() as u64,
            usage: wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Passes 1 and 2: sample the density grid, then count vertices and
        // assign per-cell output offsets. Consecutive compute passes on one
        // encoder are execution-ordered, which is exactly the barrier the
        // count pass needs over the density field.
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Chunk Count Encoder"),
            });
        self.pipelines
            .encode_density_pass(&self.device, &mut encoder, &params, &density_buffer);
        self.pipelines.encode_count_pass(
            &self.device,
            &mut encoder,
            &params,
            &density_buffer,
            &offsets_buffer,
            &counter_buffer,
        );
        encoder.copy_buffer_to_buffer(&counter_buffer, 0, &counter_staging, 0, 4);
        let count_submission = self.queue.submit([encoder.finish()]);

        let vertex_count = self.read_vertex_count(&counter_staging, &count_submission);
        debug!(
            "chunk ({}, {}, {}): {} vertices",
            job.key.x, job.key.y, job.key.z, vertex_count
        );

        if vertex_count == 0 {
            // Surface entirely inside or outside the volume. Still publish
            // so the streaming manager can acknowledge the request and
            // release the scratch buffers.
            return GenerationResult {
                key: job.key,
                world_origin: job.world_origin,
                vertex_buffer: None,
                indirect_buffer,
                vertex_count: 0,
                fence: count_submission,
                density_buffer,
                offsets_buffer,
                counter_buffer,
            };
        }

        // Pass 3: emit into an exactly-sized output buffer. STORAGE for the
        // compute write, VERTEX for the eventual draw.
        let vertex_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Chunk Vertices"),
            size: vertex_count as u64 * VERTEX_STRIDE,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::VERTEX,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Chunk Emit Encoder"),
            });
        self.pipelines.encode_emit_pass(
            &self.device,
            &mut encoder,
            &params,
            &density_buffer,
            &offsets_buffer,
            &vertex_buffer,
        );
        // No wait here: responsibility for observing this fence transfers
        // to the consumer along with the buffers.
        let emit_submission = self.queue.submit([encoder.finish()]);

        GenerationResult {
            key: job.key,
            world_origin: job.world_origin,
            vertex_buffer: Some(vertex_buffer),
            indirect_buffer,
            vertex_count,
            fence: emit_submission,
            density_buffer,
            offsets_buffer,
            counter_buffer,
        }
    }

    /// Blocks the worker on the count submission and reads back the global
    /// vertex count.
    fn read_vertex_count(
        &self,
        staging: &Buffer,
        submission: &wgpu::SubmissionIndex,
    ) -> u32 {
        let slice = staging.slice(..);
        let (sender, receiver) = channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device
            .poll(wgpu::PollType::WaitForSubmissionIndex(submission.clone()))
            .expect("device lost while waiting for vertex count");
        receiver
            .recv()
            .expect("vertex count map callback dropped")
            .expect("failed to map vertex count staging buffer");

        let count = {
            let data = slice.get_mapped_range();
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&data[..4]);
            u32::from_le_bytes(bytes)
        };
        staging.unmap();
        count
    }

    fn create_storage_buffer(&self, label: &str, size: u64) -> Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        })
    }
}
