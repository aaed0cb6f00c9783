//! # Engine State Module
//!
//! The central coordinator for the terrain engine. `EngineState` owns the
//! GPU device and queue, the renderer, the streamed world and the chunk
//! worker, and drives them in the per-frame order the streaming pipeline
//! expects:
//!
//! 1. input is folded into the camera,
//! 2. the world re-centers on the camera and issues generation requests,
//! 3. finished chunk meshes are collected and adopted,
//! 4. the frame is rendered.
//!
//! Shutdown runs the reverse bracket: close the request queue, join the
//! worker, then let the world (and every chunk's GPU buffers) drop.

use std::sync::Arc;
use std::time::Duration;

use camera_state::CameraState;
use log::info;
use rendering::TerrainRenderer;
use terrain::config;
use terrain::job_queue::{request_queue, result_queue};
use terrain::mesher::pipelines::MesherPipelines;
use terrain::worker::ChunkWorker;
use terrain::world::World;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::keyboard::KeyCode;

use crate::application_state::input_state::ProcessedInputState;

mod camera_state;
mod rendering;
mod terrain;

pub use terrain::mesher::pipelines::MesherShaderSources;

/// The main state container for the terrain engine.
pub struct EngineState {
    device: Arc<Device>,
    queue: Arc<Queue>,
    camera_state: CameraState,
    player_actions: PlayerAction,
    renderer: TerrainRenderer,
    world: World,
    worker: ChunkWorker,
}

impl EngineState {
    /// Wires up the full pipeline: render pipeline, compute pipelines,
    /// job queues, worker thread and the initial burst of chunk requests
    /// around the starting camera position.
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: Device,
        queue: Queue,
        terrain_shader_string: String,
        mesher_shader_sources: MesherShaderSources,
    ) -> Self {
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let camera_state = CameraState::new(
            surface_config.width,
            surface_config.height,
            config::CAMERA_SPEED,
            config::MOUSE_SENSITIVITY,
        );

        let mut renderer =
            TerrainRenderer::new(&device, surface, surface_config, &terrain_shader_string);
        renderer.update_scene(&queue, camera_state.view_proj(), camera_state.position());

        let pipelines = MesherPipelines::new(&device, &mesher_shader_sources);

        let (generation_requests, job_receiver) = request_queue();
        let (result_sender, generation_results) = result_queue();

        let worker = ChunkWorker::start(
            device.clone(),
            queue.clone(),
            pipelines,
            job_receiver,
            result_sender,
        );

        let mut world = World::new(generation_requests, generation_results);
        world.update(camera_state.position());
        info!(
            "engine started, {} chunks requested around the camera",
            world.in_flight_count()
        );

        Self {
            device,
            queue,
            camera_state,
            player_actions: PlayerAction::default(),
            renderer,
            world,
            worker,
        }
    }

    /// Resizes the rendering surface and projection when the window size
    /// changes.
    pub fn resize_surface(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        self.renderer.resize_surface(&self.device, size);
        self.camera_state.resize(size.width, size.height);
    }

    /// Renders the current frame.
    pub fn render(&mut self) {
        self.renderer.render(&self.device, &self.queue, &self.world);
    }

    /// Adopts every chunk mesh the worker has finished since last frame.
    pub fn collect_generated_chunks(&mut self) {
        self.world.collect_finished(
            &self.device,
            &self.queue,
            self.renderer.model_bind_group_layout(),
        );
    }

    /// Advances the camera by the frame time and re-centers the streamed
    /// world on it.
    pub fn process_input(&mut self, wait_duration: Duration) {
        self.camera_state.intake_actions(&self.player_actions);

        if self.camera_state.update(wait_duration) {
            self.renderer.update_scene(
                &self.queue,
                self.camera_state.view_proj(),
                self.camera_state.position(),
            );
        }
        self.world.update(self.camera_state.position());
    }

    /// Sets the player actions for the next frame from processed input.
    pub fn set_input_commands(&mut self, input: ProcessedInputState) {
        self.player_actions = Self::translate_processed_input(input);
    }

    /// Stops background generation: closes the request queue, then joins
    /// the worker once it has drained. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.world.close_requests();
        self.worker.shutdown();
        info!(
            "engine shut down with {} chunks resident",
            self.world.active_count()
        );
    }

    fn translate_processed_input(input: ProcessedInputState) -> PlayerAction {
        let mut player_action = PlayerAction {
            move_forward: input.get_key_state(KeyCode::KeyW).is_active(),
            move_backward: input.get_key_state(KeyCode::KeyS).is_active(),
            move_left: input.get_key_state(KeyCode::KeyA).is_active(),
            move_right: input.get_key_state(KeyCode::KeyD).is_active(),
            move_up: input.get_key_state(KeyCode::Space).is_active(),
            move_down: input.get_key_state(KeyCode::ShiftLeft).is_active(),
            rotate_view: None,
        };

        // Mouse look only while the left button is down.
        if input.get_mouse_delta().is_some()
            && input
                .get_mouse_button_state(winit::event::MouseButton::Left)
                .is_active()
        {
            player_action.rotate_view = input.get_mouse_delta();
        }

        player_action
    }
}

/// Player actions derived from one frame of input.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlayerAction {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,

    /// Mouse-look delta, present while the left button is held and the
    /// mouse moved.
    pub rotate_view: Option<(f64, f64)>,
}
