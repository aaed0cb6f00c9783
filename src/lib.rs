//! # Marching Terrain
//!
//! A real-time voxel terrain engine: chunks of a procedural density field
//! are meshed on the GPU with marching cubes and streamed in around the
//! camera by a background worker thread.
//!
//! ## Key Modules
//!
//! * `application_state` - Window, input and the winit application shell
//! * `engine_state` - The engine proper: camera, rendering, and the
//!   terrain streaming/meshing pipeline
//!
//! ## Architecture
//!
//! The main thread owns the window, the camera and the set of resident
//! chunks. A single worker thread owns the marching-cubes compute
//! pipelines and turns generation requests into GPU meshes; the two sides
//! meet only at a pair of queues. See `engine_state::terrain` for the
//! pipeline details.

use application_state::{
    graphics_resources_builder::{GraphicsBuilder, MaybeGraphics},
    ApplicationState,
};

use log::info;
use winit::event_loop::EventLoop;

mod application_state;
mod engine_state;

/// Initializes logging and runs the engine until the window closes.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");
    let event_loop = EventLoop::with_user_event().build().unwrap();

    let mut state: ApplicationState = ApplicationState {
        graphics: MaybeGraphics::Builder(GraphicsBuilder::new(event_loop.create_proxy())),
        state: None,
    };

    let _ = event_loop.run_app(&mut state);
}
