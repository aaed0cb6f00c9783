//! # Graphics Resources Builder
//!
//! Creates the window, wgpu instance, surface, device and queue, and loads
//! the shader sources from disk. Initialization is asynchronous in wgpu's
//! API, so the builder runs it to completion with `pollster` and delivers
//! the finished `Graphics` back to the event loop as a user event.
//!
//! Every failure here is fatal: without an adapter, a device or the shader
//! files there is nothing the engine can do, so the builder panics with a
//! message naming what was missing.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use wgpu::{Adapter, Device, Features, Instance, Queue, Surface, SurfaceConfiguration};
use winit::{
    event_loop::{ActiveEventLoop, EventLoopProxy},
    window::Window,
};

use crate::engine_state::MesherShaderSources;

/// All graphics resources the engine needs, created during initialization
/// and consumed by `EngineState::new`.
#[derive(Default)]
pub struct Graphics {
    pub window: Option<Arc<Window>>,
    pub instance: Option<Instance>,
    pub surface: Option<Surface<'static>>,
    pub surface_config: Option<SurfaceConfiguration>,
    pub adapter: Option<Adapter>,
    pub device: Option<Device>,
    pub queue: Option<Queue>,
    pub terrain_shader_string: String,
    pub mesher_shader_sources: Option<MesherShaderSources>,
}

fn read_shader(name: &str) -> String {
    let path = format!("assets/shaders/{name}");
    std::fs::read_to_string(Path::new(&path))
        .unwrap_or_else(|error| panic!("failed to read shader {path}: {error}"))
}

/// Loads the shader sources from `assets/shaders/`.
///
/// WGSL has no include mechanism, so the noise library is concatenated
/// ahead of the density shader that calls into it.
fn load_shader_sources() -> (String, MesherShaderSources) {
    let noise = read_shader("noise.wgsl");
    let density_body = read_shader("density.wgsl");

    let terrain = read_shader("terrain.wgsl");
    let mesher = MesherShaderSources {
        density: format!("{noise}\n{density_body}"),
        count: read_shader("mc_count.wgsl"),
        emit: read_shader("mc_emit.wgsl"),
    };
    (terrain, mesher)
}

/// Creates and initializes all required graphics resources.
fn create_graphics(event_loop: &ActiveEventLoop) -> impl Future<Output = Graphics> + 'static {
    let window_attrs = Window::default_attributes().with_title("marching-terrain");
    let window = Arc::new(
        event_loop
            .create_window(window_attrs)
            .expect("failed to create window"),
    );

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        flags: wgpu::InstanceFlags::empty(),
        backend_options: wgpu::BackendOptions::from_env_or_default(),
    });

    let surface = instance
        .create_surface(window.clone())
        .expect("failed to create surface");

    async move {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("no compatible GPU adapter found");

        // Compute shaders and indirect draws are core; no optional
        // features are needed.
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("failed to acquire GPU device");

        let size = window.inner_size();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let (terrain_shader_string, mesher_shader_sources) = load_shader_sources();

        Graphics {
            window: Some(window),
            instance: Some(instance),
            surface: Some(surface),
            surface_config: Some(surface_config),
            adapter: Some(adapter),
            device: Some(device),
            queue: Some(queue),
            terrain_shader_string,
            mesher_shader_sources: Some(mesher_shader_sources),
        }
    }
}

/// Drives graphics initialization and hands the result to the event loop.
pub struct GraphicsBuilder {
    event_loop_proxy: Option<EventLoopProxy<Graphics>>,
}

/// The states graphics resources move through during startup.
pub enum MaybeGraphics {
    /// Waiting for the event loop to resume.
    Builder(GraphicsBuilder),

    /// Resources are built and waiting to be consumed.
    Graphics(Graphics),

    /// Resources were handed to the engine.
    Moved,
}

impl GraphicsBuilder {
    pub fn new(event_loop_proxy: EventLoopProxy<Graphics>) -> Self {
        Self {
            event_loop_proxy: Some(event_loop_proxy),
        }
    }

    /// Runs initialization to completion and sends the result back through
    /// the event loop proxy. A second call is a no-op; the proxy is spent.
    pub fn build_and_send(&mut self, event_loop: &ActiveEventLoop) {
        let Some(event_loop_proxy) = self.event_loop_proxy.take() else {
            return;
        };

        let gfx = pollster::block_on(create_graphics(event_loop));
        assert!(event_loop_proxy.send_event(gfx).is_ok());
    }
}
