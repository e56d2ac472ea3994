#[cfg(feature = "metal")]
use gfx_backend_metal as back;

#[cfg(feature = "vulkan")]
use gfx_backend_vulkan as back;

mod config;
mod error;
mod mesh;
mod renderer;
mod window;

use config::AppConfig;
use error::AppError;
use mesh::MeshTable;
use renderer::{shader, Renderer, RendererError};
use window::{FrameLoop, Signal};

use gfx_hal::{prelude::*, Backend};
use log::{debug, error, info};
use std::process;
use winit::{
    event::Event,
    event_loop::{ControlFlow, EventLoop},
    platform::desktop::EventLoopExtDesktop,
};

const FPS_LOG_INTERVAL: usize = 600;

fn main() {
    let config = AppConfig::default();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter))
        .init();

    if let Err(err) = run(&config) {
        error!("{}", err);
        println!("error: {}", err);
        process::exit(1);
    }
}

fn run(config: &AppConfig) -> Result<(), AppError> {
    config.validate()?;

    let mesh = MeshTable::mosaic()?;
    info!(
        "loaded mosaic: {} triangles, {} vertices",
        mesh.triangle_count(),
        mesh.vertex_count()
    );

    let mut event_loop = EventLoop::new();
    let window = window::build(&config.window, &event_loop)?;

    let shaders = shader::compile_program(&config.shaders)?;
    info!("compiled vertex and fragment shaders");

    let instance = back::Instance::create("mosaic", config.window.api_version)
        .map_err(|err| AppError::Backend(format!("{:?}", err)))?;
    let surface = unsafe { instance.create_surface(&window) }
        .map_err(|err| AppError::Backend(format!("{:?}", err)))?;
    let mut adapters = instance.enumerate_adapters();
    if adapters.is_empty() {
        unsafe { instance.destroy_surface(surface) };
        return Err(AppError::NoAdapter);
    }
    let adapter = adapters.remove(0);
    info!("using adapter {}", adapter.info.name);

    let mut renderer: Renderer<back::Backend> =
        Renderer::new(instance, surface, adapter, config, &mesh, &shaders)?;

    let mut frames = FrameLoop::new(config.window.quit_key, renderer.extent());
    let mut fps_counter = fps_counter::FPSCounter::new();
    let mut failure = None;

    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            Event::WindowEvent { event, .. } => {
                if let Some(signal) = Signal::from_event(&event) {
                    frames.handle(signal);
                }
            }
            Event::MainEventsCleared => match advance(&mut frames, &mut renderer) {
                Ok(true) => {
                    let fps = fps_counter.tick();
                    if renderer.frame_index() % FPS_LOG_INTERVAL == 0 {
                        debug!("{} fps", fps);
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    failure = Some(err);
                    frames.close();
                }
            },
            _ => {}
        }
        if !frames.is_running() {
            *control_flow = ControlFlow::Exit;
        }
    });

    frames.terminate();
    drop(renderer);
    drop(window);
    info!("shut down ({:?})", frames.phase());

    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Catches the swapchain up with any resize, then draws one frame if the
/// loop still wants one. Returns whether a frame was drawn.
fn advance<B: Backend>(
    frames: &mut FrameLoop,
    renderer: &mut Renderer<B>,
) -> Result<bool, RendererError> {
    if let Some(extent) = frames.take_resize() {
        renderer.resize(extent)?;
    }
    if !frames.should_draw() {
        return Ok(false);
    }
    renderer.render()?;
    Ok(true)
}
