///
/// Enable debug logging: RUST_LOG=debug
///
/// Usage: vk_renderer [model.obj]
///

mod config;
mod renderer;

use anyhow::Result;
use lazy_static::lazy_static;
use log::*;
use nalgebra_glm as glm;
use std::path::Path;
use std::time::Instant;
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use renderer::{Renderer, Vertex};

lazy_static! {
    static ref QUADS: Vec<Vec<Vertex>> = vec![
        vec![
            Vertex::new(glm::vec3(-0.4, -0.4, 0.0), glm::vec3(1.0, 0.0, 0.0), glm::vec2(0.0, 1.0)),
            Vertex::new(glm::vec3(0.4, -0.4, 0.0), glm::vec3(0.0, 1.0, 0.0), glm::vec2(1.0, 1.0)),
            Vertex::new(glm::vec3(0.4, 0.4, 0.0), glm::vec3(0.0, 0.0, 1.0), glm::vec2(1.0, 0.0)),
            Vertex::new(glm::vec3(-0.4, 0.4, 0.0), glm::vec3(1.0, 1.0, 0.0), glm::vec2(0.0, 0.0)),
        ],
        vec![
            Vertex::new(glm::vec3(-0.25, -0.6, 0.0), glm::vec3(0.0, 0.0, 1.0), glm::vec2(0.0, 1.0)),
            Vertex::new(glm::vec3(0.25, -0.6, 0.0), glm::vec3(0.0, 0.0, 1.0), glm::vec2(1.0, 1.0)),
            Vertex::new(glm::vec3(0.25, 0.6, 0.0), glm::vec3(0.0, 1.0, 0.0), glm::vec2(1.0, 0.0)),
            Vertex::new(glm::vec3(-0.25, 0.6, 0.0), glm::vec3(0.0, 1.0, 0.0), glm::vec2(0.0, 0.0)),
        ],
    ];
    static ref QUAD_INDICES: Vec<u32> = vec![0, 1, 2, 2, 3, 0];
    static ref QUAD_OFFSETS: Vec<glm::Vec3> = vec![glm::vec3(0.0, 0.0, 0.0), glm::vec3(0.0, 0.0, -0.5)];
}

fn main() {
    pretty_env_logger::init();

    let config = match config::Config::load(Path::new(config::CONFIG_FILE)) {
        Ok(config) => config.with_args(std::env::args().skip(1)),
        Err(e) => {
            error!("Failed to read `{}`: {}", config::CONFIG_FILE, e);
            std::process::exit(1);
        }
    };

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title(config.window.title.as_str())
        .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
        .with_resizable(false)
        .build(&event_loop)
    {
        Ok(window) => window,
        Err(e) => {
            error!("Failed to create window: {}", e);
            std::process::exit(1);
        }
    };

    info!("Creating renderer...");

    let (mut renderer, models) = match unsafe { setup(&window, &config) } {
        Ok(setup) => setup,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    // The built-in quads are already unit sized.
    let scale = match config.model {
        Some(_) => config.animation.scale,
        None => 1.0,
    };

    let start = Instant::now();
    let mut destroying = false;
    let mut minimized = false;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            Event::MainEventsCleared if !destroying && !minimized => {
                let angle = (config.animation.degrees_per_second * start.elapsed().as_secs_f32()) % 360.0;
                let result = spin(&mut renderer, &models, scale, angle)
                    .and_then(|_| unsafe { renderer.draw() });

                if let Err(e) = result {
                    error!("{:#}", e);
                    destroying = true;
                    unsafe { renderer.destroy() };
                    *control_flow = ControlFlow::ExitWithCode(1);
                }
            }

            Event::WindowEvent { event: WindowEvent::Resized(size), .. } => {
                minimized = size.width == 0 || size.height == 0;
            }

            Event::WindowEvent { event: WindowEvent::CloseRequested, .. } => {
                destroying = true;
                *control_flow = ControlFlow::Exit;
                unsafe { renderer.destroy() };
            }

            _ => {}
        }
    });
}

/// Creates the renderer and loads the configured model, or the built-in quads.
unsafe fn setup(window: &Window, config: &config::Config) -> Result<(Renderer, Vec<usize>)> {
    let mut renderer = Renderer::create(window, &config.settings())?;
    renderer.set_camera(config.camera());

    let models = match &config.model {
        Some(path) => vec![renderer.create_mesh_model(path)?],
        None => {
            info!("No model configured, drawing the built-in quads.");
            let mut models = Vec::with_capacity(QUADS.len());
            for (quad, offset) in QUADS.iter().zip(QUAD_OFFSETS.iter()) {
                let id = renderer.create_primitive_model(quad, Some(QUAD_INDICES.as_slice()), 0)?;
                renderer.update_mesh(id, 0, glm::translation(offset))?;
                models.push(id);
            }
            models
        }
    };

    debug!("Drawing {} mesh models.", renderer.model_count());

    Ok((renderer, models))
}

fn spin(renderer: &mut Renderer, models: &[usize], scale: f32, angle: f32) -> Result<()> {
    let transform = glm::scaling(&glm::vec3(scale, scale, scale));
    let transform = glm::rotate(&transform, angle.to_radians(), &glm::vec3(0.0, 1.0, 0.0));

    models.iter().try_for_each(|id| renderer.update_model(*id, transform))
}
