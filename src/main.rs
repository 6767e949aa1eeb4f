mod graphics;

use anyhow::Result;
use clap::Parser;
use galaxy::chart::paint_overlay;
use galaxy::{GalaxyConfig, RotationMode, Simulation};
use glam::{Mat4, Vec3};
use graphics::Graphics;
use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    event::{ElementState, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

/// Native galaxy rotation viewer.
#[derive(Parser, Debug)]
#[command(name = "galaxy", version, about)]
struct Args {
    /// JSON file with galaxy parameters; defaults are used for missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the star field; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

/// Distance of the chart overlay from the window corner, in points.
const CHART_MARGIN: f32 = 16.0;

struct OrbitCamera {
    yaw: f32,
    pitch: f32,
    distance: f32,
    fov_y: f32,
}

impl OrbitCamera {
    /// Starts above and in front of the disk, looking at the center.
    fn new() -> Self {
        OrbitCamera {
            yaw: 0.0,
            pitch: 35.0_f32.atan2(50.0),
            distance: (35.0_f32 * 35.0 + 50.0 * 50.0).sqrt(),
            fov_y: 60.0_f32.to_radians(),
        }
    }

    fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(
            self.distance * cos_pitch * sin_yaw,
            self.distance * sin_pitch,
            self.distance * cos_pitch * cos_yaw,
        )
    }

    fn view_proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, 0.1, 1000.0)
            * Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    fn focal_length(&self) -> f32 {
        1.0 / (self.fov_y / 2.0).tan()
    }
}

struct AppState {
    sim: Simulation,
    camera: OrbitCamera,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
}

impl AppState {
    fn new(sim: Simulation, window: &Window) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            Some(window.scale_factor() as f32),
            None,
        );
        AppState {
            sim,
            camera: OrbitCamera::new(),
            egui_ctx,
            egui_state,
        }
    }

    fn upload_field(&self, graphics: &mut Graphics) {
        graphics.upload_stars(self.sim.positions(), self.sim.colors(), self.sim.sizes());
        graphics.upload_background(self.sim.background());
    }

    fn toggle(&mut self, window: &Window) {
        let mode = self.sim.toggle_mode();
        window.set_title(&window_title(mode));
    }

    /// Advances one frame and draws it, chart overlay included.
    fn redraw(&mut self, graphics: &mut Graphics, window: &Window) -> Result<(), wgpu::SurfaceError> {
        self.sim.advance_frame();
        graphics.update_positions(self.sim.positions());

        let size = graphics.size;
        let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
        graphics.update_camera(self.camera.view_proj(aspect), self.camera.focal_length());

        // The chart is re-laid out from the window size every frame.
        let chart_input = self.sim.chart_input();
        let egui_input = self.egui_state.take_egui_input(window);
        let egui_output = self.egui_ctx.run(egui_input, |ctx| {
            paint_overlay(ctx, &chart_input, CHART_MARGIN);
        });
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);
        let paint_jobs = self
            .egui_ctx
            .tessellate(egui_output.shapes, egui_output.pixels_per_point);

        graphics.render(&paint_jobs, &egui_output.textures_delta, egui_output.pixels_per_point)
    }
}

fn window_title(mode: RotationMode) -> String {
    match mode {
        RotationMode::Observed => "Galaxy Rotation - observed (the mystery)".to_string(),
        RotationMode::Expected => "Galaxy Rotation - expected (Newton predicts)".to_string(),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = GalaxyConfig::load(args.config.as_deref(), args.seed)?;
    match &args.config {
        Some(path) => log::info!("Loaded galaxy config from {}", path.display()),
        None => log::info!("Using default galaxy config"),
    }
    let sim = Simulation::new(config)?;

    log::info!("Galaxy Rotation Curve Visualizer");
    log::info!("Keys: T/Space toggle curve, R regenerate, arrows orbit, +/- zoom, Esc quit");

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(window_title(sim.mode()))
            .with_inner_size(winit::dpi::LogicalSize::new(1200.0, 800.0))
            .build(&event_loop)?,
    );

    let mut graphics = pollster::block_on(Graphics::new(window.clone()))?;
    let mut app_state = AppState::new(sim, &window);
    app_state.upload_field(&mut graphics);

    let mut last_render = std::time::Instant::now();

    event_loop.run(move |event, target| match event {
        Event::WindowEvent {
            ref event,
            window_id,
        } if window_id == window.id() => {
            // The overlay has no widgets; egui only needs size and scale updates.
            let _ = app_state.egui_state.on_window_event(&window, event);
            match event {
                WindowEvent::CloseRequested => target.exit(),
                WindowEvent::Resized(physical_size) => graphics.resize(*physical_size),
                WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                    match event.logical_key.as_ref() {
                        Key::Character(c) => match c.to_lowercase().as_str() {
                            "t" => app_state.toggle(&window),
                            "r" => {
                                app_state.sim.regenerate(rand::random());
                                app_state.upload_field(&mut graphics);
                            }
                            "+" | "=" => {
                                app_state.camera.distance = (app_state.camera.distance * 0.9).max(5.0);
                            }
                            "-" => {
                                app_state.camera.distance = (app_state.camera.distance * 1.1).min(300.0);
                            }
                            _ => {}
                        },
                        Key::Named(named_key) => match named_key {
                            NamedKey::Space => app_state.toggle(&window),
                            NamedKey::Escape => target.exit(),
                            NamedKey::ArrowLeft => app_state.camera.yaw -= 0.05,
                            NamedKey::ArrowRight => app_state.camera.yaw += 0.05,
                            NamedKey::ArrowUp => {
                                app_state.camera.pitch = (app_state.camera.pitch + 0.05).min(1.5);
                            }
                            NamedKey::ArrowDown => {
                                app_state.camera.pitch = (app_state.camera.pitch - 0.05).max(-1.5);
                            }
                            _ => {}
                        },
                        _ => {}
                    }
                }
                WindowEvent::RedrawRequested => match app_state.redraw(&mut graphics, &window) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost) => graphics.resize(graphics.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("GPU out of memory, exiting");
                        target.exit();
                    }
                    Err(e) => log::error!("Render error: {:?}", e),
                },
                _ => {}
            }
        }
        Event::AboutToWait => {
            let now = std::time::Instant::now();
            if now.duration_since(last_render).as_millis() > 16 {
                // 60 FPS
                window.request_redraw();
                last_render = now;
            }
        }
        _ => {}
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_starts_above_disk() {
        let eye = OrbitCamera::new().eye();
        assert_relative_eq!(eye.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(eye.y, 35.0, epsilon = 1e-3);
        assert_relative_eq!(eye.z, 50.0, epsilon = 1e-3);
    }

    #[test]
    fn test_focal_length() {
        assert_relative_eq!(OrbitCamera::new().focal_length(), 3.0_f32.sqrt(), epsilon = 1e-5);
    }
}
