mod atlas;
mod context;

use anyhow::Result;
use clap::Parser;
use glam::Vec3;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use tilelight_common::RenderConfig;
use tilelight_render::demo::DemoScene;
use tilelight_render::{FrameController, RenderError};
use context::GpuContext;
use tilelight_render_wgpu::WgpuBackend;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

#[derive(Parser)]
#[command(name = "tilelight-desktop", about = "Tilelight demo viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON render configuration (defaults apply to missing fields)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Application state.
struct AppState {
    scene: DemoScene,
    frames: FrameController,
    /// Negated point of interest; see `tilelight_render::within_camera_range`.
    camera: Vec3,
    speed: f32,
    keys_held: HashSet<KeyCode>,
    started: Instant,
    last_frame: Instant,
}

impl AppState {
    fn new(config: RenderConfig) -> Result<Self> {
        let scene = DemoScene::new();
        let mut frames = FrameController::new(config)?;
        let level_verts = frames.build_level(|level| scene.build_level(level))?;
        tracing::info!(level_verts, "demo level built");

        Ok(Self {
            camera: scene.start_camera(),
            scene,
            frames,
            speed: 40.0,
            keys_held: HashSet::new(),
            started: Instant::now(),
            last_frame: Instant::now(),
        })
    }

    fn update(&mut self, dt: f32) {
        let step = self.speed * dt;
        // Moving the view towards +x means shifting the camera vector to -x.
        if self.keys_held.contains(&KeyCode::KeyW) {
            self.camera.z += step;
        }
        if self.keys_held.contains(&KeyCode::KeyS) {
            self.camera.z -= step;
        }
        if self.keys_held.contains(&KeyCode::KeyA) {
            self.camera.x += step;
        }
        if self.keys_held.contains(&KeyCode::KeyD) {
            self.camera.x -= step;
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
        }
        if pressed && key == KeyCode::KeyR {
            self.camera = self.scene.start_camera();
            tracing::info!("camera reset");
        }
    }

    /// Build this frame's dynamic content. On overflow the frame is
    /// abandoned and nothing is drawn.
    fn build_frame(&mut self) -> Result<bool, RenderError> {
        self.frames.begin_frame(self.camera)?;
        let t = self.started.elapsed().as_secs_f32();
        match self.scene.emit_frame(&mut self.frames, t) {
            Ok(_) => Ok(true),
            Err(err @ RenderError::CapacityExceeded { .. }) => {
                tracing::warn!("dropping frame: {err}");
                self.frames.abandon_frame();
                Ok(false)
            }
            Err(err) => {
                self.frames.abandon_frame();
                Err(err)
            }
        }
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<GpuContext>,
    backend: Option<WgpuBackend>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            backend: None,
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
        self.state.last_frame = now;
        self.state.update(dt);

        let (Some(gpu), Some(backend)) = (&self.gpu, &self.backend) else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.reconfigure();
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        match self.state.build_frame() {
            Ok(true) => {
                let mut target = backend.target(&gpu.device, &gpu.queue, &view);
                if let Err(e) = self.state.frames.end_frame(&mut target) {
                    tracing::error!("frame submission failed: {e}");
                }
            }
            Ok(false) => {}
            Err(e) => tracing::error!("frame build failed: {e}"),
        }

        output.present();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let gpu = match GpuContext::new(event_loop, "tilelight", PhysicalSize::new(1280, 720)) {
            Ok(gpu) => gpu,
            Err(e) => {
                tracing::error!("GPU setup failed: {e:#}");
                event_loop.exit();
                return;
            }
        };

        let mut backend = WgpuBackend::new(
            &gpu.device,
            &gpu.queue,
            gpu.config.format,
            gpu.config.width,
            gpu.config.height,
            self.state.frames.config(),
        );
        match atlas::demo_atlas(self.state.frames.atlas()) {
            Ok(image) => backend.bind_atlas(&gpu.device, &gpu.queue, &image),
            Err(e) => tracing::error!("demo atlas unavailable: {e}"),
        }

        tracing::info!("GPU initialized with {} backend", gpu.backend_name);
        self.gpu = Some(gpu);
        self.backend = Some(backend);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                    if let Some(backend) = &mut self.backend {
                        backend.resize(&gpu.device, gpu.config.width, gpu.config.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape {
                    event_loop.exit();
                    return;
                }
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(gpu) = &self.gpu {
                    gpu.window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("tilelight-desktop starting");

    let config = match &cli.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    let state = AppState::new(config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
