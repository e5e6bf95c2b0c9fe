//! Application shell: window creation and the winit event loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use log::{error, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::gfx::camera::{Camera, CameraController};
use crate::gfx::rendering::RenderEngine;
use crate::gfx::scene::Model;

const WINDOW_TITLE: &str = "orbview";
const WINDOW_WIDTH: u32 = 800;
const WINDOW_HEIGHT: u32 = 600;

pub struct ViewerApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    model: Option<Model>,
    camera: Camera,
    controller: CameraController,
    shader_dir: PathBuf,
    last_frame: Instant,
    delta_time: f32,
}

impl ViewerApp {
    pub fn new() -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                model: None,
                camera: Camera::new(),
                controller: CameraController::new(0.1, 2.5),
                shader_dir: PathBuf::from("shader"),
                last_frame: Instant::now(),
                delta_time: 0.0,
            },
        })
    }

    /// Loads the model to display; GPU upload happens once the window
    /// and device exist.
    pub fn load_model(&mut self, path: &Path) -> anyhow::Result<()> {
        let model = Model::load(path)
            .with_context(|| format!("failed to load model {}", path.display()))?;
        self.app_state.model = Some(model);
        Ok(())
    }

    /// Consumes self and runs the event loop until exit.
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self.app_state)
            .context("event loop terminated with an error")
    }
}

impl AppState {
    fn handle_key(&mut self, event: KeyEvent, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(key_code) = event.physical_key else {
            return;
        };
        if !event.state.is_pressed() {
            return;
        }

        match key_code {
            KeyCode::Escape | KeyCode::KeyQ => event_loop.exit(),
            key => self
                .controller
                .process_key(key, self.delta_time, &mut self.camera),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                error!("failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let (width, height) = window.inner_size().into();
        let shader_dir = self.shader_dir.clone();
        let engine = pollster::block_on(RenderEngine::new(window, width, height, &shader_dir));
        let mut engine = match engine {
            Ok(engine) => engine,
            Err(err) => {
                error!("failed to initialize renderer: {:#}", err);
                event_loop.exit();
                return;
            }
        };

        if let Some(model) = self.model.as_mut() {
            model.setup_gpu(&engine.device, &engine.queue, engine.material_layout());
        }
        engine.update(&self.camera);
        self.render_engine = Some(engine);
        self.last_frame = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event, event_loop),
            WindowEvent::MouseInput { button, state, .. } => {
                self.controller.process_mouse_button(button, state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.controller.process_cursor_moved(position, &mut self.camera);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.controller.process_scroll(delta, &mut self.camera);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(engine) = self.render_engine.as_mut() {
                    engine.resize(width, height);
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
                self.last_frame = now;

                if let Some(engine) = self.render_engine.as_mut() {
                    engine.update(&self.camera);
                    if let Err(err) = engine.render_frame(self.model.as_ref()) {
                        warn!("dropped a frame: {}", err);
                    }
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
