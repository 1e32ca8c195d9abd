//! Meshlet Viewer
//!
//! Draws a large field of instances of one glTF model with GPU frustum
//! culling and mesh shaders.
//!
//! The shaders are loaded as SPIR-V from `meshlet_viewer/shaders` (override
//! with `--shaders`). Compile them once with:
//!
//! ```text
//! glslc --target-env=vulkan1.3 shaders/task.task     -o shaders/task.spv
//! glslc --target-env=vulkan1.3 shaders/mesh.mesh     -o shaders/mesh.spv
//! glslc --target-env=vulkan1.3 shaders/fragment.frag -o shaders/fragment.spv
//! glslc --target-env=vulkan1.3 shaders/cull.comp     -o shaders/cull.spv
//! ```
//!
//! Controls: WASD move, arrows pan, Shift for speed, Escape quits.
//! `--help` lists the command-line options.

mod camera;
mod config;
mod input;
mod renderer;
mod visibility;
mod window;

use meshlet_engine::meshlet3d::app::{Application, UpdateStatus};
use meshlet_engine::meshlet3d::camera::EditorCamera;
use clap::Parser;
use meshlet_engine::{engine_error, engine_info};
use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::camera::CameraModule;
use crate::config::{Args, ViewerConfig};
use crate::input::{Input, InputModule};
use crate::renderer::RendererModule;
use crate::window::{WindowModule, WindowState};

struct Viewer {
    config: ViewerConfig,
    // Modules hold the window too; `app` is dropped first
    app: Option<Application>,
    window: Option<Rc<Window>>,
    window_state: Rc<RefCell<WindowState>>,
    input: Rc<RefCell<Input>>,
    last_frame: Instant,
    /// Set once the loop is over
    final_status: Option<UpdateStatus>,
}

impl Viewer {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            app: None,
            window: None,
            window_state: Rc::new(RefCell::new(WindowState::default())),
            input: Rc::new(RefCell::new(Input::new())),
            last_frame: Instant::now(),
            final_status: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> UpdateStatus {
        let attributes = Window::default_attributes()
            .with_title(self.config.title.as_str())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height))
            .with_resizable(self.config.resizable);

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Rc::new(window),
            Err(e) => {
                engine_error!("meshlet3d::Viewer", "Could not create window: {}", e);
                return UpdateStatus::Error;
            }
        };

        let size = window.inner_size();
        let size = (size.width, size.height);
        self.window_state = Rc::new(RefCell::new(WindowState::new(size)));
        let aspect = size.0.max(1) as f32 / size.1.max(1) as f32;
        let camera = Rc::new(RefCell::new(EditorCamera::new(aspect)));

        // PreUpdate order matters: input advances before the camera reads it
        let mut app = Application::new();
        app.add_module(Box::new(WindowModule::new(Rc::clone(&self.window_state), &self.config.title)));
        app.add_module(Box::new(InputModule::new(Rc::clone(&self.input))));
        app.add_module(Box::new(CameraModule::new(Rc::clone(&self.input), Rc::clone(&camera), size)));
        app.add_module(Box::new(RendererModule::new(
            Rc::clone(&window),
            Rc::clone(&self.window_state),
            camera,
            self.config.model_path.clone(),
            self.config.renderer.clone(),
            self.config.visibility_stats,
        )));

        self.window = Some(window);
        let status = match app.init() {
            Ok(()) => UpdateStatus::Continue,
            Err(_) => UpdateStatus::Error,
        };
        self.app = Some(app);
        self.last_frame = Instant::now();
        status
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(app) = self.app.as_mut() else {
            return;
        };

        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let status = app.update(dt);
        if status != UpdateStatus::Continue {
            self.finish(status, event_loop);
        }
    }

    /// End the loop. Modules are cleaned up unless the run ended in error;
    /// GPU objects are released by their owners either way.
    fn finish(&mut self, status: UpdateStatus, event_loop: &ActiveEventLoop) {
        if self.final_status.is_some() {
            return;
        }
        self.final_status = Some(status);

        if status == UpdateStatus::Error {
            engine_error!("meshlet3d::Viewer", "Application closing with errors");
        } else if let Some(app) = self.app.as_mut() {
            if let Err(e) = app.clean_up() {
                engine_error!("meshlet3d::Viewer", "Clean-up failed: {}", e);
            }
        }

        self.app = None;
        self.window = None;
        event_loop.exit();
    }

    fn exit_code(&self) -> ExitCode {
        match self.final_status {
            Some(UpdateStatus::Error) => ExitCode::FAILURE,
            _ => ExitCode::SUCCESS,
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.is_some() || self.final_status.is_some() {
            return;
        }
        let status = self.start(event_loop);
        if status != UpdateStatus::Continue {
            self.finish(status, event_loop);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.window_state.borrow_mut().request_close(),
            WindowEvent::Resized(size) => self.window_state.borrow_mut().resized(size.width, size.height),
            WindowEvent::Focused(false) => self.input.borrow_mut().focus_lost(),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.input.borrow_mut().key_event(key, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.borrow_mut().mouse_button_event(button, state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.borrow_mut().mouse_motion_event(delta.0 as f32, delta.1 as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        // The platform ended the loop without Stop or Error
        if self.app.is_some() {
            self.finish(UpdateStatus::Stop, event_loop);
        }
    }
}

fn main() -> ExitCode {
    let config = ViewerConfig::from(Args::parse());

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            engine_error!("meshlet3d::Viewer", "Could not create event loop: {}", e);
            return ExitCode::FAILURE;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    engine_info!("meshlet3d::Viewer",
        "{} instances of {}", config.renderer.instance_count, config.model_path.display());

    let mut viewer = Viewer::new(config);
    if let Err(e) = event_loop.run_app(&mut viewer) {
        engine_error!("meshlet3d::Viewer", "Event loop failed: {}", e);
        return ExitCode::FAILURE;
    }
    viewer.exit_code()
}
