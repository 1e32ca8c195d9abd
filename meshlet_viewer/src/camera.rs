/// Keyboard-driven editor camera module

use meshlet_engine::glam::Vec3;
use meshlet_engine::meshlet3d::app::{Module, UpdateStatus};
use meshlet_engine::meshlet3d::camera::EditorCamera;
use meshlet_engine::meshlet3d::Result;
use meshlet_engine::engine_debug;
use std::cell::RefCell;
use std::rc::Rc;
use winit::keyboard::KeyCode;

use crate::input::Input;

/// Units per second
pub const CAMERA_SPEED: f32 = 500.0;
pub const FAST_MULTIPLIER: f32 = 3.0;

/// World-space translation for this frame.
///
/// Arrows pan along the world X and Y axes, WASD move along the camera's
/// right and forward vectors, Shift triples the speed.
pub fn camera_translation(input: &Input, camera: &EditorCamera, dt: f32) -> Vec3 {
    let held = |key| input.key(key).is_held();

    let mut speed = CAMERA_SPEED * dt;
    if held(KeyCode::ShiftLeft) || held(KeyCode::ShiftRight) {
        speed *= FAST_MULTIPLIER;
    }

    let mut direction = Vec3::ZERO;
    if held(KeyCode::ArrowLeft) {
        direction += Vec3::X;
    }
    if held(KeyCode::ArrowRight) {
        direction -= Vec3::X;
    }
    if held(KeyCode::ArrowUp) {
        direction += Vec3::Y;
    }
    if held(KeyCode::ArrowDown) {
        direction -= Vec3::Y;
    }
    if held(KeyCode::KeyD) {
        direction += camera.right();
    }
    if held(KeyCode::KeyA) {
        direction -= camera.right();
    }
    if held(KeyCode::KeyW) {
        direction += camera.forward();
    }
    if held(KeyCode::KeyS) {
        direction -= camera.forward();
    }

    direction * speed
}

pub struct CameraModule {
    input: Rc<RefCell<Input>>,
    camera: Rc<RefCell<EditorCamera>>,
    window_size: (u32, u32),
}

impl CameraModule {
    pub fn new(input: Rc<RefCell<Input>>, camera: Rc<RefCell<EditorCamera>>, window_size: (u32, u32)) -> Self {
        Self { input, camera, window_size }
    }
}

impl Module for CameraModule {
    fn name(&self) -> &str {
        "EditorCamera"
    }

    fn init(&mut self) -> Result<()> {
        let (width, height) = self.window_size;
        let mut camera = self.camera.borrow_mut();
        camera.look_at(EditorCamera::DEFAULT_POSITION, Vec3::ZERO);
        camera.set_aspect_ratio(width, height);
        engine_debug!("meshlet3d::Camera", "Camera at {:?}, aspect {:.3}", camera.position(), camera.aspect_ratio());
        Ok(())
    }

    fn pre_update(&mut self, dt: f32) -> UpdateStatus {
        let input = self.input.borrow();
        let mut camera = self.camera.borrow_mut();

        let delta = camera_translation(&input, &camera, dt);
        if delta != Vec3::ZERO {
            camera.translate(delta);
        }
        UpdateStatus::Continue
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
