/// Window module: size tracking and close requests

use meshlet_engine::meshlet3d::app::{Module, UpdateStatus};
use meshlet_engine::meshlet3d::Result;
use meshlet_engine::engine_info;
use std::cell::RefCell;
use std::rc::Rc;

/// What the event loop learned about the window since the last frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowState {
    size: (u32, u32),
    pending_resize: Option<(u32, u32)>,
    close_requested: bool,
}

impl WindowState {
    pub fn new(size: (u32, u32)) -> Self {
        Self { size, pending_resize: None, close_requested: false }
    }

    /// Record a new inner size; repeated resizes within a frame collapse into the last one
    pub fn resized(&mut self, width: u32, height: u32) {
        if (width, height) != self.size {
            self.size = (width, height);
            self.pending_resize = Some((width, height));
        }
    }

    /// Take the resize that happened since the last call, if any
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.pending_resize.take()
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

pub struct WindowModule {
    state: Rc<RefCell<WindowState>>,
    title: String,
}

impl WindowModule {
    pub fn new(state: Rc<RefCell<WindowState>>, title: &str) -> Self {
        Self { state, title: title.to_string() }
    }
}

impl Module for WindowModule {
    fn name(&self) -> &str {
        "Window"
    }

    fn init(&mut self) -> Result<()> {
        let (width, height) = self.state.borrow().size();
        engine_info!("meshlet3d::Window", "'{}' {}x{}", self.title, width, height);
        Ok(())
    }

    fn pre_update(&mut self, _dt: f32) -> UpdateStatus {
        if self.state.borrow().close_requested() {
            UpdateStatus::Stop
        } else {
            UpdateStatus::Continue
        }
    }
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod tests;
