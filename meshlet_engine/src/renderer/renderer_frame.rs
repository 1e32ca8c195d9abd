/// Per-frame camera snapshot and frame outcome

use glam::{Mat4, Vec3};
use crate::camera::{EditorCamera, Frustum};

/// Camera state the renderer reads for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub view_projection: Mat4,
    pub camera_position: Vec3,
    pub frustum: Frustum,
}

impl FrameView {
    /// Build a view whose frustum is extracted from `view_projection`
    pub fn new(view_projection: Mat4, camera_position: Vec3) -> Self {
        Self {
            view_projection,
            camera_position,
            frustum: Frustum::from_view_projection(&view_projection),
        }
    }

    pub fn from_camera(camera: &EditorCamera) -> Self {
        Self {
            view_projection: camera.view_projection(),
            camera_position: camera.position(),
            frustum: camera.frustum(),
        }
    }
}

/// Outcome of one `render_frame` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Work was submitted and the image presented
    Presented,
    /// Nothing was submitted (zero-sized surface)
    Skipped,
    /// The swapchain was out of date and has been rebuilt; nothing was submitted.
    /// The camera should adopt the new aspect ratio.
    SwapchainRecreated { width: u32, height: u32 },
}

impl FrameStatus {
    pub fn was_presented(&self) -> bool {
        matches!(self, FrameStatus::Presented)
    }
}
