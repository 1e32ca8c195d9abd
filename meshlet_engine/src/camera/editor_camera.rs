/// Free-flying editor camera.
///
/// Keeps a position and orientation, builds a right-handed view matrix and a
/// Vulkan projection (depth 0..1, Y pointing down in clip space), and
/// derives the frustum planes from their product.

use glam::{Mat4, Vec3};
use super::Frustum;

#[derive(Debug, Clone)]
pub struct EditorCamera {
    position: Vec3,
    forward: Vec3,
    up: Vec3,
    fov_y: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
    view: Mat4,
    projection: Mat4,
}

impl EditorCamera {
    pub const DEFAULT_POSITION: Vec3 = Vec3::new(200.0, 200.0, 200.0);
    pub const DEFAULT_FOV_Y_DEGREES: f32 = 45.0;
    pub const DEFAULT_NEAR: f32 = 0.1;
    pub const DEFAULT_FAR: f32 = 10000.0;

    /// Camera at (200, 200, 200) looking at the origin, 45° vertical FOV
    pub fn new(aspect_ratio: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            fov_y: Self::DEFAULT_FOV_Y_DEGREES.to_radians(),
            aspect_ratio,
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.look_at(Self::DEFAULT_POSITION, Vec3::ZERO);
        camera.set_perspective(camera.fov_y, aspect_ratio, camera.near, camera.far);
        camera
    }

    // ===== PROJECTION =====

    /// Rebuild the projection. `fov_y` in radians.
    pub fn set_perspective(&mut self, fov_y: f32, aspect_ratio: f32, near: f32, far: f32) {
        self.fov_y = fov_y;
        self.aspect_ratio = aspect_ratio;
        self.near = near;
        self.far = far;

        let mut projection = Mat4::perspective_rh(fov_y, aspect_ratio, near, far);
        // Vulkan clip space has +Y pointing down
        projection.y_axis.y = -projection.y_axis.y;
        self.projection = projection;
    }

    /// Resize notification. Zero-sized windows keep the previous ratio.
    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.set_perspective(self.fov_y, width as f32 / height as f32, self.near, self.far);
    }

    // ===== ORIENTATION =====

    /// Place the camera at `position` facing `target` with world +Y up.
    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        let forward = (target - position).normalize_or_zero();
        if forward != Vec3::ZERO {
            self.forward = forward;
        }
        // Recompute up so the basis stays orthonormal
        let right = self.forward.cross(Vec3::Y).normalize_or_zero();
        self.up = if right == Vec3::ZERO { Vec3::Z } else { right.cross(self.forward) };
        self.update_view();
    }

    /// Move by `delta` in world space, keeping the orientation
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.update_view();
    }

    fn update_view(&mut self) {
        self.view = Mat4::look_to_rh(self.position, self.forward, self.up);
    }

    // ===== GETTERS =====

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up).normalize()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Combined view-projection matrix (projection * view)
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }
}

#[cfg(test)]
#[path = "editor_camera_tests.rs"]
mod tests;
