//! Camera module: frustum planes and the editor camera.
//!
//! The renderer never owns a camera. Each frame the caller hands it a
//! snapshot (view-projection, position, frustum) taken from whatever camera
//! it drives.

mod frustum;
mod editor_camera;

pub use frustum::Frustum;
pub use editor_camera::EditorCamera;
