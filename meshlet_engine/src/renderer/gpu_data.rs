/// GPU-visible data layouts
///
/// CPU mirrors of the uniform and storage blocks the shaders declare.
/// Every type is `#[repr(C)]` + `Pod` so it can be copied into a mapped
/// buffer with `bytemuck::bytes_of` / `cast_slice`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use crate::camera::Frustum;
use crate::mesh::MeshletBounds;

/// Camera block (binding 4 of the graphics set): std140, 80 bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_projection: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub _pad: f32,
}

impl CameraUniform {
    pub fn new(view_projection: &Mat4, camera_position: Vec3) -> Self {
        Self {
            view_projection: view_projection.to_cols_array_2d(),
            camera_position: camera_position.to_array(),
            _pad: 0.0,
        }
    }
}

/// Frustum block (binding 0 of the compute set): std140, 112 bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrustumUniform {
    pub planes: [[f32; 4]; 6],
    pub instance_count: u32,
    pub _pad: [u32; 3],
}

impl FrustumUniform {
    pub fn new(frustum: &Frustum, instance_count: u32) -> Self {
        Self {
            planes: frustum.to_array(),
            instance_count,
            _pad: [0; 3],
        }
    }
}

/// Per-meshlet cone, read by the task shader (binding 7 of the graphics set)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshletCullInfo {
    pub cone_apex: [f32; 3],
    pub cone_cutoff: f32,
    pub cone_axis: [f32; 3],
    pub _pad: f32,
}

impl From<&MeshletBounds> for MeshletCullInfo {
    fn from(bounds: &MeshletBounds) -> Self {
        Self {
            cone_apex: bounds.cone_apex.to_array(),
            cone_cutoff: bounds.cone_cutoff,
            cone_axis: bounds.cone_axis.to_array(),
            _pad: 0.0,
        }
    }
}

/// Same layout as `VkDrawMeshTasksIndirectCommandEXT`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct DrawMeshTasksCommand {
    pub group_count_x: u32,
    pub group_count_y: u32,
    pub group_count_z: u32,
}

impl DrawMeshTasksCommand {
    pub fn new(group_count_x: u32) -> Self {
        Self { group_count_x, group_count_y: 1, group_count_z: 1 }
    }
}

/// Corners of one instance box as uploaded to the culling shader (w = 1)
pub type BoxCorners = [[f32; 4]; 8];

#[cfg(test)]
#[path = "gpu_data_tests.rs"]
mod tests;
