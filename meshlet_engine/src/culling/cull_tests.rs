//! Unit tests for cull.rs

use crate::culling::{cull_instances, task_group_count};
use crate::camera::Frustum;
use crate::mesh::Aabb;
use crate::renderer::{BoxCorners, DrawMeshTasksCommand};
use glam::{Mat4, Vec3};

// ============================================================================
// Helpers
// ============================================================================

/// Camera at the origin looking down -Z, Vulkan depth range
fn frustum() -> Frustum {
    let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 1000.0);
    let view = Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
    Frustum::from_view_projection(&(proj * view))
}

fn unit_box() -> BoxCorners {
    Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)).points_homogeneous()
}

// ============================================================================
// TASK GROUP COUNT
// ============================================================================

#[test]
fn test_task_group_count_rounds_up() {
    assert_eq!(task_group_count(0, 32), 0);
    assert_eq!(task_group_count(1, 32), 1);
    assert_eq!(task_group_count(32, 32), 1);
    assert_eq!(task_group_count(33, 32), 2);
    assert_eq!(task_group_count(100, 32), 4);
}

#[test]
fn test_task_group_count_zero_workgroup() {
    assert_eq!(task_group_count(10, 0), 0);
}

// ============================================================================
// CULLING
// ============================================================================

#[test]
fn test_instance_in_front_is_visible() {
    let transforms = [Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0))];
    let output = cull_instances(&frustum(), &[unit_box()], &transforms, &[100], 32);

    assert_eq!(output.visible_count, 1);
    assert_eq!(output.visible_ids, vec![0]);
    assert_eq!(output.commands, vec![DrawMeshTasksCommand::new(4)]);
}

#[test]
fn test_instance_behind_is_culled() {
    let transforms = [Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0))];
    let output = cull_instances(&frustum(), &[unit_box()], &transforms, &[100], 32);

    assert_eq!(output.visible_count, 0);
    assert!(output.visible_ids.is_empty());
    assert!(output.commands.is_empty());
}

#[test]
fn test_instance_beyond_far_plane_is_culled() {
    let transforms = [Mat4::from_translation(Vec3::new(0.0, 0.0, -2000.0))];
    let output = cull_instances(&frustum(), &[unit_box()], &transforms, &[1], 32);
    assert_eq!(output.visible_count, 0);
}

#[test]
fn test_box_straddling_plane_is_kept() {
    // Center just behind the near plane, box reaches in front of it
    let transforms = [Mat4::from_translation(Vec3::new(0.0, 0.0, 0.5))];
    let output = cull_instances(&frustum(), &[unit_box()], &transforms, &[1], 32);
    assert_eq!(output.visible_count, 1);
}

#[test]
fn test_output_is_compacted_in_instance_order() {
    let transforms = [
        Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)),   // behind
        Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)),  // visible
        Mat4::from_translation(Vec3::new(500.0, 0.0, -10.0)), // far right
        Mat4::from_translation(Vec3::new(1.0, 1.0, -50.0)),  // visible
    ];
    let corners = [unit_box(); 4];
    let counts = [64, 64, 64, 64];
    let output = cull_instances(&frustum(), &corners, &transforms, &counts, 32);

    assert_eq!(output.visible_ids, vec![1, 3]);
    assert_eq!(output.visible_count as usize, output.visible_ids.len());
    assert_eq!(output.commands.len(), output.visible_ids.len());
    assert!(output.commands.iter().all(|c| c.group_count_x == 2));
}

#[test]
fn test_rotation_is_applied_to_corners() {
    // Unit box spun 90° around Y then pushed forward: still visible
    let transforms = [
        Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0))
            * Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2),
    ];
    let output = cull_instances(&frustum(), &[unit_box()], &transforms, &[1], 32);
    assert_eq!(output.visible_count, 1);
}

#[test]
fn test_shortest_input_bounds_the_pass() {
    let transforms = [Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)); 3];
    let output = cull_instances(&frustum(), &[unit_box(); 2], &transforms, &[1, 1, 1], 32);
    assert_eq!(output.visible_count, 2);
}
