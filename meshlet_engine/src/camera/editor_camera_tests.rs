use glam::{Vec3, Vec4};
use super::*;

const EPSILON: f32 = 1e-4;

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_default_camera_looks_at_origin() {
    let camera = EditorCamera::new(1.0);
    assert_eq!(camera.position(), Vec3::new(200.0, 200.0, 200.0));
    let expected = (-camera.position()).normalize();
    assert!((camera.forward() - expected).length() < EPSILON);
    assert!(!camera.frustum().is_box_outside(&[Vec3::ZERO; 8]));
}

#[test]
fn test_basis_is_orthonormal() {
    let camera = EditorCamera::new(16.0 / 9.0);
    assert!(camera.forward().dot(camera.up()).abs() < EPSILON);
    assert!(camera.forward().dot(camera.right()).abs() < EPSILON);
    assert!(camera.up().dot(camera.right()).abs() < EPSILON);
    assert!((camera.up().length() - 1.0).abs() < EPSILON);
    // Up keeps a positive world-Y component
    assert!(camera.up().y > 0.0);
}

// ============================================================================
// Projection
// ============================================================================

#[test]
fn test_projection_flips_y() {
    let mut camera = EditorCamera::new(1.0);
    camera.look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);

    // A point above the view axis lands at negative clip-space Y
    let clip = camera.view_projection() * Vec4::new(0.0, 1.0, 0.0, 1.0);
    assert!(clip.y / clip.w < 0.0);
}

#[test]
fn test_depth_range_zero_to_one() {
    let mut camera = EditorCamera::new(1.0);
    camera.look_at(Vec3::ZERO, Vec3::NEG_Z);

    let near = camera.view_projection() * Vec4::new(0.0, 0.0, -EditorCamera::DEFAULT_NEAR, 1.0);
    let far = camera.view_projection() * Vec4::new(0.0, 0.0, -EditorCamera::DEFAULT_FAR, 1.0);
    assert!((near.z / near.w).abs() < EPSILON);
    assert!((far.z / far.w - 1.0).abs() < EPSILON);
}

#[test]
fn test_set_aspect_ratio() {
    let mut camera = EditorCamera::new(1.0);
    camera.set_aspect_ratio(1280, 720);
    assert!((camera.aspect_ratio() - 1280.0 / 720.0).abs() < EPSILON);

    // Minimized window: ratio unchanged
    camera.set_aspect_ratio(0, 720);
    assert!((camera.aspect_ratio() - 1280.0 / 720.0).abs() < EPSILON);
}

// ============================================================================
// Movement
// ============================================================================

#[test]
fn test_translate_keeps_orientation() {
    let mut camera = EditorCamera::new(1.0);
    let forward = camera.forward();
    camera.translate(camera.forward() * 10.0);

    assert!((camera.forward() - forward).length() < EPSILON);
    let expected = EditorCamera::DEFAULT_POSITION + forward * 10.0;
    assert!((camera.position() - expected).length() < EPSILON);
    // View matrix maps the camera position to the origin
    assert!(camera.view().transform_point3(camera.position()).length() < 1e-2);
}

#[test]
fn test_look_straight_down_is_stable() {
    let mut camera = EditorCamera::new(1.0);
    camera.look_at(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO);
    assert!(camera.up().is_finite());
    assert!(camera.right().is_finite());
    assert!(!camera.frustum().is_box_outside(&[Vec3::ZERO; 8]));
}
