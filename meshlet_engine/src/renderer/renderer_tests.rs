//! Unit tests for renderer.rs, renderer_frame.rs and renderer_debug.rs

use crate::renderer::{
    RendererConfig, RendererStats, DebugSeverity, DebugOutput, DebugMessageFilter,
    ValidationStats, FrameView, FrameStatus,
};
use crate::camera::EditorCamera;
use glam::{Mat4, Vec3};

// ============================================================================
// CONFIG TESTS
// ============================================================================

#[test]
fn test_config_defaults() {
    let config = RendererConfig::default();

    assert_eq!(config.enable_validation, cfg!(debug_assertions));
    assert_eq!(config.instance_count, 100_000);
    assert_eq!(config.placement_extent, 6000.0);
    assert_eq!(config.shader_dir.to_str(), Some("shaders"));
    assert_eq!(config.app_version, (1, 0, 0));
    assert_eq!(config.debug_output, DebugOutput::Console);
    assert_eq!(config.debug_severity, DebugSeverity::ErrorsAndWarnings);
    assert!(!config.break_on_validation_error);
    assert!(!config.panic_on_error);
}

#[test]
fn test_config_clone_is_independent() {
    let mut a = RendererConfig::default();
    let b = a.clone();
    a.instance_count = 10;
    assert_eq!(b.instance_count, RendererConfig::DEFAULT_INSTANCE_COUNT);
}

#[test]
fn test_stats_default_is_zero() {
    let stats = RendererStats::default();
    assert_eq!(stats.frames_presented, 0);
    assert_eq!(stats.swapchain_recreations, 0);
}

// ============================================================================
// DEBUG TYPES TESTS
// ============================================================================

#[test]
fn test_message_filter_default_shows_everything() {
    let filter = DebugMessageFilter::default();
    assert!(filter.show_general && filter.show_validation && filter.show_performance);
}

#[test]
fn test_validation_stats_total() {
    let stats = ValidationStats { errors: 1, warnings: 2, info: 3, verbose: 4 };
    assert_eq!(stats.total(), 10);
    assert!(stats.has_errors());
    assert!(!ValidationStats::default().has_errors());
}

// ============================================================================
// FRAME VIEW TESTS
// ============================================================================

#[test]
fn test_frame_view_from_camera() {
    let camera = EditorCamera::new(1.0);
    let view = FrameView::from_camera(&camera);

    assert_eq!(view.camera_position, EditorCamera::DEFAULT_POSITION);
    assert_eq!(view.view_projection, camera.view_projection());
    assert_eq!(view.frustum, camera.frustum());
}

#[test]
fn test_frame_view_new_extracts_frustum() {
    let vp = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0);
    let view = FrameView::new(vp, Vec3::ZERO);

    assert!(!view.frustum.is_box_outside(&[Vec3::new(0.0, 0.0, -10.0); 8]));
    assert!(view.frustum.is_box_outside(&[Vec3::new(0.0, 0.0, 10.0); 8]));
}

#[test]
fn test_frame_status_presented() {
    assert!(FrameStatus::Presented.was_presented());
    assert!(!FrameStatus::Skipped.was_presented());
    assert!(!FrameStatus::SwapchainRecreated { width: 1, height: 1 }.was_presented());
}
