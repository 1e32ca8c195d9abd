//! Integration tests for VulkanRenderer
//!
//! These tests need a GPU with VK_EXT_mesh_shader and the compiled shaders
//! (task.spv, mesh.spv, fragment.spv, cull.spv) next to their GLSL sources in
//! meshlet_viewer/shaders. All of them are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_renderer_tests -- --ignored

use meshlet_engine::glam::{Mat4, Vec3};
use meshlet_engine::meshlet3d::Error;
use meshlet_engine::meshlet3d::camera::EditorCamera;
use meshlet_engine::meshlet3d::mesh::{Mesh, Vertex};
use meshlet_engine::meshlet3d::render::{FrameStatus, FrameView, Renderer, RendererConfig};
use meshlet_engine_renderer_vulkan::VulkanRenderer;
use std::path::PathBuf;
use winit::event_loop::EventLoop;
use winit::window::Window;

/// Helper to create a hidden test window
#[allow(deprecated)]
fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("Vulkan Renderer Test")
        .with_inner_size(winit::dpi::PhysicalSize::new(320, 240))
        .with_visible(false);
    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}

fn shader_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../meshlet_viewer/shaders")
}

fn test_config(instance_count: u32) -> RendererConfig {
    RendererConfig {
        instance_count,
        placement_extent: 50.0,
        shader_dir: shader_dir(),
        enable_validation: false,
        enable_validation_stats: false,
        ..RendererConfig::default()
    }
}

/// Unit cube, 12 triangles
fn cube_mesh() -> Mesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let faces = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];

    for normal in faces {
        let u = if normal.x.abs() > 0.5 { Vec3::Y } else { Vec3::X };
        let v = normal.cross(u);
        let base = vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            vertices.push(Vertex::new(normal + u * su + v * sv, normal));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh::new(vertices, indices)
}

// ============================================================================
// INITIALIZATION TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_renderer_creation_moves_mesh() {
    let (window, _event_loop) = create_test_window();
    let mut mesh = cube_mesh();

    let renderer = VulkanRenderer::new(&window, (320, 240), test_config(16), &mut mesh).unwrap();
    let stats = renderer.stats();

    assert!(mesh.is_empty());
    assert_eq!(stats.instance_count, 16);
    assert!(stats.meshlet_count >= 1);
    assert_eq!(stats.frames_presented, 0);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_renderer_missing_shaders_fail_init() {
    let (window, _event_loop) = create_test_window();
    let mut mesh = cube_mesh();
    let config = RendererConfig {
        shader_dir: PathBuf::from("does/not/exist"),
        ..test_config(4)
    };

    let result = VulkanRenderer::new(&window, (320, 240), config, &mut mesh);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_renderer_empty_mesh_fails_init() {
    let (window, _event_loop) = create_test_window();
    let mut mesh = Mesh::default();

    let result = VulkanRenderer::new(&window, (320, 240), test_config(4), &mut mesh);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_renderer_zero_instances_fail_init() {
    let (window, _event_loop) = create_test_window();
    let mut mesh = cube_mesh();

    let result = VulkanRenderer::new(&window, (320, 240), test_config(0), &mut mesh);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

// ============================================================================
// FRAME LOOP TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_renderer_presents_frames() {
    let (window, _event_loop) = create_test_window();
    let mut mesh = cube_mesh();
    let mut renderer = VulkanRenderer::new(&window, (320, 240), test_config(64), &mut mesh).unwrap();
    let camera = EditorCamera::new(320.0 / 240.0);

    let mut presented = 0;
    for _ in 0..6 {
        if renderer.render_frame(&FrameView::from_camera(&camera)).unwrap().was_presented() {
            presented += 1;
        }
    }
    renderer.wait_idle().unwrap();

    assert_eq!(renderer.stats().frames_presented, presented);
    assert!(presented > 0);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_renderer_everything_culled_still_presents() {
    let (window, _event_loop) = create_test_window();
    let mut mesh = cube_mesh();
    let mut renderer = VulkanRenderer::new(&window, (320, 240), test_config(32), &mut mesh).unwrap();

    // Far away and looking away from every instance
    let view_projection = Mat4::perspective_rh(0.5, 1.0, 0.1, 10.0)
        * Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10_000.0), Vec3::new(0.0, 0.0, 20_000.0), Vec3::Y);
    let view = FrameView::new(view_projection, Vec3::new(0.0, 0.0, 10_000.0));

    for _ in 0..3 {
        renderer.render_frame(&view).unwrap();
    }
    renderer.wait_idle().unwrap();
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_renderer_resize_recreates_swapchain() {
    let (window, _event_loop) = create_test_window();
    let mut mesh = cube_mesh();
    let mut renderer = VulkanRenderer::new(&window, (320, 240), test_config(8), &mut mesh).unwrap();
    let camera = EditorCamera::new(320.0 / 240.0);

    renderer.render_frame(&FrameView::from_camera(&camera)).unwrap();
    let _ = window.request_inner_size(winit::dpi::PhysicalSize::new(400, 300));
    renderer.resize(400, 300);

    let status = renderer.render_frame(&FrameView::from_camera(&camera)).unwrap();
    assert!(matches!(status, FrameStatus::SwapchainRecreated { .. }));
    assert_eq!(renderer.stats().swapchain_recreations, 1);

    renderer.render_frame(&FrameView::from_camera(&camera)).unwrap();
    renderer.wait_idle().unwrap();
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_renderer_zero_size_skips_frame() {
    let (window, _event_loop) = create_test_window();
    let mut mesh = cube_mesh();
    let mut renderer = VulkanRenderer::new(&window, (320, 240), test_config(8), &mut mesh).unwrap();
    let camera = EditorCamera::new(320.0 / 240.0);

    renderer.resize(0, 0);
    let status = renderer.render_frame(&FrameView::from_camera(&camera)).unwrap();

    // Some surfaces report a fixed extent, in which case the swapchain is rebuilt instead
    assert!(matches!(status, FrameStatus::Skipped | FrameStatus::SwapchainRecreated { .. }));
    assert!(renderer.stats().frames_skipped >= 1);
}
