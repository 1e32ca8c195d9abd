/*!
# Meshlet Engine - Vulkan Renderer Backend

Vulkan implementation of the meshlet engine's `Renderer` trait.

The backend drives a GPU-only visibility pipeline: a compute pass tests every
instance box against the frustum and writes compacted indirect arguments, then
a single `vkCmdDrawMeshTasksIndirectCountEXT` reads the surviving count from a
GPU buffer and feeds the task and mesh shaders.

Built on `ash` for the Vulkan bindings and `gpu-allocator` for memory.

# Example

```no_run
use meshlet_engine::meshlet3d::mesh::import_first_mesh;
use meshlet_engine::meshlet3d::render::{RendererConfig, Renderer, FrameView};
use meshlet_engine::meshlet3d::camera::EditorCamera;
use meshlet_engine_renderer_vulkan::VulkanRenderer;
# fn run(window: &winit::window::Window) -> meshlet_engine::meshlet3d::Result<()> {
let mut mesh = import_first_mesh("assets/Duck/Duck.gltf")?;
let size = window.inner_size();
let mut renderer = VulkanRenderer::new(window, (size.width, size.height), RendererConfig::default(), &mut mesh)?;

let camera = EditorCamera::new(size.width as f32 / size.height as f32);
renderer.render_frame(&FrameView::from_camera(&camera))?;
# Ok(())
# }
```
*/

mod debug;
mod vulkan;
mod vulkan_buffer;
mod vulkan_context;
mod vulkan_descriptor_set;
mod vulkan_device;
mod vulkan_device_selection;
mod vulkan_frame;
mod vulkan_frame_buffer;
mod vulkan_pipeline;
mod vulkan_render_pass;
mod vulkan_shader;
mod vulkan_swapchain;
mod vulkan_upload;

pub use vulkan::VulkanRenderer;
pub use vulkan_device_selection::{
    DeviceCandidate, QueueFamilyCandidate, MeshShaderLimits, SelectedDevice,
    select_device, find_memory_type,
    REQUIRED_DEVICE_EXTENSIONS, DEPTH_FORMAT_CANDIDATES,
};
pub use vulkan_swapchain::{choose_surface_format, choose_present_mode, choose_extent, choose_image_count};

// Re-export debug utilities
pub use debug::{get_validation_stats, print_validation_stats_report};
