/// Depth buffer and one framebuffer per swapchain image
///
/// Everything here depends on the swapchain extent, so the whole set is
/// dropped and rebuilt together when the swapchain is recreated.

use meshlet_engine::meshlet3d::{Result, Error};
use meshlet_engine::{engine_error, engine_err};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Device-local depth image and its view
pub struct DepthImage {
    ctx: Arc<GpuContext>,
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
}

impl DepthImage {
    pub fn new(ctx: &Arc<GpuContext>, format: vk::Format, extent: vk::Extent2D) -> Result<Self> {
        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D { width: extent.width, height: extent.height, depth: 1 })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device.create_image(&image_create_info, None)
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to create depth image: {:?}", e))?;

            let mut depth = Self {
                ctx: Arc::clone(ctx),
                image,
                view: vk::ImageView::null(),
                allocation: None,
            };

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = ctx.allocator.lock()
                .map_err(|_| engine_err!("meshlet3d::vulkan", "GPU allocator lock poisoned"))?
                .allocate(&AllocationCreateDesc {
                    name: "depth_image",
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("meshlet3d::vulkan", "Out of GPU memory for depth image ({:.2} MB)", size_mb);
                    Error::OutOfMemory
                })?;

            ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to bind depth image memory: {:?}", e))?;
            depth.allocation = Some(allocation);

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::DEPTH,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            depth.view = ctx.device.create_image_view(&view_create_info, None)
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to create depth image view: {:?}", e))?;

            Ok(depth)
        }
    }

    pub fn view(&self) -> vk::ImageView {
        self.view
    }
}

impl Drop for DepthImage {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.view, None);
            }
            self.ctx.device.destroy_image(self.image, None);
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
        }
    }
}

/// Depth image plus `[swapchain view, depth view]` framebuffers
pub struct FrameTargets {
    ctx: Arc<GpuContext>,
    framebuffers: Vec<vk::Framebuffer>,
    extent: vk::Extent2D,
    // Framebuffers reference the depth view, so they go first
    depth: DepthImage,
}

impl FrameTargets {
    pub fn new(
        ctx: &Arc<GpuContext>,
        render_pass: vk::RenderPass,
        swapchain_views: &[vk::ImageView],
        depth_format: vk::Format,
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let depth = DepthImage::new(ctx, depth_format, extent)?;

        let mut targets = Self {
            ctx: Arc::clone(ctx),
            framebuffers: Vec::with_capacity(swapchain_views.len()),
            extent,
            depth,
        };
        targets.create_framebuffers(render_pass, swapchain_views)?;

        Ok(targets)
    }

    fn create_framebuffers(&mut self, render_pass: vk::RenderPass, swapchain_views: &[vk::ImageView]) -> Result<()> {
        for &view in swapchain_views {
            let attachments = [view, self.depth.view()];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass)
                .attachments(&attachments)
                .width(self.extent.width)
                .height(self.extent.height)
                .layers(1);

            let framebuffer = unsafe { self.ctx.device.create_framebuffer(&create_info, None) }
                .map_err(|e| {
                    engine_error!("meshlet3d::vulkan", "Failed to create framebuffer: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create framebuffer: {:?}", e))
                })?;
            self.framebuffers.push(framebuffer);
        }
        Ok(())
    }

    /// Release the framebuffers before the swapchain views they reference.
    /// The device must be idle.
    pub fn destroy_framebuffers(&mut self) {
        unsafe {
            for framebuffer in self.framebuffers.drain(..) {
                self.ctx.device.destroy_framebuffer(framebuffer, None);
            }
        }
    }

    /// Recreate the framebuffers for a new swapchain, and the depth image
    /// when the extent changed. The device must be idle.
    pub fn rebuild(
        &mut self,
        render_pass: vk::RenderPass,
        swapchain_views: &[vk::ImageView],
        depth_format: vk::Format,
        extent: vk::Extent2D,
    ) -> Result<()> {
        self.destroy_framebuffers();
        if extent != self.extent {
            self.depth = DepthImage::new(&self.ctx, depth_format, extent)?;
            self.extent = extent;
        }
        self.create_framebuffers(render_pass, swapchain_views)
    }

    pub fn framebuffer(&self, image_index: u32) -> vk::Framebuffer {
        self.framebuffers[image_index as usize]
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for FrameTargets {
    fn drop(&mut self) {
        self.destroy_framebuffers();
    }
}
