/// Swapchain - presentation images of the window surface
///
/// Owns the `VkSwapchainKHR` and one view per image. Synchronization lives
/// in `vulkan_frame`; this type only acquires, presents and rebuilds.

use meshlet_engine::meshlet3d::{Result, Error};
use meshlet_engine::{engine_error, engine_info};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::{GpuContext, Surface};

// ============================================================================
// Surface choices
// ============================================================================

/// B8G8R8A8_SRGB with sRGB non-linear color space, else the first format
/// the surface reports. `None` when the list is empty.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
}

/// MAILBOX when available, FIFO otherwise (always supported)
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// The surface's current extent, or the window size clamped to the
/// supported range when the surface leaves it to the application
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, window_size: (u32, u32)) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: window_size.0.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: window_size.1.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One more than the minimum, limited by the maximum when there is one
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        image_count.min(capabilities.max_image_count)
    } else {
        image_count
    }
}

// ============================================================================
// Swapchain
// ============================================================================

/// Vulkan swapchain and its image views
pub struct Swapchain {
    ctx: Arc<GpuContext>,
    surface: Arc<Surface>,
    loader: ash::khr::swapchain::Device,

    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    surface_format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain sized for `window_size`
    pub fn new(ctx: Arc<GpuContext>, surface: Arc<Surface>, window_size: (u32, u32)) -> Result<Self> {
        let formats = surface.formats(ctx.physical_device)?;
        let surface_format = choose_surface_format(&formats)
            .ok_or_else(|| {
                engine_error!("meshlet3d::vulkan", "Surface reports no formats");
                Error::InitializationFailed("Surface reports no formats".to_string())
            })?;
        let present_mode = choose_present_mode(&surface.present_modes(ctx.physical_device)?);

        let loader = ash::khr::swapchain::Device::new(&ctx.instance.instance, &ctx.device);

        let mut swapchain = Self {
            ctx,
            surface,
            loader,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            surface_format,
            present_mode,
            extent: vk::Extent2D::default(),
        };
        swapchain.build(window_size)?;

        engine_info!("meshlet3d::vulkan",
            "Swapchain created: {}x{}, {} images, {:?}, {:?}",
            swapchain.extent.width, swapchain.extent.height, swapchain.images.len(),
            swapchain.surface_format.format, swapchain.present_mode);

        Ok(swapchain)
    }

    /// Rebuild for a new surface size. The device must be idle.
    pub fn recreate(&mut self, window_size: (u32, u32)) -> Result<()> {
        self.build(window_size)?;
        engine_info!("meshlet3d::vulkan", "Swapchain recreated: {}x{}",
            self.extent.width, self.extent.height);
        Ok(())
    }

    /// Create the swapchain, retiring the current one if any, and its views
    fn build(&mut self, window_size: (u32, u32)) -> Result<()> {
        let capabilities = self.surface.capabilities(self.ctx.physical_device)?;
        let extent = choose_extent(&capabilities, window_size);
        let image_count = choose_image_count(&capabilities);

        unsafe {
            self.destroy_image_views();

            let old_swapchain = self.swapchain;
            let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface.handle)
                .min_image_count(image_count)
                .image_format(self.surface_format.format)
                .image_color_space(self.surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(self.present_mode)
                .clipped(true)
                .old_swapchain(old_swapchain);

            let swapchain = self.loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(|e| {
                    engine_error!("meshlet3d::vulkan", "Failed to create swapchain: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
                })?;

            if old_swapchain != vk::SwapchainKHR::null() {
                self.loader.destroy_swapchain(old_swapchain, None);
            }
            self.swapchain = swapchain;
            self.extent = extent;

            self.images = self.loader
                .get_swapchain_images(swapchain)
                .map_err(|e| {
                    engine_error!("meshlet3d::vulkan", "Failed to get swapchain images: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
                })?;

            for &image in &self.images {
                let create_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(self.surface_format.format)
                    .components(vk::ComponentMapping {
                        r: vk::ComponentSwizzle::IDENTITY,
                        g: vk::ComponentSwizzle::IDENTITY,
                        b: vk::ComponentSwizzle::IDENTITY,
                        a: vk::ComponentSwizzle::IDENTITY,
                    })
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });

                let image_view = self.ctx.device.create_image_view(&create_info, None)
                    .map_err(|e| {
                        engine_error!("meshlet3d::vulkan", "Failed to create swapchain image view: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create image view: {:?}", e))
                    })?;
                self.image_views.push(image_view);
            }
        }

        Ok(())
    }

    unsafe fn destroy_image_views(&mut self) {
        for image_view in self.image_views.drain(..) {
            self.ctx.device.destroy_image_view(image_view, None);
        }
    }

    /// Acquire the next image, signalling `semaphore` when it is ready.
    ///
    /// Returns the raw Vulkan result so the frame loop can tell an
    /// out-of-date surface from a real failure.
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> std::result::Result<(u32, bool), vk::Result> {
        unsafe {
            self.loader.acquire_next_image(self.swapchain, u64::MAX, semaphore, vk::Fence::null())
        }
    }

    /// Queue `image_index` for presentation once `wait_semaphore` is signalled
    pub fn present(&self, wait_semaphore: vk::Semaphore, image_index: u32) -> std::result::Result<bool, vk::Result> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe { self.loader.queue_present(self.ctx.graphics_queue, &present_info) }
    }

    /// Current surface capabilities (used to detect a minimized window)
    pub fn surface_capabilities(&self) -> Result<vk::SurfaceCapabilitiesKHR> {
        self.surface.capabilities(self.ctx.physical_device)
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    pub fn format(&self) -> vk::Format {
        self.surface_format.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            self.destroy_image_views();
            if self.swapchain != vk::SwapchainKHR::null() {
                self.loader.destroy_swapchain(self.swapchain, None);
            }
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
