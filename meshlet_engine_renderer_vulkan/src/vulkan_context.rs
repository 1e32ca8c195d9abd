/// Vulkan instance, window surface and the shared GPU context
///
/// Ownership runs instance -> surface / device -> everything else. Every
/// GPU object holds an `Arc` to what it was created from, so handles are
/// released in reverse creation order on every exit path, including an
/// early `?` return halfway through renderer initialization.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use meshlet_engine::meshlet3d::{Result, Error};
use meshlet_engine::meshlet3d::render::RendererConfig;
use meshlet_engine::{engine_error, engine_info, engine_warn, engine_err};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use crate::debug::{DebugConfig, DebugMessenger};

pub(crate) const VALIDATION_LAYER: &std::ffi::CStr = c"VK_LAYER_KHRONOS_validation";

/// True when `name` appears in the list of available layer names
pub(crate) fn has_layer(available: &[String], name: &str) -> bool {
    available.iter().any(|layer| layer == name)
}

// ============================================================================
// Instance
// ============================================================================

/// Vulkan entry, instance and optional debug messenger
pub struct VulkanInstance {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    debug_messenger: Option<DebugMessenger>,
}

impl VulkanInstance {
    /// Create the instance with the surface extensions the window needs.
    ///
    /// With `enable_validation`, adds the Khronos validation layer and the
    /// debug messenger. A missing layer downgrades to a warning.
    pub fn new<W: HasDisplayHandle>(window: &W, config: &RendererConfig) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("meshlet3d::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let app_name = CString::new(config.app_name.as_str())
                .unwrap_or_else(|_| c"Meshlet Viewer".to_owned());
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Meshlet3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let display_handle = window.display_handle()
                .map_err(|e| {
                    engine_error!("meshlet3d::vulkan", "Failed to get display handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get display handle: {}", e))
                })?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| {
                    engine_error!("meshlet3d::vulkan", "Failed to get required extensions: {}", e);
                    Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                })?
                .to_vec();

            let validation = config.enable_validation && {
                let available: Vec<String> = entry
                    .enumerate_instance_layer_properties()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|layer| layer.layer_name_as_c_str().ok())
                    .map(|name| name.to_string_lossy().into_owned())
                    .collect();
                let found = has_layer(&available, &VALIDATION_LAYER.to_string_lossy());
                if !found {
                    engine_warn!("meshlet3d::vulkan",
                        "{} not available, continuing without validation",
                        VALIDATION_LAYER.to_string_lossy());
                }
                found
            };

            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }
            let layer_names = if validation {
                vec![VALIDATION_LAYER.as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!("meshlet3d::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            let debug_messenger = if validation {
                match DebugMessenger::new(&entry, &instance, DebugConfig::from_renderer_config(config)) {
                    Ok(messenger) => Some(messenger),
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                }
            } else {
                None
            };

            engine_info!("meshlet3d::vulkan", "Vulkan instance created (validation: {})", validation);

            Ok(Self {
                entry,
                instance,
                debug_messenger,
            })
        }
    }

    pub fn validation_enabled(&self) -> bool {
        self.debug_messenger.is_some()
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some(messenger) = self.debug_messenger.take() {
                messenger.destroy();
            }
            self.instance.destroy_instance(None);
        }
    }
}

// ============================================================================
// Surface
// ============================================================================

/// Window surface, destroyed before the instance
pub struct Surface {
    pub loader: ash::khr::surface::Instance,
    pub handle: vk::SurfaceKHR,
    _instance: Arc<VulkanInstance>,
}

impl Surface {
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        instance: Arc<VulkanInstance>,
        window: &W,
    ) -> Result<Self> {
        let display_handle = window.display_handle()
            .map_err(|e| {
                engine_error!("meshlet3d::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
        let window_handle = window.window_handle()
            .map_err(|e| {
                engine_error!("meshlet3d::vulkan", "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;

        let handle = unsafe {
            ash_window::create_surface(
                &instance.entry,
                &instance.instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
        }
        .map_err(|e| {
            engine_error!("meshlet3d::vulkan", "Failed to create surface: {:?}", e);
            Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
        })?;

        let loader = ash::khr::surface::Instance::new(&instance.entry, &instance.instance);

        Ok(Self {
            loader,
            handle,
            _instance: instance,
        })
    }

    pub fn capabilities(&self, physical_device: vk::PhysicalDevice) -> Result<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.loader
                .get_physical_device_surface_capabilities(physical_device, self.handle)
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to get surface capabilities: {:?}", e))
        }
    }

    pub fn formats(&self, physical_device: vk::PhysicalDevice) -> Result<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.loader
                .get_physical_device_surface_formats(physical_device, self.handle)
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to get surface formats: {:?}", e))
        }
    }

    pub fn present_modes(&self, physical_device: vk::PhysicalDevice) -> Result<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.loader
                .get_physical_device_surface_present_modes(physical_device, self.handle)
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to get present modes: {:?}", e))
        }
    }

    pub fn supports_present(&self, physical_device: vk::PhysicalDevice, queue_family: u32) -> bool {
        unsafe {
            self.loader
                .get_physical_device_surface_support(physical_device, queue_family, self.handle)
                .unwrap_or(false)
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.handle, None);
        }
    }
}

// ============================================================================
// GPU context
// ============================================================================

/// Shared GPU context for all Vulkan resources.
///
/// Shared via `Arc` by buffers, images, pipelines and frame objects so each
/// of them can release its handles on drop. The device is destroyed when the
/// last of them is gone.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator. Dropped before the device is destroyed.
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics + compute + present queue
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,

    /// Command pool for one-shot upload operations (TRANSIENT + RESET_COMMAND_BUFFER)
    pub upload_command_pool: Mutex<vk::CommandPool>,

    /// `VK_EXT_mesh_shader` device functions
    pub mesh_shader: ash::ext::mesh_shader::Device,

    pub physical_device: vk::PhysicalDevice,

    /// Keeps the instance alive until the device is gone
    pub instance: Arc<VulkanInstance>,
}

impl GpuContext {
    /// Wrap a freshly created logical device.
    ///
    /// Takes ownership of `device`: on failure it is destroyed before returning.
    pub fn new(
        instance: Arc<VulkanInstance>,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        graphics_queue_family: u32,
    ) -> Result<Self> {
        unsafe {
            let graphics_queue = device.get_device_queue(graphics_queue_family, 0);

            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    engine_error!("meshlet3d::vulkan", "Failed to create GPU allocator: {:?}", e);
                    device.destroy_device(None);
                    return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
                }
            };

            let upload_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let upload_command_pool = match device.create_command_pool(&upload_pool_create_info, None) {
                Ok(pool) => pool,
                Err(e) => {
                    engine_error!("meshlet3d::vulkan", "Failed to create upload command pool: {:?}", e);
                    drop(allocator);
                    device.destroy_device(None);
                    return Err(Error::InitializationFailed(format!("Failed to create upload command pool: {:?}", e)));
                }
            };

            let mesh_shader = ash::ext::mesh_shader::Device::new(&instance.instance, &device);

            Ok(Self {
                device,
                allocator: ManuallyDrop::new(Arc::new(Mutex::new(allocator))),
                graphics_queue,
                graphics_queue_family,
                upload_command_pool: Mutex::new(upload_command_pool),
                mesh_shader,
                physical_device,
                instance,
            })
        }
    }

    /// Block until the device finished all submitted work
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device
                .device_wait_idle()
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to wait idle: {:?}", e))
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            if let Ok(pool) = self.upload_command_pool.get_mut() {
                if *pool != vk::CommandPool::null() {
                    self.device.destroy_command_pool(*pool, None);
                    *pool = vk::CommandPool::null();
                }
            }

            // Frees the allocator's memory blocks while the device still exists
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_context_tests.rs"]
mod tests;
