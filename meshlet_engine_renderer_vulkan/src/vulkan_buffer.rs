/// Buffer - a `VkBuffer` with its gpu-allocator memory

use meshlet_engine::meshlet3d::{Result, Error};
use meshlet_engine::{engine_error, engine_err};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan buffer with bound memory
pub struct Buffer {
    /// Shared GPU context (device, allocator, queue, command pool)
    ctx: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    /// Buffer size
    pub(crate) size: u64,
}

impl Buffer {
    /// Create a buffer of `size` bytes and bind fresh memory to it.
    ///
    /// `CpuToGpu` buffers come back persistently mapped.
    pub fn new(
        ctx: &Arc<GpuContext>,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        name: &str,
    ) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidResource(format!("Buffer '{}' has zero size", name)));
        }

        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx.device.create_buffer(&buffer_create_info, None)
                .map_err(|e| engine_err!("meshlet3d::vulkan",
                    "Failed to create buffer '{}' of size {} bytes: {:?}", name, size, e))?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);

            let allocation = match ctx.allocator.lock() {
                Ok(mut allocator) => allocator.allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                }),
                Err(_) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(engine_err!("meshlet3d::vulkan", "GPU allocator lock poisoned"));
                }
            };

            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(_) => {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("meshlet3d::vulkan",
                        "Out of GPU memory for buffer '{}' (required: {:.2} MB)", name, size_mb);
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(Error::OutOfMemory);
                }
            };

            // From here on Drop releases both the allocation and the handle
            let buffer = Self {
                ctx: Arc::clone(ctx),
                buffer,
                allocation: Some(allocation),
                size,
            };

            if let Some(allocation) = &buffer.allocation {
                ctx.device.bind_buffer_memory(buffer.buffer, allocation.memory(), allocation.offset())
                    .map_err(|e| engine_err!("meshlet3d::vulkan",
                        "Failed to bind memory of buffer '{}': {:?}", name, e))?;
            }

            Ok(buffer)
        }
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Base of the persistent mapping, `None` for device-local buffers
    pub fn mapped_ptr(&self) -> Option<*mut u8> {
        self.allocation
            .as_ref()
            .and_then(|allocation| allocation.mapped_ptr())
            .map(|ptr| ptr.as_ptr() as *mut u8)
    }

    /// Copy `data` into the mapping at `offset`
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > self.size) {
            engine_error!("meshlet3d::vulkan",
                "Buffer write out of range: {} bytes at offset {} (size {})", data.len(), offset, self.size);
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at offset {} exceeds buffer size {}", data.len(), offset, self.size
            )));
        }

        let mapped_ptr = self.mapped_ptr()
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?;

        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                mapped_ptr.add(offset as usize),
                data.len(),
            );
        }
        Ok(())
    }

    /// `write` for any `Pod` value or slice element type
    pub fn write_pod<T: bytemuck::Pod>(&self, offset: u64, values: &[T]) -> Result<()> {
        self.write(offset, bytemuck::cast_slice(values))
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
