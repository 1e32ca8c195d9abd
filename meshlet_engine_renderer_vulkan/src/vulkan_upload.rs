/// One-shot staging uploads into device-local buffers
///
/// All static geometry goes through a single staging buffer and a single
/// command buffer from the context's upload pool. The call blocks until the
/// copies are done, so the staging memory is released before returning.

use ash::vk;
use gpu_allocator::MemoryLocation;
use meshlet_engine::meshlet3d::Result;
use meshlet_engine::meshlet3d::utils::aligned_struct_size;
use meshlet_engine::{engine_debug, engine_err};
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;

/// Offset granularity of the regions packed into the staging buffer
const STAGING_ALIGNMENT: u64 = 16;

/// One destination buffer and the bytes it starts with
pub struct UploadRequest<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    /// Usage of the destination; TRANSFER_DST is added
    pub usage: vk::BufferUsageFlags,
}

/// Staging offset of each payload and the total staging size
pub(crate) fn staging_layout(sizes: &[u64]) -> (Vec<u64>, u64) {
    let mut offsets = Vec::with_capacity(sizes.len());
    let mut cursor = 0u64;
    for &size in sizes {
        offsets.push(cursor);
        cursor = aligned_struct_size(cursor + size, STAGING_ALIGNMENT);
    }
    (offsets, cursor)
}

/// Create one device-local buffer per request, filled with its data
pub fn upload_device_local(
    ctx: &Arc<GpuContext>,
    requests: &[UploadRequest<'_>],
) -> Result<Vec<Buffer>> {
    let sizes: Vec<u64> = requests.iter().map(|r| r.data.len() as u64).collect();
    let (offsets, staging_size) = staging_layout(&sizes);

    let staging = Buffer::new(
        ctx,
        staging_size,
        vk::BufferUsageFlags::TRANSFER_SRC,
        MemoryLocation::CpuToGpu,
        "static_staging",
    )?;

    let mut destinations = Vec::with_capacity(requests.len());
    for (request, &offset) in requests.iter().zip(&offsets) {
        staging.write(offset, request.data)?;
        destinations.push(Buffer::new(
            ctx,
            request.data.len() as u64,
            request.usage | vk::BufferUsageFlags::TRANSFER_DST,
            MemoryLocation::GpuOnly,
            request.name,
        )?);
    }

    submit_one_shot(ctx, |device, command_buffer| unsafe {
        for (destination, &offset) in destinations.iter().zip(&offsets) {
            let region = vk::BufferCopy::default()
                .src_offset(offset)
                .dst_offset(0)
                .size(destination.size());
            device.cmd_copy_buffer(command_buffer, staging.handle(), destination.handle(), &[region]);
        }
    })?;

    engine_debug!("meshlet3d::vulkan",
        "Uploaded {} static buffers ({} staging bytes)", destinations.len(), staging_size);

    Ok(destinations)
}

/// Record `record` into a transient command buffer, submit it and wait for
/// the queue to drain
pub fn submit_one_shot<F>(ctx: &GpuContext, record: F) -> Result<()>
where
    F: FnOnce(&ash::Device, vk::CommandBuffer),
{
    let pool = ctx.upload_command_pool.lock()
        .map_err(|_| engine_err!("meshlet3d::vulkan", "Upload command pool lock poisoned"))?;

    unsafe {
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(*pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffer = ctx.device.allocate_command_buffers(&allocate_info)
            .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to allocate upload command buffer: {:?}", e))?[0];

        let result = (|| {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            ctx.device.begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to begin upload command buffer: {:?}", e))?;

            record(&ctx.device, command_buffer);

            ctx.device.end_command_buffer(command_buffer)
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to end upload command buffer: {:?}", e))?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
            ctx.device.queue_submit(ctx.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to submit upload: {:?}", e))?;

            ctx.device.queue_wait_idle(ctx.graphics_queue)
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to wait for upload: {:?}", e))
        })();

        ctx.device.free_command_buffers(*pool, &[command_buffer]);
        result
    }
}

#[cfg(test)]
#[path = "vulkan_upload_tests.rs"]
mod tests;
