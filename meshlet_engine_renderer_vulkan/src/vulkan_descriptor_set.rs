/// Descriptor pool and the per-frame descriptor sets
///
/// Each frame slot gets one graphics set and one compute set. Sets point at
/// that slot's region of every per-frame buffer, so nothing is rewritten
/// after creation. Sets are freed with the pool.

use meshlet_engine::meshlet3d::Result;
use meshlet_engine::{engine_debug, engine_err};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_pipeline::{count_descriptors, BindingSpec, DescriptorSetLayout, COMPUTE_BINDINGS, GRAPHICS_BINDINGS};

/// Pool sizes for `frames` graphics sets plus `frames` compute sets
pub fn descriptor_pool_sizes(frames: u32) -> [vk::DescriptorPoolSize; 2] {
    let per_frame = |descriptor_type| {
        count_descriptors(&GRAPHICS_BINDINGS, descriptor_type)
            + count_descriptors(&COMPUTE_BINDINGS, descriptor_type)
    };
    [
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: per_frame(vk::DescriptorType::UNIFORM_BUFFER) * frames,
        },
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::STORAGE_BUFFER,
            descriptor_count: per_frame(vk::DescriptorType::STORAGE_BUFFER) * frames,
        },
    ]
}

/// A buffer range bound at one binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferBinding {
    pub buffer: vk::Buffer,
    pub offset: u64,
    pub range: u64,
}

impl BufferBinding {
    pub fn new(buffer: vk::Buffer, offset: u64, range: u64) -> Self {
        Self { buffer, offset, range }
    }

    /// The whole buffer
    pub fn whole(buffer: vk::Buffer) -> Self {
        Self { buffer, offset: 0, range: vk::WHOLE_SIZE }
    }
}

/// Descriptor pool owning every set of the renderer
pub struct DescriptorPool {
    pool: vk::DescriptorPool,
    ctx: Arc<GpuContext>,
}

impl DescriptorPool {
    pub fn new(ctx: &Arc<GpuContext>, frames: u32) -> Result<Self> {
        let pool_sizes = descriptor_pool_sizes(frames);
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(frames * 2);

        let pool = unsafe { ctx.device.create_descriptor_pool(&create_info, None) }
            .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to create descriptor pool: {:?}", e))?;

        engine_debug!("meshlet3d::vulkan", "Descriptor pool: {:?}, max {} sets", pool_sizes, frames * 2);

        Ok(Self { pool, ctx: Arc::clone(ctx) })
    }

    /// Allocate one set of `layout` and bind `buffers[i]` at `table[i]`
    pub fn allocate_set(
        &self,
        layout: &DescriptorSetLayout,
        table: &[BindingSpec],
        buffers: &[BufferBinding],
    ) -> Result<vk::DescriptorSet> {
        if table.len() != buffers.len() {
            return Err(engine_err!("meshlet3d::vulkan",
                "Descriptor set has {} bindings but {} buffers were given", table.len(), buffers.len()));
        }

        let set_layouts = [layout.layout];
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(&set_layouts);

        let set = unsafe { self.ctx.device.allocate_descriptor_sets(&allocate_info) }
            .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to allocate descriptor set: {:?}", e))?[0];

        let buffer_infos: Vec<[vk::DescriptorBufferInfo; 1]> = buffers
            .iter()
            .map(|binding| [vk::DescriptorBufferInfo {
                buffer: binding.buffer,
                offset: binding.offset,
                range: binding.range,
            }])
            .collect();

        let writes: Vec<vk::WriteDescriptorSet> = table
            .iter()
            .zip(&buffer_infos)
            .map(|(entry, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(entry.binding)
                    .dst_array_element(0)
                    .descriptor_type(entry.descriptor_type)
                    .buffer_info(info)
            })
            .collect();

        unsafe {
            self.ctx.device.update_descriptor_sets(&writes, &[]);
        }

        Ok(set)
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_descriptor_set_tests.rs"]
mod tests;
