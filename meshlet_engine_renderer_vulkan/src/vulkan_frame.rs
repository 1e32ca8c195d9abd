/// Frame synchronization and per-frame command recording
///
/// Fences and acquire semaphores exist once per frame slot. Render-finished
/// semaphores exist once per swapchain image, because presentation of an
/// image may still be waiting on one when the same slot comes around again.

use meshlet_engine::meshlet3d::render::DrawMeshTasksCommand;
use meshlet_engine::meshlet3d::Result;
use meshlet_engine::{engine_debug, engine_err};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_pipeline::Pipeline;

/// Byte stride between two indirect mesh-task commands
pub const DRAW_COMMAND_STRIDE: u32 = std::mem::size_of::<DrawMeshTasksCommand>() as u32;

/// Color the swapchain image is cleared to
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

// ============================================================================
// Synchronization
// ============================================================================

/// Command buffers, fences and semaphores of the frame loop
pub struct FrameSync {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    command_buffers: Vec<vk::CommandBuffer>,
    in_flight_fences: Vec<vk::Fence>,
    image_available: Vec<vk::Semaphore>,
    render_finished: Vec<vk::Semaphore>,
}

impl FrameSync {
    pub fn new(ctx: &Arc<GpuContext>, frames: usize, image_count: usize) -> Result<Self> {
        let command_pool_create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(ctx.graphics_queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let command_pool = unsafe { ctx.device.create_command_pool(&command_pool_create_info, None) }
            .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to create frame command pool: {:?}", e))?;

        let mut sync = Self {
            ctx: Arc::clone(ctx),
            command_pool,
            command_buffers: Vec::new(),
            in_flight_fences: Vec::with_capacity(frames),
            image_available: Vec::with_capacity(frames),
            render_finished: Vec::new(),
        };

        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(frames as u32);
        sync.command_buffers = unsafe { ctx.device.allocate_command_buffers(&allocate_info) }
            .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to allocate frame command buffers: {:?}", e))?;

        // Signaled so the first wait of every slot returns immediately
        let fence_create_info = vk::FenceCreateInfo::default()
            .flags(vk::FenceCreateFlags::SIGNALED);

        for _ in 0..frames {
            let fence = unsafe { ctx.device.create_fence(&fence_create_info, None) }
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to create fence: {:?}", e))?;
            sync.in_flight_fences.push(fence);

            let semaphore = sync.create_semaphore()?;
            sync.image_available.push(semaphore);
        }

        sync.recreate_render_finished(image_count)?;

        Ok(sync)
    }

    fn create_semaphore(&self) -> Result<vk::Semaphore> {
        let create_info = vk::SemaphoreCreateInfo::default();
        unsafe { self.ctx.device.create_semaphore(&create_info, None) }
            .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to create semaphore: {:?}", e))
    }

    /// Match the render-finished semaphores to a new swapchain image count.
    /// The device must be idle.
    pub fn recreate_render_finished(&mut self, image_count: usize) -> Result<()> {
        if self.render_finished.len() == image_count {
            return Ok(());
        }
        unsafe {
            for semaphore in self.render_finished.drain(..) {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }
        }
        for _ in 0..image_count {
            let semaphore = self.create_semaphore()?;
            self.render_finished.push(semaphore);
        }
        engine_debug!("meshlet3d::vulkan", "{} render-finished semaphores", image_count);
        Ok(())
    }

    /// Block until the GPU retired the last submission of `frame`
    pub fn wait(&self, frame: usize) -> Result<()> {
        unsafe {
            self.ctx.device
                .wait_for_fences(&[self.in_flight_fences[frame]], true, u64::MAX)
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to wait for frame fence: {:?}", e))
        }
    }

    pub fn reset(&self, frame: usize) -> Result<()> {
        unsafe {
            self.ctx.device
                .reset_fences(&[self.in_flight_fences[frame]])
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to reset frame fence: {:?}", e))
        }
    }

    pub fn command_buffer(&self, frame: usize) -> vk::CommandBuffer {
        self.command_buffers[frame]
    }

    pub fn image_available(&self, frame: usize) -> vk::Semaphore {
        self.image_available[frame]
    }

    pub fn render_finished(&self, image_index: u32) -> vk::Semaphore {
        self.render_finished[image_index as usize]
    }

    /// Submit `frame`'s command buffer for `image_index`
    pub fn submit(&self, frame: usize, image_index: u32) -> Result<()> {
        let wait_semaphores = [self.image_available[frame]];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [self.command_buffers[frame]];
        let signal_semaphores = [self.render_finished(image_index)];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx.device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], self.in_flight_fences[frame])
                .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to submit frame: {:?}", e))
        }
    }
}

impl Drop for FrameSync {
    fn drop(&mut self) {
        unsafe {
            for &semaphore in self.render_finished.iter().chain(&self.image_available) {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }
            for &fence in &self.in_flight_fences {
                self.ctx.device.destroy_fence(fence, None);
            }
            // Frees the command buffers too
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

// ============================================================================
// Recording
// ============================================================================

/// Everything one frame's command buffer refers to
pub struct FrameCommands<'a> {
    pub command_buffer: vk::CommandBuffer,
    pub cull_pipeline: &'a Pipeline,
    pub cull_set: vk::DescriptorSet,
    pub mesh_pipeline: &'a Pipeline,
    pub mesh_set: vk::DescriptorSet,
    pub render_pass: vk::RenderPass,
    pub framebuffer: vk::Framebuffer,
    pub extent: vk::Extent2D,
    pub instance_count: u32,
    /// This frame's indirect task-group commands
    pub dispatch_buffer: vk::Buffer,
    pub dispatch_offset: u64,
    /// This frame's visible-instance counter
    pub counter_buffer: vk::Buffer,
    pub counter_offset: u64,
}

/// Record culling, the barrier and the indirect-count mesh draw
pub fn record_frame_commands(ctx: &GpuContext, frame: &FrameCommands<'_>) -> Result<()> {
    let device = &ctx.device;
    let cmd = frame.command_buffer;

    unsafe {
        device.reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())
            .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to reset command buffer: {:?}", e))?;

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        device.begin_command_buffer(cmd, &begin_info)
            .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to begin command buffer: {:?}", e))?;

        // One workgroup per instance
        device.cmd_bind_pipeline(cmd, frame.cull_pipeline.bind_point, frame.cull_pipeline.pipeline);
        device.cmd_bind_descriptor_sets(
            cmd,
            frame.cull_pipeline.bind_point,
            frame.cull_pipeline.pipeline_layout,
            0,
            &[frame.cull_set],
            &[],
        );
        device.cmd_dispatch(cmd, frame.instance_count, 1, 1);

        let barrier = vk::MemoryBarrier::default()
            .src_access_mask(vk::AccessFlags::SHADER_WRITE)
            .dst_access_mask(vk::AccessFlags::INDIRECT_COMMAND_READ | vk::AccessFlags::SHADER_READ);
        device.cmd_pipeline_barrier(
            cmd,
            vk::PipelineStageFlags::COMPUTE_SHADER,
            vk::PipelineStageFlags::DRAW_INDIRECT | vk::PipelineStageFlags::TASK_SHADER_EXT,
            vk::DependencyFlags::empty(),
            &[barrier],
            &[],
            &[],
        );

        device.cmd_bind_pipeline(cmd, frame.mesh_pipeline.bind_point, frame.mesh_pipeline.pipeline);

        let clear_values = [
            vk::ClearValue { color: vk::ClearColorValue { float32: CLEAR_COLOR } },
            vk::ClearValue { depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 } },
        ];
        let render_area = vk::Rect2D { offset: vk::Offset2D { x: 0, y: 0 }, extent: frame.extent };
        let render_pass_begin = vk::RenderPassBeginInfo::default()
            .render_pass(frame.render_pass)
            .framebuffer(frame.framebuffer)
            .render_area(render_area)
            .clear_values(&clear_values);
        device.cmd_begin_render_pass(cmd, &render_pass_begin, vk::SubpassContents::INLINE);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: frame.extent.width as f32,
            height: frame.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        device.cmd_set_viewport(cmd, 0, &[viewport]);
        device.cmd_set_scissor(cmd, 0, &[render_area]);

        device.cmd_bind_descriptor_sets(
            cmd,
            frame.mesh_pipeline.bind_point,
            frame.mesh_pipeline.pipeline_layout,
            0,
            &[frame.mesh_set],
            &[],
        );

        // The draw count comes from the counter the culling pass filled
        ctx.mesh_shader.cmd_draw_mesh_tasks_indirect_count(
            cmd,
            frame.dispatch_buffer,
            frame.dispatch_offset,
            frame.counter_buffer,
            frame.counter_offset,
            frame.instance_count,
            DRAW_COMMAND_STRIDE,
        );

        device.cmd_end_render_pass(cmd);

        device.end_command_buffer(cmd)
            .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to end command buffer: {:?}", e))?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "vulkan_frame_tests.rs"]
mod tests;
