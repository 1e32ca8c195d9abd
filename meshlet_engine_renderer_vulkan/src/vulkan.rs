/// VulkanRenderer - Vulkan implementation of the Renderer trait
///
/// Owns every GPU object of the viewer: device context, swapchain and depth
/// targets, both pipelines, the static geometry buffers and the per-frame
/// mapped buffers. `render_frame` runs one pass of the frame loop.

use meshlet_engine::meshlet3d::{Result, Error};
use meshlet_engine::meshlet3d::mesh::{Aabb, Mesh, MeshletLimits, MeshletMesh};
use meshlet_engine::meshlet3d::instances::{generate_instance_corners, generate_instance_transforms};
use meshlet_engine::meshlet3d::render::{
    BoxCorners, CameraUniform, FrameStatus, FrameView, FrustumUniform, MeshletCullInfo,
    Renderer, RendererConfig, RendererStats, DrawMeshTasksCommand,
};
use meshlet_engine::meshlet3d::utils::{FrameRegion, MAX_FRAMES_IN_FLIGHT};
use meshlet_engine::glam::Mat4;
use meshlet_engine::{engine_debug, engine_error, engine_info, engine_warn, engine_err};
use ash::vk;
use gpu_allocator::MemoryLocation;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::{GpuContext, Surface, VulkanInstance};
use crate::vulkan_descriptor_set::{BufferBinding, DescriptorPool};
use crate::vulkan_device::{create_logical_device, pick_physical_device};
use crate::vulkan_device_selection::find_memory_type;
use crate::vulkan_frame::{record_frame_commands, FrameCommands, FrameSync};
use crate::vulkan_frame_buffer::FrameTargets;
use crate::vulkan_pipeline::{
    DescriptorSetLayout, Pipeline, WorkgroupSpecialization, COMPUTE_BINDINGS, GRAPHICS_BINDINGS,
};
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_shader::Shader;
use crate::vulkan_swapchain::{choose_extent, Swapchain};
use crate::vulkan_upload::{upload_device_local, UploadRequest};

/// Output array sizes compiled into mesh.mesh; meshlets never exceed them
const SHADER_MESHLET_LIMITS: MeshletLimits = MeshletLimits { max_vertices: 64, max_triangles: 124 };

/// Length of the meshlet index array in the task payload (task.task)
const SHADER_MAX_TASK_WORKGROUP_SIZE: u32 = 128;

/// Used when the device reports no preferred workgroup size
const FALLBACK_WORKGROUP_SIZE: u32 = 32;

// ============================================================================
// Per-frame buffer layout
// ============================================================================

/// Frame regions of every per-frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameLayout {
    pub camera: FrameRegion,
    pub frustum: FrameRegion,
    pub matrices: FrameRegion,
    pub boxes: FrameRegion,
    pub counter: FrameRegion,
    pub dispatch: FrameRegion,
    pub visible_ids: FrameRegion,
}

impl FrameLayout {
    pub fn new(instance_count: u32, uniform_alignment: u64, storage_alignment: u64) -> Self {
        // Indirect and count offsets must also be multiples of 4
        let storage_alignment = storage_alignment.max(4);
        let instances = instance_count as u64;
        let uniform = |size: usize| FrameRegion::new(size as u64, uniform_alignment, MAX_FRAMES_IN_FLIGHT);
        let storage = |size: u64| FrameRegion::new(size, storage_alignment, MAX_FRAMES_IN_FLIGHT);

        Self {
            camera: uniform(std::mem::size_of::<CameraUniform>()),
            frustum: uniform(std::mem::size_of::<FrustumUniform>()),
            matrices: storage(instances * std::mem::size_of::<Mat4>() as u64),
            boxes: storage(instances * std::mem::size_of::<BoxCorners>() as u64),
            counter: storage(std::mem::size_of::<u32>() as u64),
            dispatch: storage(instances * std::mem::size_of::<DrawMeshTasksCommand>() as u64),
            visible_ids: storage(instances * std::mem::size_of::<u32>() as u64),
        }
    }

    fn binding(buffer: &Buffer, region: &FrameRegion, frame: usize) -> BufferBinding {
        BufferBinding::new(buffer.handle(), region.offset(frame), region.size())
    }
}

/// Buffers holding one region per frame slot
struct FrameBuffers {
    camera: Buffer,
    frustum: Buffer,
    matrices: Buffer,
    boxes: Buffer,
    counter: Buffer,
    dispatch: Buffer,
    visible_ids: Buffer,
}

impl FrameBuffers {
    fn new(ctx: &Arc<GpuContext>, layout: &FrameLayout) -> Result<Self> {
        let mapped = |size: u64, usage: vk::BufferUsageFlags, name: &str| {
            Buffer::new(ctx, size, usage, MemoryLocation::CpuToGpu, name)
        };
        let storage = vk::BufferUsageFlags::STORAGE_BUFFER;
        let indirect = vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::INDIRECT_BUFFER;

        Ok(Self {
            camera: mapped(layout.camera.total_size(), vk::BufferUsageFlags::UNIFORM_BUFFER, "camera")?,
            frustum: mapped(layout.frustum.total_size(), vk::BufferUsageFlags::UNIFORM_BUFFER, "frustum")?,
            matrices: mapped(layout.matrices.total_size(), storage, "model_matrices")?,
            boxes: mapped(layout.boxes.total_size(), storage, "instance_boxes")?,
            counter: mapped(layout.counter.total_size(), indirect, "parameter_counter")?,
            dispatch: Buffer::new(ctx, layout.dispatch.total_size(), indirect, MemoryLocation::GpuOnly, "dispatch_commands")?,
            visible_ids: Buffer::new(ctx, layout.visible_ids.total_size(), storage, MemoryLocation::GpuOnly, "visible_ids")?,
        })
    }
}

/// Device-local buffers written once at startup
struct StaticBuffers {
    meshlets: Buffer,
    cull_info: Buffer,
    meshlet_vertices: Buffer,
    meshlet_triangles: Buffer,
    vertices: Buffer,
    meshlet_counts: Buffer,
}

impl StaticBuffers {
    fn upload(ctx: &Arc<GpuContext>, meshlet_mesh: &MeshletMesh, instance_count: u32) -> Result<Self> {
        let cull_info: Vec<MeshletCullInfo> = meshlet_mesh.bounds().iter().map(MeshletCullInfo::from).collect();
        let triangles = meshlet_mesh.meshlet_triangles_u32();
        let meshlet_counts = vec![meshlet_mesh.meshlet_count() as u32; instance_count as usize];

        let storage = vk::BufferUsageFlags::STORAGE_BUFFER;
        let requests = [
            UploadRequest { name: "meshlets", data: bytemuck::cast_slice(meshlet_mesh.meshlets()), usage: storage },
            UploadRequest { name: "meshlet_cull_info", data: bytemuck::cast_slice(&cull_info), usage: storage },
            UploadRequest { name: "meshlet_vertices", data: bytemuck::cast_slice(meshlet_mesh.meshlet_vertices()), usage: storage },
            UploadRequest { name: "meshlet_triangles", data: bytemuck::cast_slice(&triangles), usage: storage },
            UploadRequest { name: "vertices", data: bytemuck::cast_slice(&meshlet_mesh.mesh().vertices), usage: storage },
            UploadRequest { name: "meshlet_counts", data: bytemuck::cast_slice(&meshlet_counts), usage: storage },
        ];

        let buffers: [Buffer; 6] = upload_device_local(ctx, &requests)?
            .try_into()
            .map_err(|_| engine_err!("meshlet3d::vulkan", "Static upload returned the wrong number of buffers"))?;
        let [meshlets, cull_info, meshlet_vertices, meshlet_triangles, vertices, meshlet_counts] = buffers;

        Ok(Self { meshlets, cull_info, meshlet_vertices, meshlet_triangles, vertices, meshlet_counts })
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Vulkan mesh-shading renderer.
///
/// Fields are declared in destruction order: everything that uses the
/// device comes before `ctx`, and the swapchain comes before `surface`.
pub struct VulkanRenderer {
    frame_sync: FrameSync,
    descriptor_pool: DescriptorPool,
    graphics_sets: Vec<vk::DescriptorSet>,
    compute_sets: Vec<vk::DescriptorSet>,
    mesh_pipeline: Pipeline,
    cull_pipeline: Pipeline,
    _graphics_set_layout: DescriptorSetLayout,
    _compute_set_layout: DescriptorSetLayout,
    targets: FrameTargets,
    render_pass: RenderPass,
    swapchain: Swapchain,
    frame_buffers: FrameBuffers,
    _static_buffers: StaticBuffers,

    layout: FrameLayout,
    transforms: Vec<Mat4>,
    corners: Vec<BoxCorners>,
    instance_count: u32,
    depth_format: vk::Format,

    frame_index: usize,
    window_size: (u32, u32),
    /// Set by `resize` or by a skipped recreation; rebuilt before the next acquire
    swapchain_dirty: bool,
    stats: RendererStats,
    print_validation_report: bool,

    _surface: Arc<Surface>,
    ctx: Arc<GpuContext>,
}

impl VulkanRenderer {
    /// Initialize the whole renderer for `window`.
    ///
    /// `mesh` is partitioned into meshlets and moved into GPU buffers; it is
    /// left empty on success. Any failure releases what was created so far.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        window_size: (u32, u32),
        config: RendererConfig,
        mesh: &mut Mesh,
    ) -> Result<Self> {
        let instance_count = config.instance_count;
        if instance_count == 0 {
            engine_error!("meshlet3d::vulkan", "Instance count must be at least 1");
            return Err(Error::InitializationFailed("instance_count is 0".to_string()));
        }
        // Canonical box of the untransformed model, shared by every instance
        let aabb = Aabb::generate(&mesh.vertices)?;

        let instance = Arc::new(VulkanInstance::new(window, &config)?);
        let surface = Arc::new(Surface::new(Arc::clone(&instance), window)?);
        let (physical_device, selected) = pick_physical_device(&instance, &surface)?;

        if instance_count > selected.max_compute_work_group_count_x {
            engine_error!("meshlet3d::vulkan",
                "{} instances exceed maxComputeWorkGroupCount[0] = {}",
                instance_count, selected.max_compute_work_group_count_x);
            return Err(Error::InitializationFailed(format!(
                "instance_count {} exceeds the device's compute dispatch limit", instance_count
            )));
        }

        let memory_properties = unsafe {
            instance.instance.get_physical_device_memory_properties(physical_device)
        };
        let host_coherent = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        if find_memory_type(u32::MAX, host_coherent, &memory_properties).is_none() {
            engine_error!("meshlet3d::vulkan", "No host-visible coherent memory type");
            return Err(Error::InitializationFailed("No host-visible coherent memory type".to_string()));
        }

        let device = create_logical_device(&instance, physical_device, &selected)?;
        let ctx = Arc::new(GpuContext::new(Arc::clone(&instance), physical_device, device, selected.queue_family)?);

        // Meshlets
        let limits = MeshletLimits::from_device(
            selected.mesh_limits.max_output_vertices.min(SHADER_MESHLET_LIMITS.max_vertices),
            selected.mesh_limits.max_output_primitives.min(SHADER_MESHLET_LIMITS.max_triangles),
        );
        let meshlet_mesh = MeshletMesh::build(mesh, limits)?;
        engine_info!("meshlet3d::vulkan",
            "{} meshlets (limits {}/{}), {} instances",
            meshlet_mesh.meshlet_count(), limits.max_vertices, limits.max_triangles, instance_count);

        let static_buffers = StaticBuffers::upload(&ctx, &meshlet_mesh, instance_count)?;

        // Instances
        let transforms = generate_instance_transforms(
            instance_count as usize, config.placement_seed, config.placement_extent,
        );
        let corners = generate_instance_corners(&aabb, instance_count as usize);

        let layout = FrameLayout::new(
            instance_count,
            selected.min_uniform_buffer_offset_alignment,
            selected.min_storage_buffer_offset_alignment,
        );
        let frame_buffers = FrameBuffers::new(&ctx, &layout)?;

        // Presentation
        let swapchain = Swapchain::new(Arc::clone(&ctx), Arc::clone(&surface), window_size)?;
        let render_pass = RenderPass::new(Arc::clone(&ctx), swapchain.format(), selected.depth_format)?;
        let targets = FrameTargets::new(
            &ctx, render_pass.handle(), swapchain.image_views(), selected.depth_format, swapchain.extent(),
        )?;

        // Pipelines
        let task_group = non_zero_or_fallback(selected.mesh_limits.max_preferred_task_work_group_invocations)
            .min(SHADER_MAX_TASK_WORKGROUP_SIZE);
        let mesh_group = non_zero_or_fallback(selected.mesh_limits.max_preferred_mesh_work_group_invocations);

        let graphics_set_layout = DescriptorSetLayout::new(&ctx, &GRAPHICS_BINDINGS)?;
        let compute_set_layout = DescriptorSetLayout::new(&ctx, &COMPUTE_BINDINGS)?;

        let shader_dir = &config.shader_dir;
        let task = Shader::load(&ctx, &shader_dir.join("task.spv"), vk::ShaderStageFlags::TASK_EXT, &GRAPHICS_BINDINGS)?;
        let mesh_shader = Shader::load(&ctx, &shader_dir.join("mesh.spv"), vk::ShaderStageFlags::MESH_EXT, &GRAPHICS_BINDINGS)?;
        let fragment = Shader::load(&ctx, &shader_dir.join("fragment.spv"), vk::ShaderStageFlags::FRAGMENT, &GRAPHICS_BINDINGS)?;
        let cull = Shader::load(&ctx, &shader_dir.join("cull.spv"), vk::ShaderStageFlags::COMPUTE, &COMPUTE_BINDINGS)?;

        let mesh_pipeline = Pipeline::new_mesh(
            &ctx,
            render_pass.handle(),
            &graphics_set_layout,
            &task,
            &mesh_shader,
            &fragment,
            &WorkgroupSpecialization::new(1, task_group),
            &WorkgroupSpecialization::new(0, mesh_group),
        )?;
        let cull_pipeline = Pipeline::new_compute(
            &ctx, &compute_set_layout, &cull, &WorkgroupSpecialization::new(0, task_group),
        )?;

        // Descriptor sets, one pair per frame slot
        let descriptor_pool = DescriptorPool::new(&ctx, MAX_FRAMES_IN_FLIGHT as u32)?;
        let mut graphics_sets = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut compute_sets = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for frame in 0..MAX_FRAMES_IN_FLIGHT {
            let fb = &frame_buffers;
            graphics_sets.push(descriptor_pool.allocate_set(&graphics_set_layout, &GRAPHICS_BINDINGS, &[
                BufferBinding::whole(static_buffers.meshlets.handle()),
                BufferBinding::whole(static_buffers.meshlet_vertices.handle()),
                BufferBinding::whole(static_buffers.meshlet_triangles.handle()),
                BufferBinding::whole(static_buffers.vertices.handle()),
                FrameLayout::binding(&fb.camera, &layout.camera, frame),
                FrameLayout::binding(&fb.matrices, &layout.matrices, frame),
                FrameLayout::binding(&fb.visible_ids, &layout.visible_ids, frame),
                BufferBinding::whole(static_buffers.cull_info.handle()),
            ])?);
            compute_sets.push(descriptor_pool.allocate_set(&compute_set_layout, &COMPUTE_BINDINGS, &[
                FrameLayout::binding(&fb.frustum, &layout.frustum, frame),
                BufferBinding::whole(static_buffers.meshlet_counts.handle()),
                FrameLayout::binding(&fb.dispatch, &layout.dispatch, frame),
                FrameLayout::binding(&fb.counter, &layout.counter, frame),
                FrameLayout::binding(&fb.boxes, &layout.boxes, frame),
                FrameLayout::binding(&fb.matrices, &layout.matrices, frame),
                FrameLayout::binding(&fb.visible_ids, &layout.visible_ids, frame),
            ])?);
        }

        let frame_sync = FrameSync::new(&ctx, MAX_FRAMES_IN_FLIGHT, swapchain.image_count())?;

        let stats = RendererStats {
            instance_count,
            meshlet_count: meshlet_mesh.meshlet_count() as u32,
            task_workgroup_size: task_group,
            ..Default::default()
        };

        engine_info!("meshlet3d::vulkan",
            "Renderer ready on {} (task group {}, mesh group {})", selected.name, task_group, mesh_group);

        Ok(Self {
            frame_sync,
            descriptor_pool,
            graphics_sets,
            compute_sets,
            mesh_pipeline,
            cull_pipeline,
            _graphics_set_layout: graphics_set_layout,
            _compute_set_layout: compute_set_layout,
            targets,
            render_pass,
            swapchain,
            frame_buffers,
            _static_buffers: static_buffers,
            layout,
            transforms,
            corners,
            instance_count,
            depth_format: selected.depth_format,
            frame_index: 0,
            window_size,
            swapchain_dirty: false,
            stats,
            print_validation_report: instance.validation_enabled() && config.enable_validation_stats,
            _surface: surface,
            ctx,
        })
    }

    /// Write this slot's camera, instance data and frustum, and zero its counter
    fn upload_frame_data(&self, frame: usize, view: &FrameView) -> Result<()> {
        let fb = &self.frame_buffers;
        let layout = &self.layout;

        fb.counter.write_pod(layout.counter.offset(frame), &[0u32])?;
        fb.camera.write_pod(
            layout.camera.offset(frame),
            &[CameraUniform::new(&view.view_projection, view.camera_position)],
        )?;
        fb.matrices.write_pod(layout.matrices.offset(frame), &self.transforms)?;
        fb.boxes.write_pod(layout.boxes.offset(frame), &self.corners)?;
        fb.frustum.write_pod(
            layout.frustum.offset(frame),
            &[FrustumUniform::new(&view.frustum, self.instance_count)],
        )
    }

    /// Rebuild the swapchain and everything sized by it. A zero-sized
    /// surface skips the frame and retries next time.
    fn recreate_swapchain(&mut self) -> Result<FrameStatus> {
        let capabilities = self.swapchain.surface_capabilities()?;
        let extent = choose_extent(&capabilities, self.window_size);
        if extent.width == 0 || extent.height == 0 {
            self.swapchain_dirty = true;
            self.stats.frames_skipped += 1;
            return Ok(FrameStatus::Skipped);
        }

        self.ctx.wait_idle()?;
        self.targets.destroy_framebuffers();
        self.swapchain.recreate(self.window_size)?;
        self.targets.rebuild(
            self.render_pass.handle(), self.swapchain.image_views(), self.depth_format, self.swapchain.extent(),
        )?;
        self.frame_sync.recreate_render_finished(self.swapchain.image_count())?;

        self.swapchain_dirty = false;
        self.stats.swapchain_recreations += 1;
        self.stats.frames_skipped += 1;

        let extent = self.swapchain.extent();
        Ok(FrameStatus::SwapchainRecreated { width: extent.width, height: extent.height })
    }
}

fn non_zero_or_fallback(workgroup_size: u32) -> u32 {
    if workgroup_size == 0 {
        engine_warn!("meshlet3d::vulkan",
            "Device reports no preferred workgroup size, using {}", FALLBACK_WORKGROUP_SIZE);
        FALLBACK_WORKGROUP_SIZE
    } else {
        workgroup_size
    }
}

impl Renderer for VulkanRenderer {
    fn render_frame(&mut self, view: &FrameView) -> Result<FrameStatus> {
        let frame = self.frame_index;

        self.frame_sync.wait(frame)?;
        self.upload_frame_data(frame, view)?;

        if self.swapchain_dirty {
            return self.recreate_swapchain();
        }

        let image_index = match self.swapchain.acquire_next_image(self.frame_sync.image_available(frame)) {
            Ok((image_index, _suboptimal)) => image_index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                engine_debug!("meshlet3d::vulkan", "Swapchain out of date during acquire");
                return self.recreate_swapchain();
            }
            Err(e) => {
                return Err(engine_err!("meshlet3d::vulkan", "Failed to acquire swapchain image: {:?}", e));
            }
        };

        // Committed to submitting from here on
        self.frame_sync.reset(frame)?;

        record_frame_commands(&self.ctx, &FrameCommands {
            command_buffer: self.frame_sync.command_buffer(frame),
            cull_pipeline: &self.cull_pipeline,
            cull_set: self.compute_sets[frame],
            mesh_pipeline: &self.mesh_pipeline,
            mesh_set: self.graphics_sets[frame],
            render_pass: self.render_pass.handle(),
            framebuffer: self.targets.framebuffer(image_index),
            extent: self.targets.extent(),
            instance_count: self.instance_count,
            dispatch_buffer: self.frame_buffers.dispatch.handle(),
            dispatch_offset: self.layout.dispatch.offset(frame),
            counter_buffer: self.frame_buffers.counter.handle(),
            counter_offset: self.layout.counter.offset(frame),
        })?;

        self.frame_sync.submit(frame, image_index)?;

        // Out-of-date and suboptimal surface again at the next acquire
        match self.swapchain.present(self.frame_sync.render_finished(image_index), image_index) {
            Ok(_) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {}
            Err(e) => engine_warn!("meshlet3d::vulkan", "Present returned {:?}", e),
        }

        self.frame_index = (frame + 1) % MAX_FRAMES_IN_FLIGHT;
        self.stats.frames_presented += 1;
        Ok(FrameStatus::Presented)
    }

    fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != self.window_size {
            engine_debug!("meshlet3d::vulkan", "Resize to {}x{}", width, height);
            self.window_size = (width, height);
            self.swapchain_dirty = true;
        }
    }

    fn wait_idle(&self) -> Result<()> {
        self.ctx.wait_idle()
    }

    fn stats(&self) -> RendererStats {
        self.stats
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        self.ctx.wait_idle().ok();

        if self.print_validation_report {
            crate::debug::print_validation_stats_report();
        }

        engine_info!("meshlet3d::vulkan",
            "Renderer shut down after {} frames ({} skipped, {} swapchain recreations)",
            self.stats.frames_presented, self.stats.frames_skipped, self.stats.swapchain_recreations);
        // Fields drop in declaration order
    }
}

#[cfg(test)]
#[path = "vulkan_tests.rs"]
mod tests;
