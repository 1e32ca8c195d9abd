/// Pipelines - the task/mesh graphics pipeline and the culling compute pipeline
///
/// The two descriptor layouts are declared as constant tables. Shader
/// reflection is checked against them, the descriptor pool is sized from
/// them, and the set writes follow them.

use meshlet_engine::meshlet3d::{Result, Error};
use meshlet_engine::{engine_error, engine_info, engine_err};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_shader::Shader;

// ============================================================================
// Binding tables
// ============================================================================

/// One entry of a descriptor set layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingSpec {
    pub binding: u32,
    pub descriptor_type: vk::DescriptorType,
    pub stages: vk::ShaderStageFlags,
}

const fn entry(binding: u32, descriptor_type: vk::DescriptorType, stages: vk::ShaderStageFlags) -> BindingSpec {
    BindingSpec { binding, descriptor_type, stages }
}

const STORAGE: vk::DescriptorType = vk::DescriptorType::STORAGE_BUFFER;
const UNIFORM: vk::DescriptorType = vk::DescriptorType::UNIFORM_BUFFER;
const TASK: vk::ShaderStageFlags = vk::ShaderStageFlags::TASK_EXT;
const MESH: vk::ShaderStageFlags = vk::ShaderStageFlags::MESH_EXT;
const COMPUTE: vk::ShaderStageFlags = vk::ShaderStageFlags::COMPUTE;
const TASK_MESH: vk::ShaderStageFlags = vk::ShaderStageFlags::from_raw(TASK.as_raw() | MESH.as_raw());

pub mod graphics_binding {
    pub const MESHLETS: u32 = 0;
    pub const MESHLET_VERTICES: u32 = 1;
    pub const MESHLET_TRIANGLES: u32 = 2;
    pub const VERTICES: u32 = 3;
    pub const CAMERA: u32 = 4;
    pub const MODEL_MATRICES: u32 = 5;
    pub const VISIBLE_IDS: u32 = 6;
    pub const MESHLET_CULL_INFO: u32 = 7;
}

pub mod compute_binding {
    pub const FRUSTUM: u32 = 0;
    pub const MESHLET_COUNTS: u32 = 1;
    pub const DISPATCH_COMMANDS: u32 = 2;
    pub const PARAMETER_COUNTER: u32 = 3;
    pub const BOXES: u32 = 4;
    pub const MODEL_MATRICES: u32 = 5;
    pub const VISIBLE_IDS: u32 = 6;
}

/// Set 0 of the task/mesh pipeline
pub const GRAPHICS_BINDINGS: [BindingSpec; 8] = [
    entry(graphics_binding::MESHLETS, STORAGE, TASK_MESH),
    entry(graphics_binding::MESHLET_VERTICES, STORAGE, MESH),
    entry(graphics_binding::MESHLET_TRIANGLES, STORAGE, MESH),
    entry(graphics_binding::VERTICES, STORAGE, MESH),
    entry(graphics_binding::CAMERA, UNIFORM, TASK_MESH),
    entry(graphics_binding::MODEL_MATRICES, STORAGE, TASK_MESH),
    entry(graphics_binding::VISIBLE_IDS, STORAGE, TASK),
    entry(graphics_binding::MESHLET_CULL_INFO, STORAGE, TASK),
];

/// Set 0 of the culling pipeline
pub const COMPUTE_BINDINGS: [BindingSpec; 7] = [
    entry(compute_binding::FRUSTUM, UNIFORM, COMPUTE),
    entry(compute_binding::MESHLET_COUNTS, STORAGE, COMPUTE),
    entry(compute_binding::DISPATCH_COMMANDS, STORAGE, COMPUTE),
    entry(compute_binding::PARAMETER_COUNTER, STORAGE, COMPUTE),
    entry(compute_binding::BOXES, STORAGE, COMPUTE),
    entry(compute_binding::MODEL_MATRICES, STORAGE, COMPUTE),
    entry(compute_binding::VISIBLE_IDS, STORAGE, COMPUTE),
];

/// How many descriptors of `descriptor_type` one set of `table` holds
pub fn count_descriptors(table: &[BindingSpec], descriptor_type: vk::DescriptorType) -> u32 {
    table.iter().filter(|entry| entry.descriptor_type == descriptor_type).count() as u32
}

// ============================================================================
// Specialization constants
// ============================================================================

/// A single u32 specialization constant
#[derive(Debug, Clone, Copy)]
pub struct WorkgroupSpecialization {
    entries: [vk::SpecializationMapEntry; 1],
    data: [u8; 4],
}

impl WorkgroupSpecialization {
    pub fn new(constant_id: u32, value: u32) -> Self {
        Self {
            entries: [vk::SpecializationMapEntry {
                constant_id,
                offset: 0,
                size: std::mem::size_of::<u32>(),
            }],
            data: value.to_ne_bytes(),
        }
    }

    pub fn constant_id(&self) -> u32 {
        self.entries[0].constant_id
    }

    pub fn value(&self) -> u32 {
        u32::from_ne_bytes(self.data)
    }

    pub fn info(&self) -> vk::SpecializationInfo<'_> {
        vk::SpecializationInfo::default()
            .map_entries(&self.entries)
            .data(&self.data)
    }
}

// ============================================================================
// Descriptor set layout
// ============================================================================

/// `VkDescriptorSetLayout` built from a binding table
pub struct DescriptorSetLayout {
    pub(crate) layout: vk::DescriptorSetLayout,
    ctx: Arc<GpuContext>,
}

impl DescriptorSetLayout {
    pub fn new(ctx: &Arc<GpuContext>, table: &[BindingSpec]) -> Result<Self> {
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = table
            .iter()
            .map(|entry| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(entry.binding)
                    .descriptor_type(entry.descriptor_type)
                    .descriptor_count(1)
                    .stage_flags(entry.stages)
            })
            .collect();

        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
        let layout = unsafe { ctx.device.create_descriptor_set_layout(&create_info, None) }
            .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to create descriptor set layout: {:?}", e))?;

        Ok(Self { layout, ctx: Arc::clone(ctx) })
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Pipeline and its layout, destroyed together
pub struct Pipeline {
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) pipeline_layout: vk::PipelineLayout,
    pub(crate) bind_point: vk::PipelineBindPoint,
    ctx: Arc<GpuContext>,
}

impl Pipeline {
    fn create_layout(ctx: &GpuContext, set_layout: &DescriptorSetLayout) -> Result<vk::PipelineLayout> {
        let set_layouts = [set_layout.layout];
        let layout_create_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
        unsafe { ctx.device.create_pipeline_layout(&layout_create_info, None) }
            .map_err(|e| engine_err!("meshlet3d::vulkan", "Failed to create pipeline layout: {:?}", e))
    }

    /// Task + mesh + fragment pipeline. Geometry comes from storage buffers,
    /// so there is no vertex input or input assembly state.
    #[allow(clippy::too_many_arguments)]
    pub fn new_mesh(
        ctx: &Arc<GpuContext>,
        render_pass: vk::RenderPass,
        set_layout: &DescriptorSetLayout,
        task: &Shader,
        mesh: &Shader,
        fragment: &Shader,
        task_specialization: &WorkgroupSpecialization,
        mesh_specialization: &WorkgroupSpecialization,
    ) -> Result<Self> {
        let pipeline_layout = Self::create_layout(ctx, set_layout)?;
        // From here on Drop cleans up the layout, and a null pipeline is skipped
        let mut pipeline = Self {
            pipeline: vk::Pipeline::null(),
            pipeline_layout,
            bind_point: vk::PipelineBindPoint::GRAPHICS,
            ctx: Arc::clone(ctx),
        };

        let task_info = task_specialization.info();
        let mesh_info = mesh_specialization.info();
        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(task.stage)
                .module(task.module)
                .name(c"main")
                .specialization_info(&task_info),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(mesh.stage)
                .module(mesh.module)
                .name(c"main")
                .specialization_info(&mesh_info),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(fragment.stage)
                .module(fragment.module)
                .name(c"main"),
        ];

        // Viewport state (dynamic)
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false);
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&color_blend_attachment));

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .depth_stencil_state(&depth_stencil_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(pipeline_layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = unsafe {
            ctx.device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None)
        }
        .map_err(|(_, e)| {
            engine_error!("meshlet3d::vulkan", "Failed to create mesh pipeline: {:?}", e);
            Error::InitializationFailed(format!("Failed to create mesh pipeline: {:?}", e))
        })?;
        pipeline.pipeline = pipelines[0];

        engine_info!("meshlet3d::vulkan",
            "Mesh pipeline created (task group {}, mesh group {})",
            task_specialization.value(), mesh_specialization.value());

        Ok(pipeline)
    }

    /// Frustum culling pipeline
    pub fn new_compute(
        ctx: &Arc<GpuContext>,
        set_layout: &DescriptorSetLayout,
        cull: &Shader,
        specialization: &WorkgroupSpecialization,
    ) -> Result<Self> {
        let pipeline_layout = Self::create_layout(ctx, set_layout)?;
        let mut pipeline = Self {
            pipeline: vk::Pipeline::null(),
            pipeline_layout,
            bind_point: vk::PipelineBindPoint::COMPUTE,
            ctx: Arc::clone(ctx),
        };

        let info = specialization.info();
        let stage = vk::PipelineShaderStageCreateInfo::default()
            .stage(cull.stage)
            .module(cull.module)
            .name(c"main")
            .specialization_info(&info);

        let create_info = vk::ComputePipelineCreateInfo::default()
            .stage(stage)
            .layout(pipeline_layout);

        let pipelines = unsafe {
            ctx.device.create_compute_pipelines(vk::PipelineCache::null(), &[create_info], None)
        }
        .map_err(|(_, e)| {
            engine_error!("meshlet3d::vulkan", "Failed to create culling pipeline: {:?}", e);
            Error::InitializationFailed(format!("Failed to create culling pipeline: {:?}", e))
        })?;
        pipeline.pipeline = pipelines[0];

        Ok(pipeline)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            if self.pipeline != vk::Pipeline::null() {
                self.ctx.device.destroy_pipeline(self.pipeline, None);
            }
            self.ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_pipeline_tests.rs"]
mod tests;
