/// Physical device selection
///
/// Selection works on plain-data snapshots (`DeviceCandidate`) gathered by
/// `vulkan_device`, so every criterion can be exercised without a GPU.

use ash::vk;
use meshlet_engine::meshlet3d::{Result, Error};
use meshlet_engine::{engine_debug, engine_error, engine_info, engine_warn};
use std::ffi::CStr;
use std::fmt;

/// Device extensions the renderer cannot run without
pub const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 4] = [
    ash::khr::swapchain::NAME,
    ash::ext::mesh_shader::NAME,
    ash::khr::spirv_1_4::NAME,
    ash::khr::shader_float_controls::NAME,
];

/// Depth formats in order of preference
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// `VkPhysicalDeviceVulkan12Features` is chained during probing, so the
/// device has to report at least 1.2
pub const MIN_DEVICE_API_VERSION: u32 = vk::API_VERSION_1_2;

// ============================================================================
// Candidate snapshot
// ============================================================================

/// One queue family as seen during selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyCandidate {
    pub flags: vk::QueueFlags,
    pub queue_count: u32,
    pub supports_present: bool,
}

/// `VkPhysicalDeviceMeshShaderPropertiesEXT` values the renderer uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshShaderLimits {
    pub max_output_vertices: u32,
    pub max_output_primitives: u32,
    pub max_preferred_task_work_group_invocations: u32,
    pub max_preferred_mesh_work_group_invocations: u32,
}

/// Everything selection needs to know about one physical device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCandidate {
    pub name: String,
    pub api_version: u32,
    pub extensions: Vec<String>,
    pub task_shader: bool,
    pub mesh_shader: bool,
    pub shader_draw_parameters: bool,
    pub draw_indirect_count: bool,
    pub queue_families: Vec<QueueFamilyCandidate>,
    /// Optimal-tiling features of each entry of `DEPTH_FORMAT_CANDIDATES`
    pub depth_format_features: Vec<(vk::Format, vk::FormatFeatureFlags)>,
    pub surface_format_count: usize,
    pub present_mode_count: usize,
    pub mesh_limits: MeshShaderLimits,
    pub min_uniform_buffer_offset_alignment: u64,
    pub min_storage_buffer_offset_alignment: u64,
    pub max_compute_work_group_count_x: u32,
}

/// The winning device and the choices made for it
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedDevice {
    /// Index into the candidate list (same order as `vkEnumeratePhysicalDevices`)
    pub index: usize,
    pub name: String,
    pub queue_family: u32,
    pub depth_format: vk::Format,
    pub mesh_limits: MeshShaderLimits,
    pub min_uniform_buffer_offset_alignment: u64,
    pub min_storage_buffer_offset_alignment: u64,
    pub max_compute_work_group_count_x: u32,
}

/// Why a candidate was turned down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    ApiVersion(u32),
    MissingExtension(String),
    NoTaskShader,
    NoMeshShader,
    NoShaderDrawParameters,
    NoDrawIndirectCount,
    NoQueueFamily,
    NoDepthFormat,
    NoSurfaceFormat,
    NoPresentMode,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ApiVersion(v) => write!(
                f, "Vulkan {}.{} < 1.2", vk::api_version_major(*v), vk::api_version_minor(*v)
            ),
            Rejection::MissingExtension(name) => write!(f, "missing extension {}", name),
            Rejection::NoTaskShader => write!(f, "task shaders not supported"),
            Rejection::NoMeshShader => write!(f, "mesh shaders not supported"),
            Rejection::NoShaderDrawParameters => write!(f, "shaderDrawParameters not supported"),
            Rejection::NoDrawIndirectCount => write!(f, "drawIndirectCount not supported"),
            Rejection::NoQueueFamily => write!(f, "no graphics+compute queue family with present support"),
            Rejection::NoDepthFormat => write!(f, "no supported depth format"),
            Rejection::NoSurfaceFormat => write!(f, "surface reports no formats"),
            Rejection::NoPresentMode => write!(f, "surface reports no present modes"),
        }
    }
}

// ============================================================================
// Criteria
// ============================================================================

/// First queue family that does graphics, compute and present
pub fn choose_queue_family(families: &[QueueFamilyCandidate]) -> Option<u32> {
    families
        .iter()
        .position(|family| {
            family.queue_count > 0
                && family.flags.contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)
                && family.supports_present
        })
        .map(|index| index as u32)
}

/// First entry of `DEPTH_FORMAT_CANDIDATES` usable as an optimal-tiling
/// depth attachment
pub fn choose_depth_format(features: &[(vk::Format, vk::FormatFeatureFlags)]) -> Option<vk::Format> {
    DEPTH_FORMAT_CANDIDATES.iter().copied().find(|candidate| {
        features.iter().any(|(format, flags)| {
            format == candidate && flags.contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        })
    })
}

/// Check one candidate against every requirement, in order
pub fn check_device(candidate: &DeviceCandidate) -> std::result::Result<(u32, vk::Format), Rejection> {
    if candidate.api_version < MIN_DEVICE_API_VERSION {
        return Err(Rejection::ApiVersion(candidate.api_version));
    }

    for required in REQUIRED_DEVICE_EXTENSIONS {
        let required = required.to_string_lossy();
        if !candidate.extensions.iter().any(|ext| *ext == required) {
            return Err(Rejection::MissingExtension(required.into_owned()));
        }
    }

    if !candidate.task_shader {
        return Err(Rejection::NoTaskShader);
    }
    if !candidate.mesh_shader {
        return Err(Rejection::NoMeshShader);
    }
    if !candidate.shader_draw_parameters {
        return Err(Rejection::NoShaderDrawParameters);
    }
    if !candidate.draw_indirect_count {
        return Err(Rejection::NoDrawIndirectCount);
    }

    let queue_family = choose_queue_family(&candidate.queue_families)
        .ok_or(Rejection::NoQueueFamily)?;

    let depth_format = choose_depth_format(&candidate.depth_format_features)
        .ok_or(Rejection::NoDepthFormat)?;

    if candidate.surface_format_count == 0 {
        return Err(Rejection::NoSurfaceFormat);
    }
    if candidate.present_mode_count == 0 {
        return Err(Rejection::NoPresentMode);
    }

    Ok((queue_family, depth_format))
}

/// Pick the first suitable device. Rejections are logged with their reason.
pub fn select_device(candidates: &[DeviceCandidate]) -> Result<SelectedDevice> {
    if candidates.is_empty() {
        engine_error!("meshlet3d::vulkan", "No Vulkan-capable GPU found");
        return Err(Error::InitializationFailed("No Vulkan-capable GPU found".to_string()));
    }

    for (index, candidate) in candidates.iter().enumerate() {
        match check_device(candidate) {
            Ok((queue_family, depth_format)) => {
                engine_info!("meshlet3d::vulkan",
                    "Selected GPU: {} (queue family {}, depth {:?})",
                    candidate.name, queue_family, depth_format);
                return Ok(SelectedDevice {
                    index,
                    name: candidate.name.clone(),
                    queue_family,
                    depth_format,
                    mesh_limits: candidate.mesh_limits,
                    min_uniform_buffer_offset_alignment: candidate.min_uniform_buffer_offset_alignment,
                    min_storage_buffer_offset_alignment: candidate.min_storage_buffer_offset_alignment,
                    max_compute_work_group_count_x: candidate.max_compute_work_group_count_x,
                });
            }
            Err(reason) => {
                engine_warn!("meshlet3d::vulkan", "GPU {} rejected: {}", candidate.name, reason);
            }
        }
    }

    engine_error!("meshlet3d::vulkan", "No GPU supports mesh shading with the required features");
    Err(Error::InitializationFailed(
        "No GPU supports mesh shading with the required features".to_string()
    ))
}

// ============================================================================
// Memory types
// ============================================================================

/// First memory type allowed by `type_filter` whose flags include `properties`
pub fn find_memory_type(
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
) -> Option<u32> {
    let count = (memory_properties.memory_type_count as usize).min(vk::MAX_MEMORY_TYPES);
    let found = memory_properties.memory_types[..count]
        .iter()
        .enumerate()
        .find(|(i, memory_type)| {
            type_filter & (1 << i) != 0 && memory_type.property_flags.contains(properties)
        })
        .map(|(i, _)| i as u32);

    if found.is_none() {
        engine_debug!("meshlet3d::vulkan",
            "No memory type for filter {:#b} with {:?}", type_filter, properties);
    }
    found
}

#[cfg(test)]
#[path = "vulkan_device_selection_tests.rs"]
mod tests;
