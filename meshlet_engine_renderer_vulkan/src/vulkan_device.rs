/// Physical device probing and logical device creation
///
/// Turns every physical device into a `DeviceCandidate`, lets
/// `select_device` choose, then creates the logical device with the same
/// feature chain that was queried.

use ash::vk;
use meshlet_engine::meshlet3d::{Result, Error};
use meshlet_engine::{engine_debug, engine_error, engine_warn};

use crate::vulkan_context::{Surface, VulkanInstance};
use crate::vulkan_device_selection::{
    DeviceCandidate, QueueFamilyCandidate, MeshShaderLimits, SelectedDevice,
    DEPTH_FORMAT_CANDIDATES, REQUIRED_DEVICE_EXTENSIONS,
};

/// Snapshot one physical device
pub fn probe_device(
    instance: &VulkanInstance,
    surface: &Surface,
    physical_device: vk::PhysicalDevice,
) -> DeviceCandidate {
    unsafe {
        let instance = &instance.instance;
        let properties = instance.get_physical_device_properties(physical_device);
        let name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "Unknown GPU".to_string());

        let extensions: Vec<String> = instance
            .enumerate_device_extension_properties(physical_device)
            .unwrap_or_default()
            .iter()
            .filter_map(|ext| ext.extension_name_as_c_str().ok())
            .map(|ext| ext.to_string_lossy().into_owned())
            .collect();

        // Chaining the 1.2 and mesh shader structs is only valid when the
        // device supports them; an unsuitable device keeps every flag false.
        let chain_allowed = properties.api_version >= vk::API_VERSION_1_2
            && extensions.iter().any(|ext| *ext == ash::ext::mesh_shader::NAME.to_string_lossy());

        let mut vulkan11_features = vk::PhysicalDeviceVulkan11Features::default();
        let mut vulkan12_features = vk::PhysicalDeviceVulkan12Features::default();
        let mut mesh_features = vk::PhysicalDeviceMeshShaderFeaturesEXT::default();
        let mut mesh_properties = vk::PhysicalDeviceMeshShaderPropertiesEXT::default();

        if chain_allowed {
            let mut features2 = vk::PhysicalDeviceFeatures2::default()
                .push_next(&mut vulkan11_features)
                .push_next(&mut vulkan12_features)
                .push_next(&mut mesh_features);
            instance.get_physical_device_features2(physical_device, &mut features2);

            let mut properties2 = vk::PhysicalDeviceProperties2::default()
                .push_next(&mut mesh_properties);
            instance.get_physical_device_properties2(physical_device, &mut properties2);
        }

        let queue_families = instance
            .get_physical_device_queue_family_properties(physical_device)
            .iter()
            .enumerate()
            .map(|(index, family)| QueueFamilyCandidate {
                flags: family.queue_flags,
                queue_count: family.queue_count,
                supports_present: surface.supports_present(physical_device, index as u32),
            })
            .collect();

        let depth_format_features = DEPTH_FORMAT_CANDIDATES
            .iter()
            .map(|&format| {
                let props = instance.get_physical_device_format_properties(physical_device, format);
                (format, props.optimal_tiling_features)
            })
            .collect();

        let surface_format_count = surface.formats(physical_device).map(|f| f.len()).unwrap_or(0);
        let present_mode_count = surface.present_modes(physical_device).map(|m| m.len()).unwrap_or(0);

        let candidate = DeviceCandidate {
            name,
            api_version: properties.api_version,
            extensions,
            task_shader: mesh_features.task_shader == vk::TRUE,
            mesh_shader: mesh_features.mesh_shader == vk::TRUE,
            shader_draw_parameters: vulkan11_features.shader_draw_parameters == vk::TRUE,
            draw_indirect_count: vulkan12_features.draw_indirect_count == vk::TRUE,
            queue_families,
            depth_format_features,
            surface_format_count,
            present_mode_count,
            mesh_limits: MeshShaderLimits {
                max_output_vertices: mesh_properties.max_mesh_output_vertices,
                max_output_primitives: mesh_properties.max_mesh_output_primitives,
                max_preferred_task_work_group_invocations: mesh_properties.max_preferred_task_work_group_invocations,
                max_preferred_mesh_work_group_invocations: mesh_properties.max_preferred_mesh_work_group_invocations,
            },
            min_uniform_buffer_offset_alignment: properties.limits.min_uniform_buffer_offset_alignment,
            min_storage_buffer_offset_alignment: properties.limits.min_storage_buffer_offset_alignment,
            max_compute_work_group_count_x: properties.limits.max_compute_work_group_count[0],
        };

        engine_debug!("meshlet3d::vulkan",
            "Probed {}: mesh={} task={} drawParams={} indirectCount={} meshLimits={:?}",
            candidate.name, candidate.mesh_shader, candidate.task_shader,
            candidate.shader_draw_parameters, candidate.draw_indirect_count, candidate.mesh_limits);

        candidate
    }
}

/// Probe every physical device, choose one, return its handle and the choice
pub fn pick_physical_device(
    instance: &VulkanInstance,
    surface: &Surface,
) -> Result<(vk::PhysicalDevice, SelectedDevice)> {
    let physical_devices = unsafe { instance.instance.enumerate_physical_devices() }
        .map_err(|e| {
            engine_error!("meshlet3d::vulkan", "Failed to enumerate physical devices: {:?}", e);
            Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
        })?;

    let candidates: Vec<DeviceCandidate> = physical_devices
        .iter()
        .map(|&pd| probe_device(instance, surface, pd))
        .collect();

    let selected = crate::vulkan_device_selection::select_device(&candidates)?;
    Ok((physical_devices[selected.index], selected))
}

/// Create the logical device with one queue from the selected family and
/// the mesh shading feature chain enabled
pub fn create_logical_device(
    instance: &VulkanInstance,
    physical_device: vk::PhysicalDevice,
    selected: &SelectedDevice,
) -> Result<ash::Device> {
    let queue_priorities = [1.0];
    let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(selected.queue_family)
        .queue_priorities(&queue_priorities)];

    let extension_names: Vec<*const std::os::raw::c_char> = REQUIRED_DEVICE_EXTENSIONS
        .iter()
        .map(|name| name.as_ptr())
        .collect();

    let mut vulkan11_features = vk::PhysicalDeviceVulkan11Features::default()
        .shader_draw_parameters(true);
    let mut vulkan12_features = vk::PhysicalDeviceVulkan12Features::default()
        .draw_indirect_count(true);
    let mut mesh_features = vk::PhysicalDeviceMeshShaderFeaturesEXT::default()
        .task_shader(true)
        .mesh_shader(true);

    let device_create_info = vk::DeviceCreateInfo::default()
        .push_next(&mut vulkan11_features)
        .push_next(&mut vulkan12_features)
        .push_next(&mut mesh_features)
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names);

    let device = unsafe {
        instance.instance.create_device(physical_device, &device_create_info, None)
    }
    .map_err(|e| {
        engine_error!("meshlet3d::vulkan", "Failed to create logical device: {:?}", e);
        Error::InitializationFailed(format!("Failed to create device: {:?}", e))
    })?;

    if selected.mesh_limits.max_preferred_task_work_group_invocations == 0 {
        engine_warn!("meshlet3d::vulkan", "Device reports no preferred task workgroup size");
    }

    Ok(device)
}
