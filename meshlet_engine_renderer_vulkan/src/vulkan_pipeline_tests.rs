//! Unit tests for vulkan_pipeline.rs

use super::*;

// ============================================================================
// BINDING TABLES
// ============================================================================

#[test]
fn test_graphics_bindings_are_dense() {
    for (index, entry) in GRAPHICS_BINDINGS.iter().enumerate() {
        assert_eq!(entry.binding, index as u32);
    }
    for (index, entry) in COMPUTE_BINDINGS.iter().enumerate() {
        assert_eq!(entry.binding, index as u32);
    }
}

#[test]
fn test_camera_is_the_only_graphics_uniform() {
    assert_eq!(count_descriptors(&GRAPHICS_BINDINGS, vk::DescriptorType::UNIFORM_BUFFER), 1);
    assert_eq!(count_descriptors(&GRAPHICS_BINDINGS, vk::DescriptorType::STORAGE_BUFFER), 7);

    let camera = GRAPHICS_BINDINGS[graphics_binding::CAMERA as usize];
    assert_eq!(camera.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
    assert!(camera.stages.contains(vk::ShaderStageFlags::TASK_EXT | vk::ShaderStageFlags::MESH_EXT));
}

#[test]
fn test_task_stage_sees_meshlets_transforms_ids_and_cones() {
    let task: Vec<u32> = GRAPHICS_BINDINGS
        .iter()
        .filter(|entry| entry.stages.contains(vk::ShaderStageFlags::TASK_EXT))
        .map(|entry| entry.binding)
        .collect();
    assert_eq!(task, vec![
        graphics_binding::MESHLETS,
        graphics_binding::CAMERA,
        graphics_binding::MODEL_MATRICES,
        graphics_binding::VISIBLE_IDS,
        graphics_binding::MESHLET_CULL_INFO,
    ]);
}

#[test]
fn test_compute_bindings() {
    assert_eq!(count_descriptors(&COMPUTE_BINDINGS, vk::DescriptorType::UNIFORM_BUFFER), 1);
    assert_eq!(count_descriptors(&COMPUTE_BINDINGS, vk::DescriptorType::STORAGE_BUFFER), 6);
    assert_eq!(
        COMPUTE_BINDINGS[compute_binding::FRUSTUM as usize].descriptor_type,
        vk::DescriptorType::UNIFORM_BUFFER
    );
    assert!(COMPUTE_BINDINGS.iter().all(|entry| entry.stages == vk::ShaderStageFlags::COMPUTE));
}

// ============================================================================
// SPECIALIZATION
// ============================================================================

#[test]
fn test_workgroup_specialization() {
    let task = WorkgroupSpecialization::new(1, 32);
    assert_eq!(task.constant_id(), 1);
    assert_eq!(task.value(), 32);

    let info = task.info();
    assert_eq!(info.map_entry_count, 1);
    assert_eq!(info.data_size, 4);
}
