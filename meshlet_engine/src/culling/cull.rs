/// Frustum culling of instance boxes.
///
/// Mirrors `cull.comp` invocation for invocation: transform the 8 corners
/// of an instance box by its model matrix, reject the instance when all
/// corners are outside one plane, otherwise append a task dispatch sized
/// for the instance's meshlet count.

use glam::{Mat4, Vec3, Vec4};
use crate::camera::Frustum;
use crate::renderer::{BoxCorners, DrawMeshTasksCommand};

/// Result of one culling pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CullOutput {
    /// Compacted indirect commands, one per visible instance
    pub commands: Vec<DrawMeshTasksCommand>,
    /// Instance index of each command, same order
    pub visible_ids: Vec<u32>,
    /// Value the parameter counter holds after the pass
    pub visible_count: u32,
}

/// Task workgroups needed to cover `meshlet_count` meshlets
pub fn task_group_count(meshlet_count: u32, task_workgroup_size: u32) -> u32 {
    if task_workgroup_size == 0 {
        return 0;
    }
    meshlet_count.div_ceil(task_workgroup_size)
}

/// Cull every instance against `frustum`.
///
/// `corners`, `transforms` and `meshlet_counts` are indexed by instance and
/// must have the same length (the shorter one bounds the pass, like the
/// instance count in the frustum block does on the GPU).
pub fn cull_instances(
    frustum: &Frustum,
    corners: &[BoxCorners],
    transforms: &[Mat4],
    meshlet_counts: &[u32],
    task_workgroup_size: u32,
) -> CullOutput {
    let instance_count = corners.len().min(transforms.len()).min(meshlet_counts.len());
    let mut output = CullOutput::default();

    for instance in 0..instance_count {
        let model = &transforms[instance];
        let world: [Vec3; 8] = corners[instance].map(|c| {
            let p = *model * Vec4::from_array(c);
            p.truncate()
        });

        if frustum.is_box_outside(&world) {
            continue;
        }

        let groups = task_group_count(meshlet_counts[instance], task_workgroup_size);
        output.commands.push(DrawMeshTasksCommand::new(groups));
        output.visible_ids.push(instance as u32);
        output.visible_count += 1;
    }

    output
}

#[cfg(test)]
#[path = "cull_tests.rs"]
mod tests;
