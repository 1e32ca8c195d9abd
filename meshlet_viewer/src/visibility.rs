/// Visibility statistics: every few frames, cull the instance field on the CPU
/// with the same placement and frustum the GPU pass sees, and log the result

use meshlet_engine::glam::Mat4;
use meshlet_engine::meshlet3d::camera::Frustum;
use meshlet_engine::meshlet3d::culling::{cull_instances, CullOutput};
use meshlet_engine::meshlet3d::instances::{generate_instance_corners, generate_instance_transforms};
use meshlet_engine::meshlet3d::mesh::Aabb;
use meshlet_engine::meshlet3d::render::{BoxCorners, RendererConfig, RendererStats};
use meshlet_engine::engine_info;

pub struct VisibilityLog {
    transforms: Vec<Mat4>,
    corners: Vec<BoxCorners>,
    meshlet_counts: Vec<u32>,
    task_workgroup_size: u32,
    interval: u32,
    frames_until_log: u32,
}

impl VisibilityLog {
    /// Frames between two reports
    pub const DEFAULT_INTERVAL: u32 = 120;

    /// Rebuild the placement the renderer uploaded. `aabb` is the bound of
    /// the model before it was handed to the renderer.
    pub fn new(aabb: &Aabb, config: &RendererConfig, stats: &RendererStats, interval: u32) -> Self {
        let count = stats.instance_count as usize;
        Self {
            transforms: generate_instance_transforms(count, config.placement_seed, config.placement_extent),
            corners: generate_instance_corners(aabb, count),
            meshlet_counts: vec![stats.meshlet_count; count],
            task_workgroup_size: stats.task_workgroup_size,
            interval: interval.max(1),
            frames_until_log: 0,
        }
    }

    pub fn instance_count(&self) -> usize {
        self.transforms.len()
    }

    /// Count one presented frame. Returns the culling result on the frames
    /// that are due for a report: the first one, then every `interval`.
    pub fn frame(&mut self, frustum: &Frustum) -> Option<CullOutput> {
        if self.frames_until_log > 0 {
            self.frames_until_log -= 1;
            return None;
        }
        self.frames_until_log = self.interval - 1;

        Some(cull_instances(
            frustum,
            &self.corners,
            &self.transforms,
            &self.meshlet_counts,
            self.task_workgroup_size,
        ))
    }

    /// [`frame`](Self::frame), logging the report when one is due
    pub fn log_frame(&mut self, frustum: &Frustum) {
        if let Some(output) = self.frame(frustum) {
            let task_groups: u64 = output.commands.iter().map(|c| c.group_count_x as u64).sum();
            engine_info!("meshlet3d::Visibility",
                "{} of {} instances visible, {} task groups",
                output.visible_count, self.instance_count(), task_groups);
        }
    }
}

#[cfg(test)]
#[path = "visibility_tests.rs"]
mod tests;
