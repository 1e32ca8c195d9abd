/// Deterministic instance placement
///
/// One seeded generator drives every instance, so a given
/// (count, seed, extent) triple always yields the same scene.

use glam::{Mat4, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::mesh::Aabb;
use crate::renderer::BoxCorners;

/// `count` model matrices `T * R`: a translation uniform in
/// `[-extent, extent]^3` and a rotation of uniform angle around a random
/// unit axis.
pub fn generate_instance_transforms(count: usize, seed: u64, extent: f32) -> Vec<Mat4> {
    let mut rng = StdRng::seed_from_u64(seed);
    let extent = extent.abs();

    (0..count)
        .map(|_| {
            let translation = Vec3::new(
                rng.gen_range(-1.0f32..=1.0),
                rng.gen_range(-1.0f32..=1.0),
                rng.gen_range(-1.0f32..=1.0),
            ) * extent;
            let axis = random_unit_vector(&mut rng);
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);

            Mat4::from_rotation_translation(Quat::from_axis_angle(axis, angle), translation)
        })
        .collect()
}

/// Corner array uploaded to the culling pass: the canonical box repeated for
/// every instance. The shader applies each instance's model matrix.
pub fn generate_instance_corners(aabb: &Aabb, count: usize) -> Vec<BoxCorners> {
    vec![aabb.points_homogeneous(); count]
}

/// Rejection sampling in the unit ball, then normalize
fn random_unit_vector(rng: &mut StdRng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0f32..=1.0),
            rng.gen_range(-1.0f32..=1.0),
            rng.gen_range(-1.0f32..=1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-4 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

#[cfg(test)]
#[path = "placement_tests.rs"]
mod tests;
