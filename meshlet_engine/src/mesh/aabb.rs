/// Canonical axis-aligned bounding box of the source mesh.
///
/// One box is computed for the mesh in local space and shared by every
/// instance; the culling stage transforms its 8 corners by each instance's
/// model matrix instead of recomputing a world box from the geometry.

use glam::Vec3;
use crate::error::{Error, Result};
use super::Vertex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Component-wise min/max over all vertex positions (single pass).
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if `vertices` is empty.
    pub fn generate(vertices: &[Vertex]) -> Result<Self> {
        let first = vertices.first().ok_or_else(|| {
            crate::engine_error!("meshlet3d::mesh", "Cannot compute bounds of a mesh without vertices");
            Error::InvalidResource("cannot compute bounds of a mesh without vertices".to_string())
        })?;

        let mut min = first.position();
        let mut max = min;
        for vertex in &vertices[1..] {
            let p = vertex.position();
            min = min.min(p);
            max = max.max(p);
        }

        Ok(Self { min, max })
    }

    /// The 8 corners in the order the culling shader indexes them:
    /// max corner, the three corners sharing two max coordinates,
    /// min corner, the three corners sharing two min coordinates.
    pub fn points(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        [
            max,
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            min,
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(min.x, max.y, min.z),
        ]
    }

    /// Corners as homogeneous points (w = 1), the GPU upload layout.
    pub fn points_homogeneous(&self) -> [[f32; 4]; 8] {
        self.points().map(|p| [p.x, p.y, p.z, 1.0])
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }
}

#[cfg(test)]
#[path = "aabb_tests.rs"]
mod tests;
