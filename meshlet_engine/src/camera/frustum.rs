/// Frustum: six clipping planes for visibility culling.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing unit normal
/// - D is the signed distance
/// - A point P is inside a plane if dot((A, B, C), P) + D >= 0
///
/// The same six vec4s are uploaded to the culling shader, in this order.

use glam::{Mat4, Vec3, Vec4};

/// Six frustum planes for culling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Gribb & Hartmann method for a zero-to-one clip depth range (Vulkan):
    /// the near plane is row 2 alone instead of row 3 + row 2.
    /// A Y-flipped projection only swaps the bottom and top planes.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        let row = |r: usize| Vec4::new(m[0][r], m[1][r], m[2][r], m[3][r]);
        let (row0, row1, row2, row3) = (row(0), row(1), row(2), row(3));

        let mut planes = [
            row3 + row0, // Left
            row3 - row0, // Right
            row3 + row1, // Bottom
            row3 - row1, // Top
            row2,        // Near (z >= 0)
            row3 - row2, // Far
        ];

        // Normalize each plane so distances are in world units
        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Signed distance of `point` to plane `index` (positive inside)
    pub fn distance(&self, index: usize, point: Vec3) -> f32 {
        let plane = self.planes[index];
        plane.truncate().dot(point) + plane.w
    }

    /// Culling test run per instance by the compute shader: the box is
    /// rejected when all of its corners lie outside the same plane.
    ///
    /// Conservative: a box outside the frustum but straddling several
    /// planes is kept.
    pub fn is_box_outside(&self, corners: &[Vec3; 8]) -> bool {
        (0..6).any(|i| corners.iter().all(|&c| self.distance(i, c) < 0.0))
    }

    /// Planes as plain arrays, the uniform upload layout
    pub fn to_array(&self) -> [[f32; 4]; 6] {
        self.planes.map(|p| p.to_array())
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
