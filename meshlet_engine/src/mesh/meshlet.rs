/// Meshlet preprocessor
///
/// Partitions a triangle mesh into small clusters ("meshlets") that a task
/// shader can cull and a mesh shader can emit in one workgroup. Clustering,
/// per-meshlet reordering and cone bounds come from meshoptimizer.
///
/// Layout (matches the GPU side):
/// - `meshlet_vertices`: for each meshlet, `vertex_count` global vertex ids
///   starting at `vertex_offset`
/// - `meshlet_triangles`: for each meshlet, `triangle_count * 3` local
///   (per-meshlet) vertex indices starting at `triangle_offset`
///
/// meshoptimizer pads each meshlet's triangles to 4 bytes; the pools here are
/// repacked without padding, then trimmed to the end of the last meshlet.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use meshopt::VertexDataAdapter;
use crate::error::{Error, Result};
use super::{Mesh, Vertex};

/// Local indices are stored as `u8`, which caps a meshlet at 256 vertices.
const MAX_LOCAL_VERTICES: u32 = 256;
const MAX_LOCAL_TRIANGLES: u32 = 256;

/// meshoptimizer writes triangles in 4-byte groups
const TRIANGLE_LIMIT_GRANULARITY: u32 = 4;

/// Balance between cluster compactness and normal cone tightness
const CONE_WEIGHT: f32 = 0.25;

// ===== TYPES =====

/// One cluster. GPU layout, 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Meshlet {
    /// First entry in the meshlet vertex pool
    pub vertex_offset: u32,
    /// First entry in the meshlet triangle pool (in local indices, 3 per triangle)
    pub triangle_offset: u32,
    pub vertex_count: u32,
    pub triangle_count: u32,
}

/// Culling bounds of a meshlet: bounding sphere plus normal cone.
///
/// A meshlet is back-facing from `eye` when
/// `dot(normalize(cone_apex - eye), cone_axis) >= cone_cutoff`.
/// A cutoff of 1 disables cone culling for that meshlet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshletBounds {
    pub center: Vec3,
    pub radius: f32,
    pub cone_apex: Vec3,
    pub cone_axis: Vec3,
    pub cone_cutoff: f32,
}

impl MeshletBounds {
    /// Same test the task shader runs
    pub fn is_backfacing_from(&self, eye: Vec3) -> bool {
        let to_apex = (self.cone_apex - eye).normalize_or_zero();
        to_apex.dot(self.cone_axis) >= self.cone_cutoff
    }
}

/// Vertex and primitive caps for one meshlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshletLimits {
    pub max_vertices: u32,
    pub max_triangles: u32,
}

impl MeshletLimits {
    pub fn new(max_vertices: u32, max_triangles: u32) -> Self {
        Self { max_vertices, max_triangles }
    }

    /// Limits from `maxMeshOutputVertices` / `maxMeshOutputPrimitives`,
    /// clamped to what an 8-bit local index can address. The triangle limit
    /// is rounded down to a multiple of 4.
    pub fn from_device(max_output_vertices: u32, max_output_primitives: u32) -> Self {
        Self {
            max_vertices: max_output_vertices.min(MAX_LOCAL_VERTICES),
            max_triangles: max_output_primitives.min(MAX_LOCAL_TRIANGLES) / TRIANGLE_LIMIT_GRANULARITY
                * TRIANGLE_LIMIT_GRANULARITY,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(3..=MAX_LOCAL_VERTICES).contains(&self.max_vertices) {
            return Err(Error::InvalidResource(format!(
                "meshlet vertex limit {} outside 3..={}", self.max_vertices, MAX_LOCAL_VERTICES
            )));
        }
        if !(TRIANGLE_LIMIT_GRANULARITY..=MAX_LOCAL_TRIANGLES).contains(&self.max_triangles)
            || self.max_triangles % TRIANGLE_LIMIT_GRANULARITY != 0
        {
            return Err(Error::InvalidResource(format!(
                "meshlet triangle limit {} is not a multiple of {} in {}..={}",
                self.max_triangles, TRIANGLE_LIMIT_GRANULARITY, TRIANGLE_LIMIT_GRANULARITY, MAX_LOCAL_TRIANGLES
            )));
        }
        Ok(())
    }
}

impl Default for MeshletLimits {
    fn default() -> Self {
        Self { max_vertices: 64, max_triangles: 124 }
    }
}

/// Upper bound on the number of meshlets for a mesh of `index_count` indices.
///
/// Used to size scratch storage before clustering.
pub fn build_meshlets_bound(index_count: usize, max_vertices: usize, max_triangles: usize) -> usize {
    assert!(index_count % 3 == 0);
    assert!(max_vertices >= 3);
    assert!(max_triangles >= 1);

    // Each triangle after the first can introduce up to max_vertices - 2 new vertices in the worst case
    let max_vertices_conservative = max_vertices - 2;
    let by_vertices = (index_count + max_vertices_conservative - 1) / max_vertices_conservative;
    let by_triangles = (index_count / 3 + max_triangles - 1) / max_triangles;

    by_vertices.max(by_triangles)
}

// ===== MESHLET MESH =====

/// A mesh partitioned into meshlets, with per-meshlet bounds.
///
/// Owns the source mesh (moved in by [`MeshletMesh::build`]). Immutable
/// after construction.
#[derive(Debug, Clone)]
pub struct MeshletMesh {
    meshlets: Vec<Meshlet>,
    bounds: Vec<MeshletBounds>,
    meshlet_vertices: Vec<u32>,
    meshlet_triangles: Vec<u8>,
    mesh: Mesh,
}

impl MeshletMesh {
    /// Cluster `mesh` into meshlets, optimize each one and compute bounds.
    ///
    /// On success the vertex and index arrays of `mesh` are moved into the
    /// result and `mesh` is left empty. On failure `mesh` is untouched.
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` for an empty or malformed index list, an
    /// index past the vertex array, or limits outside the supported range.
    pub fn build(mesh: &mut Mesh, limits: MeshletLimits) -> Result<Self> {
        limits.validate().map_err(|e| {
            crate::engine_error!("meshlet3d::mesh", "{}", e);
            e
        })?;
        validate_mesh(mesh).map_err(|e| {
            crate::engine_error!("meshlet3d::mesh", "{}", e);
            e
        })?;

        let adapter = vertex_adapter(bytemuck::cast_slice(&mesh.vertices), std::mem::size_of::<Vertex>())?;

        let clusters = meshopt::build_meshlets(
            &mesh.indices,
            &adapter,
            limits.max_vertices as usize,
            limits.max_triangles as usize,
            CONE_WEIGHT,
        );

        // Scratch sized from the bound; every triangle adds at most 3 entries to either pool
        let mut meshlets = Vec::with_capacity(build_meshlets_bound(
            mesh.indices.len(),
            limits.max_vertices as usize,
            limits.max_triangles as usize,
        ));
        let mut meshlet_vertices = vec![0u32; mesh.indices.len()];
        let mut meshlet_triangles = vec![0u8; mesh.indices.len()];
        let mut bounds = Vec::with_capacity(clusters.len());

        let mut next = Meshlet::default();
        for cluster in clusters.iter() {
            let vertex_range = next.vertex_offset as usize..next.vertex_offset as usize + cluster.vertices.len();
            let triangle_range = next.triangle_offset as usize..next.triangle_offset as usize + cluster.triangles.len();
            meshlet_vertices[vertex_range].copy_from_slice(cluster.vertices);
            meshlet_triangles[triangle_range].copy_from_slice(cluster.triangles);

            let meshlet = Meshlet {
                vertex_count: cluster.vertices.len() as u32,
                triangle_count: (cluster.triangles.len() / 3) as u32,
                ..next
            };
            meshlets.push(meshlet);
            bounds.push(bounds_from_meshopt(meshopt::compute_meshlet_bounds(cluster, &adapter)));

            next.vertex_offset += meshlet.vertex_count;
            next.triangle_offset += meshlet.triangle_count * 3;
        }

        // Trim scratch storage to the end of the last meshlet
        if let Some(last) = meshlets.last() {
            meshlet_vertices.truncate((last.vertex_offset + last.vertex_count) as usize);
            meshlet_triangles.truncate((last.triangle_offset + last.triangle_count * 3) as usize);
        }
        meshlet_vertices.shrink_to_fit();
        meshlet_triangles.shrink_to_fit();

        let mesh = std::mem::take(mesh);

        crate::engine_debug!(
            "meshlet3d::mesh",
            "Built {} meshlets ({} vertices, {} triangles, limits {}/{})",
            meshlets.len(),
            mesh.vertex_count(),
            mesh.triangle_count(),
            limits.max_vertices,
            limits.max_triangles
        );

        Ok(Self {
            meshlets,
            bounds,
            meshlet_vertices,
            meshlet_triangles,
            mesh,
        })
    }

    pub fn meshlets(&self) -> &[Meshlet] {
        &self.meshlets
    }

    pub fn meshlet_count(&self) -> usize {
        self.meshlets.len()
    }

    pub fn bounds(&self) -> &[MeshletBounds] {
        &self.bounds
    }

    pub fn meshlet_vertices(&self) -> &[u32] {
        &self.meshlet_vertices
    }

    /// Local triangle indices, one byte each
    pub fn meshlet_triangles(&self) -> &[u8] {
        &self.meshlet_triangles
    }

    /// Local triangle indices widened to `u32` for the storage buffer
    pub fn meshlet_triangles_u32(&self) -> Vec<u32> {
        self.meshlet_triangles.iter().map(|&i| i as u32).collect()
    }

    /// The source mesh whose vertices the meshlets reference
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Length of the meshlet vertex pool: last meshlet's offset + count.
    pub fn meshlets_vertex_count(&self) -> usize {
        self.meshlets
            .last()
            .map_or(0, |m| (m.vertex_offset + m.vertex_count) as usize)
    }

    /// Length of the meshlet triangle pool in local indices:
    /// last meshlet's offset + 3 * its triangle count.
    pub fn meshlets_triangle_count(&self) -> usize {
        self.meshlets
            .last()
            .map_or(0, |m| (m.triangle_offset + m.triangle_count * 3) as usize)
    }
}

fn validate_mesh(mesh: &Mesh) -> Result<()> {
    if mesh.indices.is_empty() {
        return Err(Error::InvalidResource("mesh has no indices".to_string()));
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(Error::InvalidResource(format!(
            "index count {} is not a multiple of 3", mesh.indices.len()
        )));
    }
    let vertex_count = mesh.vertices.len();
    if let Some(&bad) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(Error::InvalidResource(format!(
            "index {} out of range for {} vertices", bad, vertex_count
        )));
    }
    Ok(())
}

// ===== PER-MESHLET PASSES =====

fn vertex_adapter(data: &[u8], stride: usize) -> Result<VertexDataAdapter<'_>> {
    VertexDataAdapter::new(data, stride, 0)
        .map_err(|e| Error::InvalidResource(format!("vertex positions: {}", e)))
}

fn bounds_from_meshopt(bounds: meshopt::ffi::meshopt_Bounds) -> MeshletBounds {
    let cone_axis = Vec3::from_array(bounds.cone_axis);
    MeshletBounds {
        center: Vec3::from_array(bounds.center),
        radius: bounds.radius,
        cone_apex: Vec3::from_array(bounds.cone_apex),
        cone_axis,
        // meshoptimizer leaves the axis at zero for degenerate clusters
        cone_cutoff: if cone_axis == Vec3::ZERO { 1.0 } else { bounds.cone_cutoff },
    }
}

/// Reorder one meshlet for vertex reuse.
///
/// Triangles are reordered for locality and local vertices renumbered in
/// order of first use. The set of triangles and vertices is unchanged.
///
/// `vertices` is the meshlet's slice of the vertex pool and `triangles`
/// its slice of the triangle pool (3 local indices per triangle).
///
/// # Panics
///
/// If a local index is past `vertices` or the meshlet exceeds the
/// 256 vertex / 256 triangle limits.
pub fn optimize_meshlet(vertices: &mut [u32], triangles: &mut [u8]) {
    let triangle_count = triangles.len() / 3;
    if triangle_count == 0 {
        return;
    }
    assert!(vertices.len() <= MAX_LOCAL_VERTICES as usize);
    assert!(triangle_count <= MAX_LOCAL_TRIANGLES as usize);
    assert!(triangles.iter().all(|&local| (local as usize) < vertices.len()));

    unsafe {
        meshopt::ffi::meshopt_optimizeMeshlet(
            vertices.as_mut_ptr(),
            triangles.as_mut_ptr(),
            triangle_count,
            vertices.len(),
        );
    }
}

/// Bounding sphere and normal cone of one meshlet.
///
/// `vertices` and `triangles` are the meshlet's slices of the pools,
/// `positions` the full vertex positions of the mesh.
pub fn compute_meshlet_bounds(vertices: &[u32], triangles: &[u8], positions: &[Vec3]) -> Result<MeshletBounds> {
    if let Some(&bad) = vertices.iter().find(|&&v| v as usize >= positions.len()) {
        return Err(Error::InvalidResource(format!(
            "meshlet vertex {} out of range for {} positions", bad, positions.len()
        )));
    }
    if triangles.iter().any(|&local| local as usize >= vertices.len()) {
        return Err(Error::InvalidResource("meshlet local index out of range".to_string()));
    }

    let adapter = vertex_adapter(bytemuck::cast_slice(positions), std::mem::size_of::<Vec3>())?;
    let meshlet = meshopt::Meshlet { vertices, triangles: &triangles[..triangles.len() / 3 * 3] };
    Ok(bounds_from_meshopt(meshopt::compute_meshlet_bounds(meshlet, &adapter)))
}

#[cfg(test)]
#[path = "meshlet_tests.rs"]
mod tests;
