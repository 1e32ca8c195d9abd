//! Mesh module: imported geometry, meshlet partition, bounds.
//!
//! The mesh is loaded once at startup, partitioned into meshlets and then
//! uploaded to the GPU. Nothing here changes after Init.

mod vertex;
mod aabb;
mod meshlet;
mod import;

pub use vertex::{Vertex, Mesh};
pub use aabb::Aabb;
pub use meshlet::{
    Meshlet, MeshletBounds, MeshletLimits, MeshletMesh,
    build_meshlets_bound, optimize_meshlet, compute_meshlet_bounds,
};
pub use import::{import_first_mesh, import_first_mesh_from_slice};
