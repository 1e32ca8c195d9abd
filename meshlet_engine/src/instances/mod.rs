//! Instance set: model matrices of every drawn copy of the mesh.

mod placement;

pub use placement::{generate_instance_transforms, generate_instance_corners};
