/// glTF mesh import
///
/// Reads the first primitive of the first mesh of a glTF/GLB asset into a
/// [`Mesh`]. Positions, normals and indices are all required; 8/16/32-bit
/// indices are widened to `u32`. Materials, images and the node hierarchy
/// are ignored.

use std::path::Path;
use glam::Vec3;
use crate::error::{Error, Result};
use super::{Mesh, Vertex};

fn import_error(message: String) -> Error {
    crate::engine_error!("meshlet3d::import", "{}", message);
    Error::ImportFailed(message)
}

/// Load the first mesh of the glTF file at `path`.
///
/// External `.bin` buffers are resolved relative to the file's directory.
pub fn import_first_mesh(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let gltf = gltf::Gltf::open(path)
        .map_err(|e| import_error(format!("failed to open {}: {}", path.display(), e)))?;

    let base = path.parent();
    let buffers = gltf::import_buffers(&gltf.document, base, gltf.blob.clone())
        .map_err(|e| import_error(format!("failed to load buffers of {}: {}", path.display(), e)))?;

    let mesh = read_first_mesh(&gltf.document, &buffers, &path.display().to_string())?;

    crate::engine_info!(
        "meshlet3d::import",
        "Imported {} ({} vertices, {} triangles)",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    Ok(mesh)
}

/// Load the first mesh of an in-memory glTF/GLB asset.
///
/// Only embedded buffers (GLB binary chunk or `data:` URIs) can be resolved.
pub fn import_first_mesh_from_slice(bytes: &[u8]) -> Result<Mesh> {
    let gltf = gltf::Gltf::from_slice(bytes)
        .map_err(|e| import_error(format!("failed to parse glTF: {}", e)))?;
    let buffers = gltf::import_buffers(&gltf.document, None, gltf.blob.clone())
        .map_err(|e| import_error(format!("failed to load buffers: {}", e)))?;

    read_first_mesh(&gltf.document, &buffers, "<memory>")
}

fn read_first_mesh(document: &gltf::Document, buffers: &[gltf::buffer::Data], name: &str) -> Result<Mesh> {
    let mesh = document
        .meshes()
        .next()
        .ok_or_else(|| import_error(format!("{} does not contain any mesh", name)))?;
    let primitive = mesh
        .primitives()
        .next()
        .ok_or_else(|| import_error(format!("{} mesh has no primitives", name)))?;

    if primitive.mode() != gltf::mesh::Mode::Triangles {
        return Err(import_error(format!(
            "{} primitive mode {:?} is not a triangle list", name, primitive.mode()
        )));
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| import_error(format!("{} does not have vertex positions", name)))?
        .collect();

    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .ok_or_else(|| import_error(format!("{} does not have normals", name)))?
        .collect();

    let indices: Vec<u32> = reader
        .read_indices()
        .ok_or_else(|| import_error(format!("{} does not have indices", name)))?
        .into_u32()
        .collect();

    if normals.len() != positions.len() {
        return Err(import_error(format!(
            "{} has {} positions but {} normals", name, positions.len(), normals.len()
        )));
    }

    let vertices = positions
        .iter()
        .zip(&normals)
        .map(|(p, n)| Vertex::new(Vec3::from_array(*p), Vec3::from_array(*n)))
        .collect();

    Ok(Mesh::new(vertices, indices))
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;
