/*!
# Meshlet Engine

Core types for a GPU-driven meshlet renderer.

This crate holds everything that does not talk to the GPU directly: the mesh
data model and meshlet preprocessor, geometry bounds, camera and frustum math,
deterministic instance placement, the CPU reference of the compute culling
stage, per-frame buffer addressing, and the module lifecycle that drives the
application. The Vulkan backend lives in `meshlet_engine_renderer_vulkan`.

## Architecture

- **Mesh / MeshletMesh**: imported geometry and its meshlet partition
- **Aabb**: canonical bounding box shared by all instances
- **EditorCamera / Frustum**: view-projection and the six culling planes
- **cull_instances**: the visibility contract the GPU culling shader implements
- **FrameRegion**: aligned per-frame slices of persistently mapped buffers
- **Application / Module**: ordered Init/Update/CleanUp dispatch
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod app;
pub mod camera;
pub mod culling;
pub mod instances;
pub mod mesh;
pub mod renderer;
pub mod utils;

// Main meshlet3d namespace module
pub mod meshlet3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine (global logger)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Application lifecycle
    pub mod app {
        pub use crate::app::*;
    }

    // Camera and frustum
    pub mod camera {
        pub use crate::camera::*;
    }

    // Visibility culling reference
    pub mod culling {
        pub use crate::culling::*;
    }

    // Instance placement
    pub mod instances {
        pub use crate::instances::*;
    }

    // Mesh, meshlets, bounds, import
    pub mod mesh {
        pub use crate::mesh::*;
    }

    // Renderer configuration and GPU data layouts
    pub mod render {
        pub use crate::renderer::*;
    }

    // Alignment helpers
    pub mod utils {
        pub use crate::utils::*;
    }
}

// Re-export math library at crate root
pub use glam;
