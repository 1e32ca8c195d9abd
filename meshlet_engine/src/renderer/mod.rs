/// Renderer module - backend-agnostic rendering types and traits

// Module declarations
pub mod renderer;
pub mod renderer_debug;
pub mod renderer_frame;
pub mod gpu_data;

// Re-export everything from renderer.rs
pub use renderer::*;

// Re-export from other modules
pub use renderer_debug::*;
pub use renderer_frame::*;
pub use gpu_data::*;
