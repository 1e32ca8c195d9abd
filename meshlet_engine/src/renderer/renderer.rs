/// Renderer trait and configuration

use std::path::PathBuf;

use crate::error::Result;
use crate::renderer::{
    DebugSeverity, DebugOutput, DebugMessageFilter,
    FrameView, FrameStatus,
};

// ============================================================================
// Configuration
// ============================================================================

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),

    /// Number of model instances drawn every frame
    pub instance_count: u32,
    /// Seed of the instance placement
    pub placement_seed: u64,
    /// Half-size of the cube instances are scattered in
    pub placement_extent: f32,
    /// Directory holding task.spv, mesh.spv, fragment.spv and cull.spv
    pub shader_dir: PathBuf,

    /// Validation messages shown
    pub debug_severity: DebugSeverity,
    /// Where validation messages go
    pub debug_output: DebugOutput,
    /// Validation message categories shown
    pub debug_message_filter: DebugMessageFilter,
    /// Count validation messages and print a report at shutdown
    pub enable_validation_stats: bool,
    /// Abort the process on the first validation error
    pub break_on_validation_error: bool,
    /// Panic on the first validation error
    pub panic_on_error: bool,
}

impl RendererConfig {
    pub const DEFAULT_INSTANCE_COUNT: u32 = 100_000;
    pub const DEFAULT_PLACEMENT_SEED: u64 = 1;
    pub const DEFAULT_PLACEMENT_EXTENT: f32 = 6000.0;
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Meshlet Viewer".to_string(),
            app_version: (1, 0, 0),
            instance_count: Self::DEFAULT_INSTANCE_COUNT,
            placement_seed: Self::DEFAULT_PLACEMENT_SEED,
            placement_extent: Self::DEFAULT_PLACEMENT_EXTENT,
            shader_dir: PathBuf::from("shaders"),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_output: DebugOutput::Console,
            debug_message_filter: DebugMessageFilter::default(),
            enable_validation_stats: cfg!(debug_assertions),
            break_on_validation_error: false,
            panic_on_error: false,
        }
    }
}

/// Renderer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Frames submitted and presented
    pub frames_presented: u64,
    /// Frames skipped (minimized window, out-of-date swapchain)
    pub frames_skipped: u64,
    /// Swapchain recreations since start
    pub swapchain_recreations: u32,
    /// Instances tested by the culling pass every frame
    pub instance_count: u32,
    /// Meshlets of the uploaded mesh
    pub meshlet_count: u32,
    /// Meshlets covered by one task workgroup
    pub task_workgroup_size: u32,
}

// ============================================================================
// Renderer trait
// ============================================================================

/// Frame-level renderer interface
///
/// Implemented by the Vulkan backend. The caller owns the camera and hands
/// the renderer a snapshot of it every frame.
pub trait Renderer {
    /// Run one pass of the frame loop: wait, upload, acquire, record,
    /// submit, present.
    ///
    /// `Err` is fatal: the caller stops the loop.
    fn render_frame(&mut self, view: &FrameView) -> Result<FrameStatus>;

    /// Notify the renderer that the surface changed size
    fn resize(&mut self, width: u32, height: u32);

    /// Block until the GPU is idle
    fn wait_idle(&self) -> Result<()>;

    /// Get renderer statistics
    fn stats(&self) -> RendererStats;
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
