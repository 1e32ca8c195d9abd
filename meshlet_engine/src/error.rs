//! Error types for the meshlet engine
//!
//! This module defines the error types used throughout the engine,
//! including rendering, initialization, import and resource management.

use std::fmt;

/// Result type for meshlet engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Meshlet engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan call failure, unexpected result code)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (mesh, shader binary, buffer range, etc.)
    InvalidResource(String),

    /// Initialization failed (instance, device, swapchain, pipelines)
    InitializationFailed(String),

    /// Mesh asset could not be imported
    ImportFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ImportFailed(msg) => write!(f, "Import failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
