/// Module trait
///
/// Every hook has a no-op default, so a module only implements the passes
/// it takes part in.

use crate::error::Result;

/// Outcome of one update pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Keep running
    Continue,
    /// Normal shutdown requested (window closed, Escape)
    Stop,
    /// Fatal failure; the application skips module clean-up
    Error,
}

/// A lifecycle participant (window, input, camera, renderer)
pub trait Module {
    /// Name used in log messages
    fn name(&self) -> &str;

    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn pre_update(&mut self, _dt: f32) -> UpdateStatus {
        UpdateStatus::Continue
    }

    fn update(&mut self, _dt: f32) -> UpdateStatus {
        UpdateStatus::Continue
    }

    fn post_update(&mut self, _dt: f32) -> UpdateStatus {
        UpdateStatus::Continue
    }

    fn clean_up(&mut self) -> Result<()> {
        Ok(())
    }
}
