//! Module lifecycle: Init, PreUpdate, Update, PostUpdate, CleanUp.
//!
//! An `Application` owns an ordered list of modules and runs every pass
//! over all of them before starting the next pass.

mod module;
mod application;

pub use module::{Module, UpdateStatus};
pub use application::Application;
