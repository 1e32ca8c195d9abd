/// Application: ordered module dispatch

use crate::app::{Module, UpdateStatus};
use crate::error::Result;
use crate::{engine_debug, engine_error, engine_info};

/// Owns the modules and runs the lifecycle passes over them in order.
///
/// Clean-up walks the list backwards so a module is torn down before the
/// modules it was built on.
///
/// # Example
///
/// ```
/// use meshlet_engine::meshlet3d::app::{Application, Module, UpdateStatus};
///
/// struct Quit;
/// impl Module for Quit {
///     fn name(&self) -> &str { "Quit" }
///     fn update(&mut self, _dt: f32) -> UpdateStatus { UpdateStatus::Stop }
/// }
///
/// let mut app = Application::new();
/// app.add_module(Box::new(Quit));
/// app.init().unwrap();
/// assert_eq!(app.update(0.016), UpdateStatus::Stop);
/// app.clean_up().unwrap();
/// ```
#[derive(Default)]
pub struct Application {
    modules: Vec<Box<dyn Module>>,
}

impl Application {
    pub fn new() -> Self {
        Self { modules: Vec::new() }
    }

    /// Append a module; modules run in insertion order
    pub fn add_module(&mut self, module: Box<dyn Module>) {
        self.modules.push(module);
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Initialize every module. Stops at the first failure and returns it.
    pub fn init(&mut self) -> Result<()> {
        for module in &mut self.modules {
            engine_debug!("meshlet3d::App", "Init {}", module.name());
            if let Err(e) = module.init() {
                engine_error!("meshlet3d::App", "Module {} failed to initialize: {}", module.name(), e);
                return Err(e);
            }
        }
        engine_info!("meshlet3d::App", "{} modules initialized", self.modules.len());
        Ok(())
    }

    /// Run PreUpdate, Update and PostUpdate over every module.
    ///
    /// Returns the first status other than `Continue`, leaving the rest of
    /// the frame unrun.
    pub fn update(&mut self, dt: f32) -> UpdateStatus {
        for module in &mut self.modules {
            let status = module.pre_update(dt);
            if status != UpdateStatus::Continue {
                return status;
            }
        }

        for module in &mut self.modules {
            let status = module.update(dt);
            if status != UpdateStatus::Continue {
                return status;
            }
        }

        for module in &mut self.modules {
            let status = module.post_update(dt);
            if status != UpdateStatus::Continue {
                return status;
            }
        }

        UpdateStatus::Continue
    }

    /// Clean up every module in reverse order. Stops at the first failure.
    pub fn clean_up(&mut self) -> Result<()> {
        for module in self.modules.iter_mut().rev() {
            engine_debug!("meshlet3d::App", "CleanUp {}", module.name());
            if let Err(e) = module.clean_up() {
                engine_error!("meshlet3d::App", "Module {} failed to clean up: {}", module.name(), e);
                return Err(e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "application_tests.rs"]
mod tests;
