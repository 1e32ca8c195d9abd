/// Renderer module: owns the Vulkan renderer and draws one frame per update

use meshlet_engine::meshlet3d::app::{Module, UpdateStatus};
use meshlet_engine::meshlet3d::camera::EditorCamera;
use meshlet_engine::meshlet3d::mesh::{import_first_mesh, Aabb};
use meshlet_engine::meshlet3d::render::{FrameStatus, FrameView, Renderer, RendererConfig};
use meshlet_engine::meshlet3d::{Error, Result};
use meshlet_engine::{engine_debug, engine_error, engine_info};
use meshlet_engine_renderer_vulkan::VulkanRenderer;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use winit::window::Window;

use crate::visibility::VisibilityLog;
use crate::window::WindowState;

pub struct RendererModule {
    // Declared before `window`: the surface must go before the window it was created for
    renderer: Option<VulkanRenderer>,
    window: Rc<Window>,
    window_state: Rc<RefCell<WindowState>>,
    camera: Rc<RefCell<EditorCamera>>,
    model_path: PathBuf,
    config: RendererConfig,
    visibility_stats: bool,
    visibility: Option<VisibilityLog>,
}

impl RendererModule {
    pub fn new(
        window: Rc<Window>,
        window_state: Rc<RefCell<WindowState>>,
        camera: Rc<RefCell<EditorCamera>>,
        model_path: PathBuf,
        config: RendererConfig,
        visibility_stats: bool,
    ) -> Self {
        Self {
            renderer: None,
            window,
            window_state,
            camera,
            model_path,
            config,
            visibility_stats,
            visibility: None,
        }
    }
}

impl Module for RendererModule {
    fn name(&self) -> &str {
        "Renderer"
    }

    fn init(&mut self) -> Result<()> {
        let mut mesh = import_first_mesh(&self.model_path)?;
        engine_info!("meshlet3d::Renderer",
            "Loaded {}: {} vertices, {} triangles",
            self.model_path.display(), mesh.vertex_count(), mesh.triangle_count());

        // The renderer takes the mesh; the log needs its bound afterwards
        let aabb = if self.visibility_stats { Some(Aabb::generate(&mesh.vertices)?) } else { None };

        let size = self.window_state.borrow().size();
        let renderer = VulkanRenderer::new(&*self.window, size, self.config.clone(), &mut mesh)?;
        self.visibility = aabb.map(|aabb| {
            VisibilityLog::new(&aabb, &self.config, &renderer.stats(), VisibilityLog::DEFAULT_INTERVAL)
        });
        self.renderer = Some(renderer);
        Ok(())
    }

    fn update(&mut self, _dt: f32) -> UpdateStatus {
        let Some(renderer) = self.renderer.as_mut() else {
            engine_error!("meshlet3d::Renderer", "Update before a successful init");
            return UpdateStatus::Error;
        };

        if let Some((width, height)) = self.window_state.borrow_mut().take_resize() {
            renderer.resize(width, height);
        }

        let view = FrameView::from_camera(&self.camera.borrow());
        match renderer.render_frame(&view) {
            Ok(FrameStatus::SwapchainRecreated { width, height }) => {
                engine_debug!("meshlet3d::Renderer", "Swapchain now {}x{}", width, height);
                self.camera.borrow_mut().set_aspect_ratio(width, height);
                UpdateStatus::Continue
            }
            Ok(FrameStatus::Presented) => {
                if let Some(log) = self.visibility.as_mut() {
                    log.log_frame(&view.frustum);
                }
                UpdateStatus::Continue
            }
            Ok(FrameStatus::Skipped) => UpdateStatus::Continue,
            Err(e) => {
                engine_error!("meshlet3d::Renderer", "Frame failed: {}", e);
                UpdateStatus::Error
            }
        }
    }

    fn clean_up(&mut self) -> Result<()> {
        let renderer = self.renderer.take()
            .ok_or_else(|| Error::BackendError("Renderer was never initialized".to_string()))?;
        renderer.wait_idle()?;

        let stats = renderer.stats();
        engine_info!("meshlet3d::Renderer",
            "{} frames presented, {} skipped, {} instances of {} meshlets",
            stats.frames_presented, stats.frames_skipped, stats.instance_count, stats.meshlet_count);
        Ok(())
    }
}
