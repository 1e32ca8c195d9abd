/// Viewer configuration and command line

use clap::Parser;
use meshlet_engine::meshlet3d::render::RendererConfig;
use std::path::PathBuf;

/// Draws a field of instances of one glTF model with GPU frustum culling
/// and mesh shaders
#[derive(Debug, Parser)]
#[command(name = "meshlet_viewer", version)]
pub struct Args {
    /// glTF model to instance
    #[arg(long, default_value = ViewerConfig::DEFAULT_MODEL)]
    pub model: PathBuf,

    /// Number of instances
    #[arg(
        long,
        default_value_t = RendererConfig::DEFAULT_INSTANCE_COUNT,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub instances: u32,

    /// Instance placement seed
    #[arg(long, default_value_t = RendererConfig::DEFAULT_PLACEMENT_SEED)]
    pub seed: u64,

    /// Directory holding the compiled .spv shaders
    #[arg(long)]
    pub shaders: Option<PathBuf>,

    /// Enable the Vulkan validation layer and its shutdown report
    #[arg(long)]
    pub validation: bool,

    /// Periodically log how many instances survive frustum culling
    #[arg(long)]
    pub visibility_stats: bool,
}

/// Window, asset and renderer settings
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub model_path: PathBuf,
    pub visibility_stats: bool,
    pub renderer: RendererConfig,
}

impl ViewerConfig {
    pub const DEFAULT_MODEL: &'static str = "assets/Duck/Duck.gltf";
    pub const DEFAULT_SIZE: u32 = 700;
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Meshlet Viewer".to_string(),
            width: Self::DEFAULT_SIZE,
            height: Self::DEFAULT_SIZE,
            resizable: true,
            model_path: PathBuf::from(Self::DEFAULT_MODEL),
            visibility_stats: false,
            renderer: RendererConfig {
                shader_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders")),
                ..RendererConfig::default()
            },
        }
    }
}

impl From<Args> for ViewerConfig {
    fn from(args: Args) -> Self {
        let mut config = Self::default();
        config.model_path = args.model;
        config.visibility_stats = args.visibility_stats;
        config.renderer.instance_count = args.instances;
        config.renderer.placement_seed = args.seed;
        if let Some(shaders) = args.shaders {
            config.renderer.shader_dir = shaders;
        }
        if args.validation {
            config.renderer.enable_validation = true;
            config.renderer.enable_validation_stats = true;
        }
        config
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
