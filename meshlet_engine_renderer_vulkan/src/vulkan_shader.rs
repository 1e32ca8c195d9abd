/// Shader modules loaded from SPIR-V files
///
/// Each module is reflected with spirq after loading. The descriptor
/// bindings it declares are compared with the layout the pipeline is built
/// from; differences are only warned about, the declared layout wins.

use meshlet_engine::meshlet3d::{Result, Error};
use meshlet_engine::{engine_debug, engine_error, engine_warn, engine_err};
use ash::vk;
use std::path::Path;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_pipeline::BindingSpec;

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// One descriptor binding found in a SPIR-V module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflectedBinding {
    pub set: u32,
    pub binding: u32,
    pub descriptor_type: vk::DescriptorType,
}

/// Decode SPIR-V bytes into words, checking size and magic number
pub fn spirv_words(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        engine_warn!("meshlet3d::vulkan",
            "Shader code not 4-byte aligned (size: {} bytes)", bytes.len());
        return Err(Error::InvalidResource(format!(
            "SPIR-V size {} is not a multiple of 4", bytes.len()
        )));
    }
    let words = ash::util::read_spv(&mut std::io::Cursor::new(bytes))
        .map_err(|e| Error::InvalidResource(format!("Unreadable SPIR-V: {}", e)))?;
    if words.first() != Some(&SPIRV_MAGIC) {
        return Err(Error::InvalidResource("Missing SPIR-V magic number".to_string()));
    }
    Ok(words)
}

/// Descriptor bindings declared by every entry point of `code`
pub fn reflect_bindings(code: &[u32]) -> Result<Vec<ReflectedBinding>> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| engine_err!("meshlet3d::vulkan", "SPIR-V reflection failed: {:?}", e))?;

    let mut bindings = Vec::new();
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            if let spirq::var::Variable::Descriptor { desc_bind, desc_ty, .. } = var {
                let descriptor_type = match desc_ty {
                    spirq::ty::DescriptorType::UniformBuffer() => vk::DescriptorType::UNIFORM_BUFFER,
                    spirq::ty::DescriptorType::StorageBuffer(..) => vk::DescriptorType::STORAGE_BUFFER,
                    other => {
                        engine_warn!("meshlet3d::vulkan",
                            "Ignoring unsupported descriptor type {:?} at binding {}", other, desc_bind.bind());
                        continue;
                    }
                };
                let reflected = ReflectedBinding {
                    set: desc_bind.set(),
                    binding: desc_bind.bind(),
                    descriptor_type,
                };
                if !bindings.contains(&reflected) {
                    bindings.push(reflected);
                }
            }
        }
    }
    Ok(bindings)
}

/// Human-readable differences between what a `stage` shader declares and
/// the layout it will be bound with
pub fn binding_mismatches(
    reflected: &[ReflectedBinding],
    layout: &[BindingSpec],
    stage: vk::ShaderStageFlags,
) -> Vec<String> {
    let mut mismatches = Vec::new();
    for binding in reflected {
        if binding.set != 0 {
            mismatches.push(format!("binding {} uses set {}, only set 0 is bound", binding.binding, binding.set));
            continue;
        }
        match layout.iter().find(|entry| entry.binding == binding.binding) {
            None => mismatches.push(format!("binding {} is not in the layout", binding.binding)),
            Some(entry) => {
                if entry.descriptor_type != binding.descriptor_type {
                    mismatches.push(format!(
                        "binding {} is {:?} in the shader but {:?} in the layout",
                        binding.binding, binding.descriptor_type, entry.descriptor_type
                    ));
                }
                if !entry.stages.contains(stage) {
                    mismatches.push(format!(
                        "binding {} is not visible to {:?} in the layout", binding.binding, stage
                    ));
                }
            }
        }
    }
    mismatches
}

/// Vulkan shader module
pub struct Shader {
    pub(crate) module: vk::ShaderModule,
    pub(crate) stage: vk::ShaderStageFlags,
    ctx: Arc<GpuContext>,
}

impl Shader {
    /// Load `path`, create the module and check it against `layout`
    pub fn load(
        ctx: &Arc<GpuContext>,
        path: &Path,
        stage: vk::ShaderStageFlags,
        layout: &[BindingSpec],
    ) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            engine_error!("meshlet3d::vulkan", "Failed to read shader {}: {}", path.display(), e);
            Error::InitializationFailed(format!("Failed to read shader {}: {}", path.display(), e))
        })?;
        let code = spirv_words(&bytes)?;

        match reflect_bindings(&code) {
            Ok(reflected) => {
                for mismatch in binding_mismatches(&reflected, layout, stage) {
                    engine_warn!("meshlet3d::vulkan", "{}: {}", path.display(), mismatch);
                }
                engine_debug!("meshlet3d::vulkan",
                    "Loaded {} ({:?}, {} bindings)", path.display(), stage, reflected.len());
            }
            Err(_) => {
                engine_warn!("meshlet3d::vulkan", "{}: skipping binding check", path.display());
            }
        }

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe { ctx.device.create_shader_module(&create_info, None) }
            .map_err(|e| {
                engine_error!("meshlet3d::vulkan", "Failed to create shader module {}: {:?}", path.display(), e);
                Error::InitializationFailed(format!("Failed to create shader module: {:?}", e))
            })?;

        Ok(Self {
            module,
            stage,
            ctx: Arc::clone(ctx),
        })
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_shader_tests.rs"]
mod tests;
