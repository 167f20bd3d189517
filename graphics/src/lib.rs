//! # Chroma Graphics
//!
//! Material engine: turns declarative surface descriptions into compiled,
//! linked GLSL ES programs and rebuilds them lazily when they change.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`Material`] - Textures, lighting, methods and plugins, built on demand
//! - [`shader`] - GLSL model: templates, immutable fragments, linearization
//! - [`GpuBackend`] - Driver boundary, with a recording [`DummyBackend`] and
//!   an OpenGL ES backend behind the `gl-backend` feature
//! - [`MaterialRegistry`] - Per-renderer ownership of materials
//!
//! ## Example
//!
//! ```ignore
//! use chroma_graphics::{CapabilityCheck, DummyBackend, GraphicsDevice, Material, MaterialRegistry};
//!
//! let device = GraphicsDevice::new(Arc::new(DummyBackend::new()));
//! let mut registry = MaterialRegistry::new(device.clone());
//!
//! let mut material = Material::new(CapabilityCheck::Immediate(device.capabilities()?));
//! material.add_texture(earth)?;
//! let id = registry.insert(material)?;
//!
//! let material = registry.get_mut(id).unwrap();
//! material.use_program()?;
//! material.bind_textures();
//! material.apply_params();
//! ```

pub mod backend;
pub mod compiler;
pub mod device;
pub mod error;
pub mod materials;
pub mod profiling;
pub mod resources;
pub mod scene;
pub mod shader;

// Re-export main types for convenience
pub use backend::{DummyBackend, GpuBackend, ProgramHandle, TextureId, UniformValue};
pub use compiler::{BuildOutcome, LinkedProgram, build_program};
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use error::{GraphicsError, MaterialError};
pub use materials::{
    BuildState, CapabilityCheck, InsertLocation, Material, MaterialId, MaterialPlugin,
    MaterialRegistry, PluginKey,
};
pub use resources::{EnvironmentUsage, Texture, TextureTarget, TextureType};
pub use scene::{Light, LightKind};
pub use shader::{Shader, ShaderFragment, ShaderStage};

#[cfg(feature = "gl-backend")]
pub use backend::GlBackend;

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    log::info!("Chroma Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_dummy_backend() {
        let backend = DummyBackend::new();
        assert_eq!(backend.name(), "Dummy Backend");
    }
}
