//! Common utilities for material integration tests.
//!
//! Tests run against the dummy backend, which records every driver call so
//! assertions can be made on compile/link counts, bound units and uniform
//! writes.

use std::sync::Arc;

use chroma_core::math::Vec3;
use chroma_graphics::{
    CapabilityCheck, DummyBackend, GraphicsDevice, Light, Material, MaterialPlugin, PluginKey,
    ShaderFragment, Texture, TextureId, TextureType,
};
use chroma_graphics::materials::InsertLocation;

// ============================================================================
// Test Context
// ============================================================================

/// Test context owning a dummy backend and the device over it.
pub struct TestContext {
    /// The backend, kept concrete for its inspection methods.
    pub backend: Arc<DummyBackend>,
    /// Device handed to materials.
    pub device: Arc<GraphicsDevice>,
}

impl TestContext {
    /// A context reporting `units` texture image units.
    pub fn new(units: u32) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let backend = Arc::new(DummyBackend::new().with_max_texture_image_units(units));
        let device = GraphicsDevice::new(backend.clone());
        Self { backend, device }
    }

    /// Capability check with the device's current limit.
    pub fn immediate(&self) -> CapabilityCheck {
        CapabilityCheck::Immediate(
            self.device
                .capabilities()
                .expect("dummy backend has a context"),
        )
    }

    /// A composed material using [`immediate`](Self::immediate) capabilities.
    pub fn material(&self) -> Material {
        Material::new(self.immediate())
    }
}

/// Capability check flavors materials can be created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Limit known at construction.
    Immediate,
    /// Limit learned on `add()`.
    Deferred,
}

impl Check {
    /// A composed material for `ctx`.
    pub fn material(self, ctx: &TestContext) -> Material {
        match self {
            Check::Immediate => ctx.material(),
            Check::Deferred => Material::new(CapabilityCheck::Deferred),
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A texture with an uploaded GPU id.
pub fn texture(name: &str, texture_type: TextureType, id: u32) -> Arc<Texture> {
    let texture = Texture::new(name, texture_type);
    texture.set_texture_id(TextureId::from_raw(id));
    Arc::new(texture)
}

/// `count` diffuse textures named `t1`, `t2`, ...
pub fn numbered_textures(count: u32) -> Vec<Arc<Texture>> {
    (1..=count)
        .map(|i| texture(&format!("t{i}"), TextureType::Diffuse, 100 + i))
        .collect()
}

/// A light pointing straight down.
pub fn sun() -> Arc<Light> {
    Arc::new(Light::directional(Vec3::new(0.0, -1.0, 0.0)))
}

// ============================================================================
// Test plugin
// ============================================================================

/// Plugin writing one marker line at a fixed slot.
#[derive(Debug)]
pub struct MarkerPlugin {
    name: String,
    location: InsertLocation,
    body: String,
}

impl MarkerPlugin {
    /// A fragment-stage plugin with a harmless marker statement.
    pub fn new(name: &str, location: InsertLocation) -> Self {
        Self {
            name: name.to_string(),
            location,
            body: format!("gColor.a *= 1.0; // marker {name}"),
        }
    }

    /// A plugin whose body makes the driver reject the shader.
    pub fn broken(name: &str) -> Self {
        Self {
            name: name.to_string(),
            location: InsertLocation::PreAlpha,
            body: "#error broken plugin".to_string(),
        }
    }

    /// Fragment id in the composed source.
    pub fn fragment_id(&self) -> String {
        format!("MARKER_{}", self.name)
    }
}

impl MaterialPlugin for MarkerPlugin {
    fn key(&self) -> PluginKey {
        PluginKey::Custom(self.name.clone())
    }

    fn insert_location(&self) -> InsertLocation {
        self.location
    }

    fn fragment_fragment(&self) -> Option<ShaderFragment> {
        Some(ShaderFragment::new(self.fragment_id()).with_line(self.body.clone()))
    }
}
