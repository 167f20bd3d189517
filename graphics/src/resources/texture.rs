//! Texture references and their semantic roles.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::backend::TextureId;
use crate::materials::MaterialId;
use crate::shader::GlslType;

/// Semantic role of a texture, driving which fragment samples it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    /// Base color.
    Diffuse,
    /// Tangent-space normal map.
    Normal,
    /// Specular intensity map, consumed by the specular method.
    Specular,
    /// Alpha mask; fragments below the threshold are discarded.
    Alpha,
    /// Baked lighting multiplied over the lit color.
    Light,
    /// Six-sided cube map (sky box or environment reflection).
    CubeMap,
    /// Single 2D sphere map (sky or environment reflection).
    SphereMap,
    /// External video frames; sampled like a diffuse texture.
    VideoTexture,
    /// Output of an offscreen pass; sampled like a diffuse texture.
    RenderTarget,
    /// Data table for a plugin; never composed by the material.
    Lookup,
}

/// GL binding target of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    /// `GL_TEXTURE_2D`
    Texture2d,
    /// `GL_TEXTURE_CUBE_MAP`
    CubeMap,
    /// `GL_TEXTURE_EXTERNAL_OES`
    ExternalOes,
}

/// How a cube or sphere map is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnvironmentUsage {
    /// Reflected on the surface.
    #[default]
    Environment,
    /// Drawn as the background of a sky box or sky dome.
    Sky,
}

/// A texture shared between the scene and any number of materials.
///
/// The sampler uniform in composed shaders is named after the texture, so
/// `name` must be a valid GLSL identifier that is unique within a material.
///
/// # Example
///
/// ```ignore
/// let earth = Arc::new(Texture::new("earth", TextureType::Diffuse));
/// earth.set_texture_id(TextureId::from_raw(gl_id));
/// material.add_texture(earth)?;
/// ```
#[derive(Debug)]
pub struct Texture {
    name: String,
    texture_type: TextureType,
    usage: EnvironmentUsage,
    id: AtomicU32,
    influence: Mutex<f32>,
    materials: Mutex<Vec<MaterialId>>,
}

impl Texture {
    /// Create a texture reference without a GPU object yet.
    pub fn new(name: impl Into<String>, texture_type: TextureType) -> Self {
        Self {
            name: name.into(),
            texture_type,
            usage: EnvironmentUsage::default(),
            id: AtomicU32::new(0),
            influence: Mutex::new(1.0),
            materials: Mutex::new(Vec::new()),
        }
    }

    /// Set how a cube or sphere map is used. Ignored for other types.
    pub fn with_environment_usage(mut self, usage: EnvironmentUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Set the initial influence.
    pub fn with_influence(mut self, influence: f32) -> Self {
        *self.influence.get_mut() = influence;
        self
    }

    /// Sampler uniform name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic role.
    pub fn texture_type(&self) -> TextureType {
        self.texture_type
    }

    /// Binding target, derived from the role.
    pub fn target(&self) -> TextureTarget {
        match self.texture_type {
            TextureType::CubeMap => TextureTarget::CubeMap,
            TextureType::VideoTexture => TextureTarget::ExternalOes,
            _ => TextureTarget::Texture2d,
        }
    }

    /// GLSL sampler type matching [`target`](Self::target).
    pub fn sampler_type(&self) -> GlslType {
        match self.target() {
            TextureTarget::Texture2d => GlslType::Sampler2d,
            TextureTarget::CubeMap => GlslType::SamplerCube,
            TextureTarget::ExternalOes => GlslType::SamplerExternalOes,
        }
    }

    /// Whether a cube or sphere map is drawn as a sky.
    pub fn is_sky_texture(&self) -> bool {
        self.usage == EnvironmentUsage::Sky
    }

    /// Name of the float uniform carrying this texture's influence.
    pub fn influence_uniform(&self) -> String {
        format!("uInfluence{}", self.name)
    }

    /// GPU object, once uploaded.
    pub fn texture_id(&self) -> Option<TextureId> {
        TextureId::from_raw(self.id.load(Ordering::Acquire))
    }

    /// Record the GPU object created by the uploader, or clear it.
    pub fn set_texture_id(&self, id: Option<TextureId>) {
        let raw = id.map_or(0, |id| id.0.get());
        self.id.store(raw, Ordering::Release);
    }

    /// Blend weight applied when sampling.
    pub fn influence(&self) -> f32 {
        *self.influence.lock()
    }

    /// Set the blend weight; takes effect on the next parameter push.
    pub fn set_influence(&self, influence: f32) {
        *self.influence.lock() = influence;
    }

    /// Record that `material` references this texture.
    pub fn register_material(&self, material: MaterialId) {
        let mut materials = self.materials.lock();
        if !materials.contains(&material) {
            materials.push(material);
        }
    }

    /// Forget `material`.
    pub fn unregister_material(&self, material: MaterialId) {
        self.materials.lock().retain(|m| *m != material);
    }

    /// Materials currently referencing this texture.
    pub fn registered_materials(&self) -> Vec<MaterialId> {
        self.materials.lock().clone()
    }
}

static_assertions::assert_impl_all!(Texture: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_follows_type() {
        assert_eq!(
            Texture::new("sky", TextureType::CubeMap).target(),
            TextureTarget::CubeMap
        );
        assert_eq!(
            Texture::new("video", TextureType::VideoTexture).sampler_type(),
            GlslType::SamplerExternalOes
        );
        assert_eq!(
            Texture::new("env", TextureType::SphereMap).target(),
            TextureTarget::Texture2d
        );
    }

    #[test]
    fn test_texture_id_roundtrip() {
        let texture = Texture::new("earth", TextureType::Diffuse);
        assert_eq!(texture.texture_id(), None);
        let id = TextureId::from_raw(12);
        texture.set_texture_id(id);
        assert_eq!(texture.texture_id(), id);
        texture.set_texture_id(None);
        assert_eq!(texture.texture_id(), None);
    }

    #[test]
    fn test_material_registration_is_a_set() {
        let texture = Texture::new("earth", TextureType::Diffuse);
        let a = MaterialId::next();
        let b = MaterialId::next();
        texture.register_material(a);
        texture.register_material(a);
        texture.register_material(b);
        assert_eq!(texture.registered_materials(), vec![a, b]);
        texture.unregister_material(a);
        assert_eq!(texture.registered_materials(), vec![b]);
    }

    #[test]
    fn test_sky_flag() {
        let sky = Texture::new("sky", TextureType::CubeMap)
            .with_environment_usage(EnvironmentUsage::Sky);
        assert!(sky.is_sky_texture());
        assert!(!Texture::new("env", TextureType::CubeMap).is_sky_texture());
        assert_eq!(
            Texture::new("earth", TextureType::Diffuse).influence_uniform(),
            "uInfluenceearth"
        );
    }
}
