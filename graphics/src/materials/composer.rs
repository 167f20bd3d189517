//! Shader composition.
//!
//! Turns a material's declarative inputs into a vertex/fragment shader pair.
//! The order in which fragments are appended is fixed:
//!
//! 1. texture sampling (diffuse, normal, environment, sky)
//! 2. [`InsertLocation::PreLighting`] plugins
//! 3. if lit: light setup, `PreDiffuse` plugins, diffuse method,
//!    `PreSpecular` plugins, specular method
//! 4. `PreAlpha` plugins, alpha masks, light maps
//! 5. `PreTransform` plugins, then `PostTransform` plugins
//!
//! Fragments for a texture role are only appended when the role has at least
//! one texture. Lighting only composes when it is enabled and there is at
//! least one light.

use std::sync::Arc;

use chroma_core::profiling::profile_function;

use crate::resources::Texture;
use crate::scene::Light;
use crate::shader::fragments::{self, EXTERNAL_IMAGE_DIRECTIVE};
use crate::shader::{InsertLocation, Shader, ShaderFeatures, templates};

use super::classifier::{ClassifiedTextures, classify};
use super::methods::{DiffuseMethod, SpecularMethod};
use super::plugins::MaterialPlugin;

/// Everything composition depends on.
#[derive(Debug, Clone, Copy)]
pub struct CompositionInput<'a> {
    /// The material's textures, in insertion order.
    pub textures: &'a [Arc<Texture>],
    /// Lighting toggle.
    pub lighting_enabled: bool,
    /// Lights referenced by the material.
    pub lights: &'a [Arc<Light>],
    /// Diffuse method.
    pub diffuse: Option<&'a Arc<dyn DiffuseMethod>>,
    /// Specular method.
    pub specular: Option<&'a Arc<dyn SpecularMethod>>,
    /// Plugins, in registration order.
    pub plugins: &'a [Arc<dyn MaterialPlugin>],
    /// Declare `uTime`.
    pub time_enabled: bool,
    /// Take the base color from vertex colors.
    pub use_vertex_colors: bool,
}

impl CompositionInput<'_> {
    /// Whether the lighting fragments take part in composition.
    pub fn composes_lighting(&self) -> bool {
        self.lighting_enabled && !self.lights.is_empty()
    }
}

/// Output of [`compose`]: both stages, built.
#[derive(Debug)]
pub struct ComposedShaders {
    /// Vertex stage.
    pub vertex: Shader,
    /// Fragment stage.
    pub fragment: Shader,
    /// The texture partition composition was based on.
    pub classified: ClassifiedTextures,
}

impl ComposedShaders {
    /// Built vertex source.
    pub fn vertex_source(&self) -> &str {
        self.vertex.source().unwrap_or_default()
    }

    /// Built fragment source.
    pub fn fragment_source(&self) -> &str {
        self.fragment.source().unwrap_or_default()
    }
}

fn insert_plugins(
    vertex: &mut Shader,
    fragment: &mut Shader,
    plugins: &[Arc<dyn MaterialPlugin>],
    location: InsertLocation,
) {
    for plugin in plugins.iter().filter(|p| p.insert_location() == location) {
        if let Some(f) = plugin.vertex_fragment() {
            vertex.add_fragment(f.with_location(location));
        }
        if let Some(f) = plugin.fragment_fragment() {
            fragment.add_fragment(f.with_location(location));
        }
    }
}

/// Compose and build the shader pair for `input`.
pub fn compose(input: &CompositionInput<'_>) -> ComposedShaders {
    profile_function!();
    let classified = classify(input.textures);

    // Templates depend on the features, so they are fixed before any fragment.
    let mut features = ShaderFeatures::empty();
    features.set(ShaderFeatures::TIME, input.time_enabled);
    features.set(ShaderFeatures::CUBE_MAPS, classified.has_cube_maps);
    let fragment_features = features;
    features.set(ShaderFeatures::SKY_TEXTURE, classified.has_sky_texture());
    features.set(ShaderFeatures::VERTEX_COLORS, input.use_vertex_colors);

    let mut vertex = Shader::from_template(templates::vertex(features));
    let mut fragment = Shader::from_template(templates::fragment(fragment_features));
    vertex.initialize();
    fragment.initialize();

    if classified.has_video_texture {
        fragment.add_directive(EXTERNAL_IMAGE_DIRECTIVE);
    }

    if !classified.diffuse.is_empty() {
        fragment.add_fragment(fragments::diffuse_textures(&classified.diffuse));
    }
    if !classified.normal.is_empty() {
        fragment.add_fragment(fragments::normal_maps(&classified.normal));
    }
    if !classified.environment.is_empty() {
        fragment.add_fragment(fragments::environment_maps(&classified.environment));
    }
    if !classified.sky.is_empty() {
        fragment.add_fragment(fragments::sky_textures(&classified.sky));
    }

    insert_plugins(&mut vertex, &mut fragment, input.plugins, InsertLocation::PreLighting);

    if input.composes_lighting() {
        vertex.add_fragment(fragments::lights_vertex());
        fragment.add_fragment(fragments::lights_fragment(input.lights));

        insert_plugins(&mut vertex, &mut fragment, input.plugins, InsertLocation::PreDiffuse);
        if let Some(diffuse) = input.diffuse {
            if let Some(f) = diffuse.vertex_fragment(input.lights) {
                vertex.add_fragment(f);
            }
            fragment.add_fragment(diffuse.fragment_fragment(input.lights));
        }

        insert_plugins(&mut vertex, &mut fragment, input.plugins, InsertLocation::PreSpecular);
        if let Some(specular) = input.specular {
            if let Some(f) = specular.vertex_fragment(input.lights) {
                vertex.add_fragment(f);
            }
            if let Some(f) = specular.fragment_fragment(input.lights, &classified.specular) {
                fragment.add_fragment(f);
            }
        }
    }

    insert_plugins(&mut vertex, &mut fragment, input.plugins, InsertLocation::PreAlpha);
    if !classified.alpha.is_empty() {
        fragment.add_fragment(fragments::alpha_masks(&classified.alpha));
    }
    if !classified.light.is_empty() {
        fragment.add_fragment(fragments::light_maps(&classified.light));
    }

    insert_plugins(&mut vertex, &mut fragment, input.plugins, InsertLocation::PreTransform);
    insert_plugins(&mut vertex, &mut fragment, input.plugins, InsertLocation::PostTransform);

    vertex.build();
    fragment.build();
    log::debug!(
        "Composed {} vertex and {} fragment fragments",
        vertex.fragments().len(),
        fragment.fragments().len()
    );

    ComposedShaders {
        vertex,
        fragment,
        classified,
    }
}

#[cfg(test)]
mod tests {
    use chroma_core::math::Vec3;

    use super::*;
    use crate::materials::methods::{Lambert, Phong};
    use crate::materials::plugins::{FresnelPlugin, VertexWavePlugin};
    use crate::resources::{EnvironmentUsage, TextureType};
    use crate::shader::fragments::{
        ALPHA_MASK_FRAGMENT, DIFFUSE_TEXTURE_FRAGMENT, LIGHTS_FRAGMENT, NORMAL_MAP_FRAGMENT,
    };

    fn input<'a>(textures: &'a [Arc<Texture>]) -> CompositionInput<'a> {
        CompositionInput {
            textures,
            lighting_enabled: false,
            lights: &[],
            diffuse: None,
            specular: None,
            plugins: &[],
            time_enabled: false,
            use_vertex_colors: false,
        }
    }

    fn texture(name: &str, texture_type: TextureType) -> Arc<Texture> {
        Arc::new(Texture::new(name, texture_type))
    }

    #[test]
    fn test_empty_roles_add_nothing() {
        let composed = compose(&input(&[]));
        assert!(composed.fragment.fragments().is_empty());
        assert!(composed.vertex.fragments().is_empty());
        assert!(composed.fragment_source().contains("gl_FragColor = gColor;"));
    }

    #[test]
    fn test_texture_fragments_follow_roles() {
        let textures = [
            texture("mask", TextureType::Alpha),
            texture("earth", TextureType::Diffuse),
            texture("bumps", TextureType::Normal),
        ];
        let composed = compose(&input(&textures));
        let ids: Vec<&str> = composed.fragment.fragments().iter().map(|f| f.id()).collect();
        assert_eq!(ids, [DIFFUSE_TEXTURE_FRAGMENT, NORMAL_MAP_FRAGMENT, ALPHA_MASK_FRAGMENT]);
    }

    #[test]
    fn test_video_directive_precedes_sampler() {
        let textures = [texture("video", TextureType::VideoTexture)];
        let composed = compose(&input(&textures));
        let source = composed.fragment_source();
        assert!(source.starts_with(EXTERNAL_IMAGE_DIRECTIVE));
        assert!(
            source.find(EXTERNAL_IMAGE_DIRECTIVE).unwrap()
                < source.find("samplerExternalOES").unwrap()
        );
    }

    #[test]
    fn test_sky_cube_map_switches_vertex_template() {
        let sky = Arc::new(
            Texture::new("skybox", TextureType::CubeMap)
                .with_environment_usage(EnvironmentUsage::Sky),
        );
        let composed = compose(&input(&[sky]));
        assert!(composed.vertex_source().contains("vCubeTextureCoord.x *= -1.0;"));
        assert!(composed.fragment_source().contains("varying vec3 vCubeTextureCoord;"));
    }

    #[test]
    fn test_lighting_needs_a_light() {
        let lambert: Arc<dyn DiffuseMethod> = Arc::new(Lambert::new());
        let mut lit = input(&[]);
        lit.lighting_enabled = true;
        lit.diffuse = Some(&lambert);
        let composed = compose(&lit);
        assert!(!composed.fragment.has_fragment(LIGHTS_FRAGMENT));

        let lights = [Arc::new(Light::directional(Vec3::new(0.0, -1.0, 0.0)))];
        lit.lights = &lights;
        let composed = compose(&lit);
        assert!(composed.fragment.has_fragment(LIGHTS_FRAGMENT));
        assert!(composed.vertex.has_fragment(fragments::LIGHTS_VERTEX_FRAGMENT));
    }

    #[test]
    fn test_methods_ignored_without_lighting() {
        let phong: Arc<dyn SpecularMethod> = Arc::new(Phong::new());
        let lights = [Arc::new(Light::point(Vec3::zeros()))];
        let mut unlit = input(&[]);
        unlit.lights = &lights;
        unlit.specular = Some(&phong);
        let composed = compose(&unlit);
        assert!(!composed.fragment_source().contains("phongSpecular"));
    }

    #[test]
    fn test_plugins_go_to_their_slots() {
        let plugins: Vec<Arc<dyn MaterialPlugin>> = vec![
            Arc::new(VertexWavePlugin::new(0.1, 1.0)),
            Arc::new(FresnelPlugin::new(0xffffffff)),
        ];
        let textures = [texture("mask", TextureType::Alpha)];
        let mut with_plugins = input(&textures);
        with_plugins.plugins = &plugins;
        let composed = compose(&with_plugins);

        let fs = composed.fragment_source();
        assert!(fs.find("// ALPHA_MASK_FRAGMENT").unwrap() < fs.find("// FRESNEL_FRAGMENT").unwrap());

        let vs = composed.vertex_source();
        assert!(vs.find("gl_Position = uMVPMatrix * gPosition;").unwrap() < vs.find("// VERTEX_WAVE_VERTEX").unwrap());
    }

    #[test]
    fn test_time_declared_in_both_stages() {
        let mut timed = input(&[]);
        timed.time_enabled = true;
        let composed = compose(&timed);
        assert!(composed.vertex_source().contains("uniform float uTime;"));
        assert!(composed.fragment_source().contains("uniform float uTime;"));
    }
}
