//! Core fragments composed from a material's textures and lights.
//!
//! Each function returns a fresh immutable [`ShaderFragment`]. Callers only
//! ask for a fragment when its input list is non-empty. Fragment-local
//! variables have distinct names because every body shares `main()`'s scope.

use std::sync::Arc;

use crate::resources::{Texture, TextureTarget};
use crate::scene::{Light, LightKind};

use super::{GlslType, ShaderFragment, ShaderVar};

/// Samples and accumulates diffuse, video and render-target textures.
pub const DIFFUSE_TEXTURE_FRAGMENT: &str = "DIFFUSE_TEXTURE_FRAGMENT";
/// Perturbs the normal with normal maps.
pub const NORMAL_MAP_FRAGMENT: &str = "NORMAL_MAP_FRAGMENT";
/// Adds reflections from environment maps.
pub const ENVIRONMENT_MAP_FRAGMENT: &str = "ENVIRONMENT_MAP_FRAGMENT";
/// Samples sky textures.
pub const SKY_TEXTURE_FRAGMENT: &str = "SKY_TEXTURE_FRAGMENT";
/// Discards masked-out pixels.
pub const ALPHA_MASK_FRAGMENT: &str = "ALPHA_MASK_FRAGMENT";
/// Multiplies baked lighting over the lit color.
pub const LIGHT_MAP_FRAGMENT: &str = "LIGHT_MAP_FRAGMENT";
/// Passes the world position to the fragment stage.
pub const LIGHTS_VERTEX_FRAGMENT: &str = "LIGHTS_VERTEX_FRAGMENT";
/// Computes per-light direction, attenuation and `N.L`.
pub const LIGHTS_FRAGMENT: &str = "LIGHTS_FRAGMENT";

/// Directive enabling `samplerExternalOES`.
pub const EXTERNAL_IMAGE_DIRECTIVE: &str = "#extension GL_OES_EGL_image_external : require";

/// Pixels whose mask value is below this are discarded.
pub const ALPHA_MASK_THRESHOLD: &str = "0.5";

fn with_samplers(mut fragment: ShaderFragment, textures: &[Arc<Texture>]) -> ShaderFragment {
    for texture in textures {
        fragment = fragment
            .with_var(ShaderVar::uniform(texture.sampler_type(), texture.name()))
            .with_var(ShaderVar::uniform(GlslType::Float, texture.influence_uniform()));
    }
    fragment
}

fn sample_2d_or_cube(texture: &Texture, coord_2d: &str, coord_cube: &str) -> String {
    match texture.target() {
        TextureTarget::CubeMap => format!("textureCube({}, {coord_cube})", texture.name()),
        TextureTarget::Texture2d | TextureTarget::ExternalOes => {
            format!("texture2D({}, {coord_2d})", texture.name())
        }
    }
}

/// Diffuse texture sampling.
pub fn diffuse_textures(textures: &[Arc<Texture>]) -> ShaderFragment {
    let mut fragment = with_samplers(ShaderFragment::new(DIFFUSE_TEXTURE_FRAGMENT), textures)
        .with_line("vec4 diffuseTexColor = vec4(0.0);");
    for texture in textures {
        fragment = fragment.with_line(format!(
            "diffuseTexColor += {} * {};",
            sample_2d_or_cube(texture, "gTextureCoord", "vCubeTextureCoord"),
            texture.influence_uniform()
        ));
    }
    fragment.with_line("gColor += diffuseTexColor;")
}

/// Normal map perturbation.
pub fn normal_maps(textures: &[Arc<Texture>]) -> ShaderFragment {
    let mut fragment = with_samplers(ShaderFragment::new(NORMAL_MAP_FRAGMENT), textures)
        .with_line("vec3 bumpNormal = vec3(0.0);");
    for texture in textures {
        fragment = fragment.with_line(format!(
            "bumpNormal += (texture2D({}, gTextureCoord).rgb * 2.0 - 1.0) * {};",
            texture.name(),
            texture.influence_uniform()
        ));
    }
    fragment.with_line("gNormal = normalize(gNormal + bumpNormal);")
}

/// Environment reflections from cube or sphere maps.
pub fn environment_maps(textures: &[Arc<Texture>]) -> ShaderFragment {
    let mut fragment = with_samplers(ShaderFragment::new(ENVIRONMENT_MAP_FRAGMENT), textures)
        .with_line("vec3 reflected = reflect(normalize(vEyeDir), gNormal);")
        .with_line("vec4 envColor = vec4(0.0);");
    for texture in textures {
        fragment = fragment.with_line(format!(
            "envColor += {} * {};",
            sample_2d_or_cube(texture, "reflected.xy * 0.5 + 0.5", "reflected"),
            texture.influence_uniform()
        ));
    }
    fragment.with_line("gColor += envColor;")
}

/// Sky box or sky dome sampling.
pub fn sky_textures(textures: &[Arc<Texture>]) -> ShaderFragment {
    let mut fragment = with_samplers(ShaderFragment::new(SKY_TEXTURE_FRAGMENT), textures)
        .with_line("vec4 skyColor = vec4(0.0);");
    for texture in textures {
        fragment = fragment.with_line(format!(
            "skyColor += {} * {};",
            sample_2d_or_cube(texture, "gTextureCoord", "vCubeTextureCoord"),
            texture.influence_uniform()
        ));
    }
    fragment.with_line("gColor += skyColor;")
}

/// Alpha masking.
pub fn alpha_masks(textures: &[Arc<Texture>]) -> ShaderFragment {
    let mut fragment = with_samplers(ShaderFragment::new(ALPHA_MASK_FRAGMENT), textures)
        .with_var(ShaderVar::constant(
            GlslType::Float,
            "ALPHA_MASK_THRESHOLD",
            ALPHA_MASK_THRESHOLD,
        ))
        .with_line("float alphaMaskValue = 0.0;");
    for texture in textures {
        fragment = fragment.with_line(format!(
            "alphaMaskValue += texture2D({}, gTextureCoord).r * {};",
            texture.name(),
            texture.influence_uniform()
        ));
    }
    fragment.with_line("if (alphaMaskValue < ALPHA_MASK_THRESHOLD) discard;")
}

/// Baked light maps.
pub fn light_maps(textures: &[Arc<Texture>]) -> ShaderFragment {
    let mut fragment = with_samplers(ShaderFragment::new(LIGHT_MAP_FRAGMENT), textures)
        .with_line("vec3 lightMapColor = vec3(0.0);");
    for texture in textures {
        fragment = fragment.with_line(format!(
            "lightMapColor += texture2D({}, gTextureCoord).rgb * {};",
            texture.name(),
            texture.influence_uniform()
        ));
    }
    fragment.with_line("gColor.rgb *= lightMapColor;")
}

/// Ambient light color uniform, shared by the lighting fragments.
pub const AMBIENT_COLOR: &str = "uAmbientColor";
/// Ambient light intensity uniform.
pub const AMBIENT_INTENSITY: &str = "uAmbientIntensity";

/// Vertex-stage lighting setup.
pub fn lights_vertex() -> ShaderFragment {
    ShaderFragment::new(LIGHTS_VERTEX_FRAGMENT)
        .with_var(ShaderVar::varying(GlslType::Vec3, "vWorldPosition"))
        .with_line("vWorldPosition = vec3(uModelMatrix * gPosition);")
}

/// Fragment-stage lighting setup.
///
/// Declares `lightDir<i>`, `attenuation<i>` and `NdotL<i>` globals for every
/// light so diffuse and specular methods can consume them.
pub fn lights_fragment(lights: &[Arc<Light>]) -> ShaderFragment {
    let mut f = ShaderFragment::new(LIGHTS_FRAGMENT)
        .with_var(ShaderVar::varying(GlslType::Vec3, "vWorldPosition"))
        .with_var(ShaderVar::uniform(GlslType::Vec3, AMBIENT_COLOR))
        .with_var(ShaderVar::uniform(GlslType::Vec3, AMBIENT_INTENSITY));

    for (i, light) in lights.iter().enumerate() {
        f = f
            .with_var(ShaderVar::uniform(GlslType::Vec3, format!("uLightColor{i}")))
            .with_var(ShaderVar::uniform(GlslType::Float, format!("uLightPower{i}")))
            .with_var(ShaderVar::global(GlslType::Vec3, format!("lightDir{i}")))
            .with_var(ShaderVar::global(GlslType::Float, format!("attenuation{i}")))
            .with_var(ShaderVar::global(GlslType::Float, format!("NdotL{i}")));

        let kind = light.kind();
        if kind != LightKind::Point {
            f = f.with_var(ShaderVar::uniform(GlslType::Vec3, format!("uLightDirection{i}")));
        }
        if kind != LightKind::Directional {
            f = f
                .with_var(ShaderVar::uniform(GlslType::Vec3, format!("uLightPosition{i}")))
                .with_var(ShaderVar::uniform(GlslType::Vec4, format!("uLightAttenuation{i}")));
        }
        if kind == LightKind::Spot {
            f = f
                .with_var(ShaderVar::uniform(GlslType::Float, format!("uSpotCutoffAngle{i}")))
                .with_var(ShaderVar::uniform(GlslType::Float, format!("uSpotFalloff{i}")));
        }

        match kind {
            LightKind::Directional => {
                f = f
                    .with_line(format!("lightDir{i} = normalize(-uLightDirection{i});"))
                    .with_line(format!("attenuation{i} = 1.0;"));
            }
            LightKind::Point | LightKind::Spot => {
                f = f
                    .with_line(format!(
                        "vec3 lightVector{i} = uLightPosition{i} - vWorldPosition;"
                    ))
                    .with_line(format!("float lightDistance{i} = length(lightVector{i});"))
                    .with_line(format!("lightDir{i} = lightVector{i} / lightDistance{i};"))
                    .with_line(format!(
                        "attenuation{i} = 1.0 / (uLightAttenuation{i}.y + uLightAttenuation{i}.z * lightDistance{i} + uLightAttenuation{i}.w * lightDistance{i} * lightDistance{i});"
                    ));
            }
        }
        if kind == LightKind::Spot {
            f = f
                .with_line(format!(
                    "float spotFactor{i} = dot(-lightDir{i}, normalize(uLightDirection{i}));"
                ))
                .with_line(format!(
                    "float spotCutoff{i} = cos(radians(uSpotCutoffAngle{i}));"
                ))
                .with_line(format!(
                    "if (spotFactor{i} < spotCutoff{i}) {{ attenuation{i} = 0.0; }} else {{ attenuation{i} *= (1.0 - uSpotFalloff{i}) + uSpotFalloff{i} * (spotFactor{i} - spotCutoff{i}) / (1.0 - spotCutoff{i}); }}"
                ));
        }
        f = f.with_line(format!("NdotL{i} = max(dot(gNormal, lightDir{i}), 0.0);"));
    }
    f
}

#[cfg(test)]
mod tests {
    use chroma_core::math::Vec3;

    use super::*;
    use crate::resources::TextureType;

    fn texture(name: &str, texture_type: TextureType) -> Arc<Texture> {
        Arc::new(Texture::new(name, texture_type))
    }

    #[test]
    fn test_diffuse_samples_each_texture_once() {
        let textures = [
            texture("earth", TextureType::Diffuse),
            texture("clouds", TextureType::Diffuse),
        ];
        let fragment = diffuse_textures(&textures);
        let body = fragment.body().join("\n");
        assert_eq!(body.matches("texture2D(earth, gTextureCoord)").count(), 1);
        assert_eq!(body.matches("texture2D(clouds, gTextureCoord)").count(), 1);
        assert!(
            fragment
                .vars()
                .contains(&ShaderVar::uniform(GlslType::Float, "uInfluenceearth"))
        );
    }

    #[test]
    fn test_video_texture_declares_external_sampler() {
        let fragment = diffuse_textures(&[texture("video", TextureType::VideoTexture)]);
        assert!(
            fragment
                .vars()
                .contains(&ShaderVar::uniform(GlslType::SamplerExternalOes, "video"))
        );
    }

    #[test]
    fn test_environment_uses_cube_lookup_for_cube_maps() {
        let fragment = environment_maps(&[texture("env", TextureType::CubeMap)]);
        assert!(
            fragment
                .body()
                .iter()
                .any(|line| line.contains("textureCube(env, reflected)"))
        );
    }

    #[test]
    fn test_alpha_mask_declares_threshold() {
        let fragment = alpha_masks(&[texture("mask", TextureType::Alpha)]);
        assert!(fragment.vars().iter().any(|v| v.name == "ALPHA_MASK_THRESHOLD"));
        assert!(fragment.body().last().unwrap().contains("discard"));
    }

    #[test]
    fn test_lights_fragment_per_kind_uniforms() {
        let lights = [
            Arc::new(Light::directional(Vec3::new(0.0, -1.0, 0.0))),
            Arc::new(Light::point(Vec3::zeros())),
            Arc::new(Light::spot(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0))),
        ];
        let fragment = lights_fragment(&lights);
        let names: Vec<&str> = fragment.vars().iter().map(|v| v.name.as_str()).collect();
        assert!(names.contains(&"uLightDirection0"));
        assert!(!names.contains(&"uLightPosition0"));
        assert!(names.contains(&"uLightAttenuation1"));
        assert!(!names.contains(&"uLightDirection1"));
        assert!(names.contains(&"uSpotCutoffAngle2"));
        assert!(names.contains(&"NdotL2"));
    }
}
