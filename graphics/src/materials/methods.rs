//! Diffuse and specular lighting methods.
//!
//! A method contributes the lighting equation to a lit material. It reads the
//! per-light globals written by [`lights_fragment`] (`lightDir<i>`,
//! `attenuation<i>`, `NdotL<i>`) and writes into `gColor`.
//!
//! Methods are shared between materials as `Arc<dyn DiffuseMethod>` /
//! `Arc<dyn SpecularMethod>`. Their parameters are per-frame values and take
//! `&self`; changing them never requires a rebuild.
//!
//! [`lights_fragment`]: crate::shader::fragments::lights_fragment

use std::fmt::Debug;
use std::sync::Arc;

use chroma_core::color::argb_to_rgb;
use parking_lot::Mutex;

use crate::backend::UniformValue;
use crate::resources::Texture;
use crate::scene::Light;
use crate::shader::fragments::{AMBIENT_COLOR, AMBIENT_INTENSITY};
use crate::shader::{GlslType, ShaderFragment, ShaderVar};

use super::ProgramUniforms;

/// Lambert diffuse term.
pub const LAMBERT_FRAGMENT: &str = "LAMBERT_FRAGMENT";
/// Banded toon diffuse term.
pub const TOON_FRAGMENT: &str = "TOON_FRAGMENT";
/// Phong specular term.
pub const PHONG_FRAGMENT: &str = "PHONG_FRAGMENT";
/// Cook-Torrance specular term.
pub const COOK_TORRANCE_FRAGMENT: &str = "COOK_TORRANCE_FRAGMENT";

/// Strategy computing the diffuse part of the lighting equation.
pub trait DiffuseMethod: Send + Sync + Debug {
    /// Short name, for logs.
    fn name(&self) -> &'static str;

    /// Optional vertex-stage contribution.
    fn vertex_fragment(&self, _lights: &[Arc<Light>]) -> Option<ShaderFragment> {
        None
    }

    /// Fragment-stage contribution. Always present.
    fn fragment_fragment(&self, lights: &[Arc<Light>]) -> ShaderFragment;

    /// Push per-frame uniforms into the bound program.
    fn apply_params(&self, _uniforms: &mut ProgramUniforms<'_>) {}
}

/// Strategy computing the specular part of the lighting equation.
pub trait SpecularMethod: Send + Sync + Debug {
    /// Short name, for logs.
    fn name(&self) -> &'static str;

    /// Optional vertex-stage contribution.
    fn vertex_fragment(&self, _lights: &[Arc<Light>]) -> Option<ShaderFragment> {
        None
    }

    /// Optional fragment-stage contribution. `specular_maps` are the
    /// material's specular textures, already bound by the material.
    fn fragment_fragment(
        &self,
        lights: &[Arc<Light>],
        specular_maps: &[Arc<Texture>],
    ) -> Option<ShaderFragment>;

    /// Push per-frame uniforms into the bound program.
    fn apply_params(&self, _uniforms: &mut ProgramUniforms<'_>) {}
}

fn light_energy(i: usize) -> String {
    format!("uLightColor{i} * uLightPower{i} * attenuation{i}")
}

/// Sample the specular maps into `gSpecularValue`.
fn with_specular_maps(mut fragment: ShaderFragment, maps: &[Arc<Texture>]) -> ShaderFragment {
    if maps.is_empty() {
        return fragment;
    }
    fragment = fragment.with_line("float specMapValue = 0.0;");
    for map in maps {
        fragment = fragment
            .with_var(ShaderVar::uniform(map.sampler_type(), map.name()))
            .with_var(ShaderVar::uniform(GlslType::Float, map.influence_uniform()))
            .with_line(format!(
                "specMapValue += texture2D({}, gTextureCoord).r * {};",
                map.name(),
                map.influence_uniform()
            ));
    }
    fragment.with_line("gSpecularValue = specMapValue;")
}

/// Lambertian diffuse with ambient light.
#[derive(Debug)]
pub struct Lambert {
    intensity: Mutex<f32>,
}

impl Default for Lambert {
    fn default() -> Self {
        Self::new()
    }
}

impl Lambert {
    /// Lambert with intensity `0.8`.
    pub fn new() -> Self {
        Self {
            intensity: Mutex::new(0.8),
        }
    }

    /// Diffuse intensity.
    pub fn intensity(&self) -> f32 {
        *self.intensity.lock()
    }

    /// Set the diffuse intensity.
    pub fn set_intensity(&self, intensity: f32) {
        *self.intensity.lock() = intensity;
    }
}

impl DiffuseMethod for Lambert {
    fn name(&self) -> &'static str {
        "Lambert"
    }

    fn fragment_fragment(&self, lights: &[Arc<Light>]) -> ShaderFragment {
        let mut fragment = ShaderFragment::new(LAMBERT_FRAGMENT)
            .with_var(ShaderVar::uniform(GlslType::Float, "uDiffuseIntensity"))
            .with_line("vec3 diffuse = vec3(0.0);");
        for i in 0..lights.len() {
            fragment = fragment.with_line(format!("diffuse += NdotL{i} * {};", light_energy(i)));
        }
        fragment
            .with_line(format!("vec3 ambient = {AMBIENT_COLOR} * {AMBIENT_INTENSITY};"))
            .with_line("gColor.rgb *= diffuse * uDiffuseIntensity + ambient;")
    }

    fn apply_params(&self, uniforms: &mut ProgramUniforms<'_>) {
        uniforms.set("uDiffuseIntensity", UniformValue::Float(self.intensity()));
    }
}

/// Toon shading: the summed light intensity picks one of four colors.
#[derive(Debug)]
pub struct Toon {
    colors: Mutex<[[f32; 4]; 4]>,
}

impl Default for Toon {
    fn default() -> Self {
        Self::new()
    }
}

impl Toon {
    /// Toon with bands fading from white to dark grey.
    pub fn new() -> Self {
        Self {
            colors: Mutex::new([
                [1.0, 1.0, 1.0, 1.0],
                [0.6, 0.6, 0.6, 1.0],
                [0.4, 0.4, 0.4, 1.0],
                [0.2, 0.2, 0.2, 1.0],
            ]),
        }
    }

    /// Set the four band colors, brightest first, as ARGB.
    pub fn set_colors(&self, colors: [u32; 4]) {
        *self.colors.lock() = colors.map(chroma_core::color::argb_to_rgba);
    }

    /// The band colors as RGBA.
    pub fn colors(&self) -> [[f32; 4]; 4] {
        *self.colors.lock()
    }
}

impl DiffuseMethod for Toon {
    fn name(&self) -> &'static str {
        "Toon"
    }

    fn fragment_fragment(&self, lights: &[Arc<Light>]) -> ShaderFragment {
        let mut fragment = ShaderFragment::new(TOON_FRAGMENT);
        for band in 0..4 {
            fragment = fragment.with_var(ShaderVar::uniform(GlslType::Vec4, format!("uToonColor{band}")));
        }
        fragment = fragment.with_line("float toonIntensity = 0.0;");
        for i in 0..lights.len() {
            fragment = fragment.with_line(format!(
                "toonIntensity += NdotL{i} * uLightPower{i} * attenuation{i};"
            ));
        }
        fragment
            .with_line("vec4 toonColor = uToonColor3;")
            .with_line("if (toonIntensity > 0.95) toonColor = uToonColor0;")
            .with_line("else if (toonIntensity > 0.5) toonColor = uToonColor1;")
            .with_line("else if (toonIntensity > 0.25) toonColor = uToonColor2;")
            .with_line("gColor.rgb *= toonColor.rgb;")
    }

    fn apply_params(&self, uniforms: &mut ProgramUniforms<'_>) {
        for (band, color) in self.colors().into_iter().enumerate() {
            uniforms.set(&format!("uToonColor{band}"), UniformValue::Vec4(color));
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PhongParams {
    color: [f32; 3],
    shininess: f32,
    intensity: f32,
}

/// Phong specular highlights.
#[derive(Debug)]
pub struct Phong {
    params: Mutex<PhongParams>,
}

impl Default for Phong {
    fn default() -> Self {
        Self::new()
    }
}

impl Phong {
    /// White highlights, shininess `96`, intensity `1`.
    pub fn new() -> Self {
        Self {
            params: Mutex::new(PhongParams {
                color: [1.0, 1.0, 1.0],
                shininess: 96.0,
                intensity: 1.0,
            }),
        }
    }

    /// Phong with an ARGB highlight color and shininess.
    pub fn with_color(color: u32, shininess: f32) -> Self {
        let phong = Self::new();
        phong.set_color(color);
        phong.set_shininess(shininess);
        phong
    }

    /// Set the highlight color from ARGB.
    pub fn set_color(&self, color: u32) {
        self.params.lock().color = argb_to_rgb(color);
    }

    /// Set the exponent.
    pub fn set_shininess(&self, shininess: f32) {
        self.params.lock().shininess = shininess;
    }

    /// Set the highlight intensity.
    pub fn set_intensity(&self, intensity: f32) {
        self.params.lock().intensity = intensity;
    }

    /// The current exponent.
    pub fn shininess(&self) -> f32 {
        self.params.lock().shininess
    }
}

impl SpecularMethod for Phong {
    fn name(&self) -> &'static str {
        "Phong"
    }

    fn fragment_fragment(
        &self,
        lights: &[Arc<Light>],
        specular_maps: &[Arc<Texture>],
    ) -> Option<ShaderFragment> {
        let mut fragment = ShaderFragment::new(PHONG_FRAGMENT)
            .with_var(ShaderVar::uniform(GlslType::Vec3, "uSpecularColor"))
            .with_var(ShaderVar::uniform(GlslType::Float, "uShininess"))
            .with_var(ShaderVar::uniform(GlslType::Float, "uSpecularIntensity"))
            .with_line("vec3 phongViewDir = normalize(-vEyeDir);")
            .with_line("vec3 phongSpecular = vec3(0.0);");
        for i in 0..lights.len() {
            fragment = fragment.with_line(format!(
                "phongSpecular += {} * pow(max(dot(reflect(-lightDir{i}, gNormal), phongViewDir), 0.0), uShininess);",
                light_energy(i)
            ));
        }
        fragment = with_specular_maps(fragment, specular_maps);
        Some(fragment.with_line(
            "gColor.rgb += phongSpecular * uSpecularColor * uSpecularIntensity * gSpecularValue;",
        ))
    }

    fn apply_params(&self, uniforms: &mut ProgramUniforms<'_>) {
        let params = *self.params.lock();
        uniforms.set("uSpecularColor", UniformValue::Vec3(params.color));
        uniforms.set("uShininess", UniformValue::Float(params.shininess));
        uniforms.set("uSpecularIntensity", UniformValue::Float(params.intensity));
    }
}

const COOK_TORRANCE_TERM: &str = "float cookTorranceTerm(vec3 n, vec3 l, vec3 v, float roughness, float extinction) {
    vec3 h = normalize(l + v);
    float nDotV = max(dot(n, v), 0.001);
    float nDotL = max(dot(n, l), 0.001);
    float nDotH = max(dot(n, h), 0.001);
    float vDotH = max(dot(v, h), 0.001);
    float f0 = 0.8;
    float fresnel = f0 + (1.0 - f0) * pow(1.0 - vDotH, 5.0);
    float m2 = roughness * roughness;
    float d = exp((nDotH * nDotH - 1.0) / (m2 * nDotH * nDotH)) / (4.0 * m2 * pow(nDotH, 4.0));
    float g = min(1.0, min(2.0 * nDotH * nDotV / vDotH, 2.0 * nDotH * nDotL / vDotH));
    float rs = (fresnel * d * g) / (3.14159265 * nDotL * nDotV);
    return extinction + rs * (1.0 - extinction);
}";

#[derive(Debug, Clone, Copy)]
struct CookTorranceParams {
    color: [f32; 3],
    roughness: f32,
    extinction: f32,
}

/// Cook-Torrance microfacet specular with Beckmann distribution.
#[derive(Debug)]
pub struct CookTorrance {
    params: Mutex<CookTorranceParams>,
}

impl Default for CookTorrance {
    fn default() -> Self {
        Self::new()
    }
}

impl CookTorrance {
    /// White highlights, roughness and extinction `0.125`.
    pub fn new() -> Self {
        Self {
            params: Mutex::new(CookTorranceParams {
                color: [1.0, 1.0, 1.0],
                roughness: 0.125,
                extinction: 0.125,
            }),
        }
    }

    /// Set the highlight color from ARGB.
    pub fn set_color(&self, color: u32) {
        self.params.lock().color = argb_to_rgb(color);
    }

    /// Set the surface roughness.
    pub fn set_roughness(&self, roughness: f32) {
        self.params.lock().roughness = roughness;
    }

    /// Set the extinction coefficient.
    pub fn set_extinction(&self, extinction: f32) {
        self.params.lock().extinction = extinction;
    }
}

impl SpecularMethod for CookTorrance {
    fn name(&self) -> &'static str {
        "CookTorrance"
    }

    fn fragment_fragment(
        &self,
        lights: &[Arc<Light>],
        specular_maps: &[Arc<Texture>],
    ) -> Option<ShaderFragment> {
        let mut fragment = ShaderFragment::new(COOK_TORRANCE_FRAGMENT)
            .with_var(ShaderVar::uniform(GlslType::Vec3, "uSpecularColor"))
            .with_var(ShaderVar::uniform(GlslType::Float, "uRoughness"))
            .with_var(ShaderVar::uniform(GlslType::Float, "uExtinction"))
            .with_function(COOK_TORRANCE_TERM)
            .with_line("vec3 ctViewDir = normalize(-vEyeDir);")
            .with_line("vec3 ctSpecular = vec3(0.0);");
        for i in 0..lights.len() {
            fragment = fragment.with_line(format!(
                "if (NdotL{i} > 0.0) ctSpecular += uSpecularColor * NdotL{i} * {} * cookTorranceTerm(gNormal, lightDir{i}, ctViewDir, uRoughness, uExtinction);",
                light_energy(i)
            ));
        }
        fragment = with_specular_maps(fragment, specular_maps);
        Some(fragment.with_line("gColor.rgb += ctSpecular * gSpecularValue;"))
    }

    fn apply_params(&self, uniforms: &mut ProgramUniforms<'_>) {
        let params = *self.params.lock();
        uniforms.set("uSpecularColor", UniformValue::Vec3(params.color));
        uniforms.set("uRoughness", UniformValue::Float(params.roughness));
        uniforms.set("uExtinction", UniformValue::Float(params.extinction));
    }
}
