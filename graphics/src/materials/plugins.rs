//! Material plugins: shader fragments injected at named insertion slots.
//!
//! A plugin is identified by a [`PluginKey`]; a material holds at most one
//! plugin per key. Within a slot, plugins are composed in the order they were
//! added to the material.
//!
//! Plugins may own textures. They are bound after the material's own
//! textures, starting at the unit the material hands to
//! [`MaterialPlugin::bind_textures`].

use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

use chroma_core::color::argb_to_rgb;
use parking_lot::Mutex;

use crate::backend::UniformValue;
use crate::resources::Texture;
use crate::shader::templates::names;
use crate::shader::{GlslType, InsertLocation, ShaderFragment, ShaderVar};

use super::ProgramUniforms;

/// Stable identity of a plugin, used for lookup and duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PluginKey {
    /// [`FresnelPlugin`]
    Fresnel,
    /// [`SpriteSheetPlugin`]
    SpriteSheet,
    /// [`DecalPlugin`]
    Decal,
    /// [`VertexWavePlugin`]
    VertexWave,
    /// A user-defined plugin.
    Custom(String),
}

impl fmt::Display for PluginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresnel => f.write_str("Fresnel"),
            Self::SpriteSheet => f.write_str("SpriteSheet"),
            Self::Decal => f.write_str("Decal"),
            Self::VertexWave => f.write_str("VertexWave"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// A set of shader fragments injected into a composed material.
pub trait MaterialPlugin: Send + Sync + Debug {
    /// Identity of the plugin.
    fn key(&self) -> PluginKey;

    /// Slot the plugin's fragments go to.
    fn insert_location(&self) -> InsertLocation;

    /// Vertex-stage fragment, if any.
    fn vertex_fragment(&self) -> Option<ShaderFragment> {
        None
    }

    /// Fragment-stage fragment, if any.
    fn fragment_fragment(&self) -> Option<ShaderFragment> {
        None
    }

    /// Bind the plugin's textures starting at unit `first_unit`.
    fn bind_textures(&self, _uniforms: &mut ProgramUniforms<'_>, _first_unit: u32) {}

    /// Reset whatever [`bind_textures`](Self::bind_textures) bound.
    fn unbind_textures(&self, _uniforms: &mut ProgramUniforms<'_>) {}

    /// Push per-frame uniforms into the bound program.
    fn apply_params(&self, _uniforms: &mut ProgramUniforms<'_>) {}
}

#[derive(Debug, Clone, Copy)]
struct FresnelParams {
    color: [f32; 3],
    bias: f32,
    scale: f32,
    power: f32,
}

/// Rim lighting: adds a color where the surface turns away from the viewer.
#[derive(Debug)]
pub struct FresnelPlugin {
    params: Mutex<FresnelParams>,
}

impl FresnelPlugin {
    /// Fresnel rim in the ARGB `color`, with bias, scale and power `1`.
    pub fn new(color: u32) -> Self {
        Self {
            params: Mutex::new(FresnelParams {
                color: argb_to_rgb(color),
                bias: 1.0,
                scale: 1.0,
                power: 1.0,
            }),
        }
    }

    /// Set the rim color from ARGB.
    pub fn set_color(&self, color: u32) {
        self.params.lock().color = argb_to_rgb(color);
    }

    /// Set bias, scale and exponent of the Fresnel term.
    pub fn set_terms(&self, bias: f32, scale: f32, power: f32) {
        let mut params = self.params.lock();
        params.bias = bias;
        params.scale = scale;
        params.power = power;
    }
}

impl MaterialPlugin for FresnelPlugin {
    fn key(&self) -> PluginKey {
        PluginKey::Fresnel
    }

    fn insert_location(&self) -> InsertLocation {
        InsertLocation::PreTransform
    }

    fn fragment_fragment(&self) -> Option<ShaderFragment> {
        Some(
            ShaderFragment::new("FRESNEL_FRAGMENT")
                .with_var(ShaderVar::uniform(GlslType::Mat4, names::INVERSE_VIEW_MATRIX))
                .with_var(ShaderVar::uniform(GlslType::Vec3, "uFresnelColor"))
                .with_var(ShaderVar::uniform(GlslType::Float, "uFresnelBias"))
                .with_var(ShaderVar::uniform(GlslType::Float, "uFresnelScale"))
                .with_var(ShaderVar::uniform(GlslType::Float, "uFresnelPower"))
                .with_line(format!(
                    "vec3 worldNormal = vec3({} * vec4(vNormal, 0.0));",
                    names::INVERSE_VIEW_MATRIX
                ))
                .with_line("float fresnel = dot(normalize(vEyeDir), normalize(worldNormal));")
                .with_line(
                    "float fresnelValue = clamp(pow(fresnel + uFresnelBias, uFresnelPower) * uFresnelScale, 0.0, 1.0);",
                )
                .with_line("gColor.rgb += uFresnelColor * fresnelValue;"),
        )
    }

    fn apply_params(&self, uniforms: &mut ProgramUniforms<'_>) {
        let params = *self.params.lock();
        uniforms.set("uFresnelColor", UniformValue::Vec3(params.color));
        uniforms.set("uFresnelBias", UniformValue::Float(params.bias));
        uniforms.set("uFresnelScale", UniformValue::Float(params.scale));
        uniforms.set("uFresnelPower", UniformValue::Float(params.power));
    }
}

/// Animates texture coordinates through the tiles of a sprite sheet.
///
/// Tiles are numbered left to right, top to bottom.
#[derive(Debug)]
pub struct SpriteSheetPlugin {
    columns: u32,
    rows: u32,
    frame: Mutex<u32>,
}

impl SpriteSheetPlugin {
    /// A sheet of `columns` x `rows` tiles. Zero dimensions count as one.
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
            frame: Mutex::new(0),
        }
    }

    /// Number of tiles in the sheet.
    pub fn tile_count(&self) -> u32 {
        self.columns * self.rows
    }

    /// Select the tile drawn next frame. Wraps around the sheet.
    pub fn set_frame(&self, frame: u32) {
        *self.frame.lock() = frame % self.tile_count();
    }

    /// Current tile.
    pub fn frame(&self) -> u32 {
        *self.frame.lock()
    }

    /// Size of one tile in texture coordinates.
    pub fn tile_size(&self) -> [f32; 2] {
        [1.0 / self.columns as f32, 1.0 / self.rows as f32]
    }

    /// Texture coordinate offset of the current tile.
    pub fn tile_offset(&self) -> [f32; 2] {
        let frame = self.frame();
        let [width, height] = self.tile_size();
        [
            (frame % self.columns) as f32 * width,
            (frame / self.columns) as f32 * height,
        ]
    }
}

impl MaterialPlugin for SpriteSheetPlugin {
    fn key(&self) -> PluginKey {
        PluginKey::SpriteSheet
    }

    fn insert_location(&self) -> InsertLocation {
        InsertLocation::PreLighting
    }

    fn vertex_fragment(&self) -> Option<ShaderFragment> {
        Some(
            ShaderFragment::new("SPRITE_SHEET_VERTEX")
                .with_var(ShaderVar::uniform(GlslType::Vec2, "uTileSize"))
                .with_var(ShaderVar::uniform(GlslType::Vec2, "uTileOffset"))
                .with_line("gTextureCoord = gTextureCoord * uTileSize + uTileOffset;"),
        )
    }

    fn apply_params(&self, uniforms: &mut ProgramUniforms<'_>) {
        uniforms.set("uTileSize", UniformValue::Vec2(self.tile_size()));
        uniforms.set("uTileOffset", UniformValue::Vec2(self.tile_offset()));
    }
}

/// Blends a second texture over the base color, using the decal's alpha.
#[derive(Debug)]
pub struct DecalPlugin {
    texture: Arc<Texture>,
    offset: Mutex<[f32; 2]>,
    repeat: Mutex<[f32; 2]>,
    bound_unit: Mutex<Option<u32>>,
}

impl DecalPlugin {
    /// Sampler uniform of the decal texture.
    pub const SAMPLER: &'static str = "uDecalTexture";

    /// Decal drawn once over the whole surface.
    pub fn new(texture: Arc<Texture>) -> Self {
        Self {
            texture,
            offset: Mutex::new([0.0, 0.0]),
            repeat: Mutex::new([1.0, 1.0]),
            bound_unit: Mutex::new(None),
        }
    }

    /// The decal texture.
    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }

    /// Shift the decal in texture coordinates.
    pub fn set_offset(&self, offset: [f32; 2]) {
        *self.offset.lock() = offset;
    }

    /// Tile the decal.
    pub fn set_repeat(&self, repeat: [f32; 2]) {
        *self.repeat.lock() = repeat;
    }
}

impl MaterialPlugin for DecalPlugin {
    fn key(&self) -> PluginKey {
        PluginKey::Decal
    }

    fn insert_location(&self) -> InsertLocation {
        InsertLocation::PreLighting
    }

    fn fragment_fragment(&self) -> Option<ShaderFragment> {
        Some(
            ShaderFragment::new("DECAL_FRAGMENT")
                .with_var(ShaderVar::uniform(GlslType::Sampler2d, Self::SAMPLER))
                .with_var(ShaderVar::uniform(GlslType::Vec2, "uDecalOffset"))
                .with_var(ShaderVar::uniform(GlslType::Vec2, "uDecalRepeat"))
                .with_line("vec2 decalCoord = (gTextureCoord + uDecalOffset) * uDecalRepeat;")
                .with_line("vec4 decalColor = texture2D(uDecalTexture, decalCoord);")
                .with_line("gColor = mix(gColor, decalColor, decalColor.a);"),
        )
    }

    fn bind_textures(&self, uniforms: &mut ProgramUniforms<'_>, first_unit: u32) {
        let bound = uniforms.bind_sampler(
            Self::SAMPLER,
            first_unit,
            self.texture.target(),
            self.texture.texture_id(),
        );
        *self.bound_unit.lock() = bound.then_some(first_unit);
    }

    fn unbind_textures(&self, uniforms: &mut ProgramUniforms<'_>) {
        if let Some(unit) = self.bound_unit.lock().take() {
            uniforms.unbind_unit(unit, self.texture.target());
        }
    }

    fn apply_params(&self, uniforms: &mut ProgramUniforms<'_>) {
        uniforms.set("uDecalOffset", UniformValue::Vec2(*self.offset.lock()));
        uniforms.set("uDecalRepeat", UniformValue::Vec2(*self.repeat.lock()));
    }
}

#[derive(Debug, Clone, Copy)]
struct WaveParams {
    amplitude: f32,
    frequency: f32,
    phase: f32,
}

/// Displaces clip-space height with a sine wave after the core transform.
#[derive(Debug)]
pub struct VertexWavePlugin {
    params: Mutex<WaveParams>,
}

impl VertexWavePlugin {
    /// A wave with the given amplitude and frequency.
    pub fn new(amplitude: f32, frequency: f32) -> Self {
        Self {
            params: Mutex::new(WaveParams {
                amplitude,
                frequency,
                phase: 0.0,
            }),
        }
    }

    /// Advance the wave.
    pub fn set_phase(&self, phase: f32) {
        self.params.lock().phase = phase;
    }
}

impl MaterialPlugin for VertexWavePlugin {
    fn key(&self) -> PluginKey {
        PluginKey::VertexWave
    }

    fn insert_location(&self) -> InsertLocation {
        InsertLocation::PostTransform
    }

    fn vertex_fragment(&self) -> Option<ShaderFragment> {
        Some(
            ShaderFragment::new("VERTEX_WAVE_VERTEX")
                .with_var(ShaderVar::uniform(GlslType::Float, "uWaveAmplitude"))
                .with_var(ShaderVar::uniform(GlslType::Float, "uWaveFrequency"))
                .with_var(ShaderVar::uniform(GlslType::Float, "uWavePhase"))
                .with_line(
                    "gl_Position.y += uWaveAmplitude * sin(uWaveFrequency * gPosition.x + uWavePhase);",
                ),
        )
    }

    fn apply_params(&self, uniforms: &mut ProgramUniforms<'_>) {
        let params = *self.params.lock();
        uniforms.set("uWaveAmplitude", UniformValue::Float(params.amplitude));
        uniforms.set("uWaveFrequency", UniformValue::Float(params.frequency));
        uniforms.set("uWavePhase", UniformValue::Float(params.phase));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(PluginKey::Fresnel.to_string(), "Fresnel");
        assert_eq!(PluginKey::Custom("Outline".into()).to_string(), "Outline");
    }

    #[test]
    fn test_builtin_slots() {
        assert_eq!(FresnelPlugin::new(0xffffffff).insert_location(), InsertLocation::PreTransform);
        assert_eq!(SpriteSheetPlugin::new(4, 4).insert_location(), InsertLocation::PreLighting);
        assert_eq!(VertexWavePlugin::new(0.1, 2.0).insert_location(), InsertLocation::PostTransform);
    }

    #[test]
    fn test_builtin_stages() {
        let fresnel = FresnelPlugin::new(0xffffffff);
        assert!(fresnel.vertex_fragment().is_none());
        assert!(fresnel.fragment_fragment().is_some());

        let wave = VertexWavePlugin::new(0.1, 2.0);
        assert!(wave.vertex_fragment().is_some());
        assert!(wave.fragment_fragment().is_none());
    }

    #[test]
    fn test_sprite_sheet_offsets() {
        let sheet = SpriteSheetPlugin::new(4, 2);
        assert_eq!(sheet.tile_size(), [0.25, 0.5]);
        sheet.set_frame(5);
        assert_eq!(sheet.tile_offset(), [0.25, 0.5]);
        sheet.set_frame(9);
        assert_eq!(sheet.frame(), 1);
    }

    #[test]
    fn test_sprite_sheet_zero_dimensions() {
        let sheet = SpriteSheetPlugin::new(0, 0);
        assert_eq!(sheet.tile_count(), 1);
        sheet.set_frame(3);
        assert_eq!(sheet.frame(), 0);
    }
}
