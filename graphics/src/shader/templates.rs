//! Base templates for composed materials.
//!
//! Every composed material starts from the same vertex/fragment pair. The
//! templates declare the standard uniforms, attributes, varyings and globals
//! and leave extension points (`gColor`, `gNormal`, `gTextureCoord`,
//! `gPosition`) for fragments to read and write.
//!
//! The template shape depends on [`ShaderFeatures`], so features must be
//! decided before any fragment is added.

use bitflags::bitflags;

use super::{GlslType, ShaderStage, ShaderVar};

bitflags! {
    /// Global switches that change the base templates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderFeatures: u32 {
        /// Declare `uTime` in both stages.
        const TIME = 1 << 0;
        /// Pass the object-space position to the fragment stage as a cube coordinate.
        const CUBE_MAPS = 1 << 1;
        /// Mirror the cube coordinate for inside-out sky boxes.
        const SKY_TEXTURE = 1 << 2;
        /// Take the base color from the `aVertexColor` attribute instead of `uColor`.
        const VERTEX_COLORS = 1 << 3;
    }
}

/// Standard uniform and attribute names shared by templates and fragments.
pub mod names {
    /// Model-view-projection matrix.
    pub const MVP_MATRIX: &str = "uMVPMatrix";
    /// Inverse-transpose of the model matrix's upper 3x3.
    pub const NORMAL_MATRIX: &str = "uNormalMatrix";
    /// Model matrix.
    pub const MODEL_MATRIX: &str = "uModelMatrix";
    /// Model-view matrix.
    pub const MODEL_VIEW_MATRIX: &str = "uModelViewMatrix";
    /// Inverse view matrix.
    pub const INVERSE_VIEW_MATRIX: &str = "uInverseViewMatrix";
    /// Material color.
    pub const COLOR: &str = "uColor";
    /// Weight of the material color against texture colors.
    pub const COLOR_INFLUENCE: &str = "uColorInfluence";
    /// Elapsed time.
    pub const TIME: &str = "uTime";
}

/// Declarations and fixed code of a base shader, applied on initialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderTemplate {
    stage: ShaderStage,
    pub(crate) precision: Option<&'static str>,
    pub(crate) directives: Vec<String>,
    pub(crate) vars: Vec<ShaderVar>,
    pub(crate) functions: Vec<String>,
    pub(crate) prologue: Vec<String>,
    pub(crate) epilogue: Vec<String>,
}

impl ShaderTemplate {
    fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            precision: Some("mediump"),
            directives: Vec::new(),
            vars: Vec::new(),
            functions: Vec::new(),
            prologue: Vec::new(),
            epilogue: Vec::new(),
        }
    }

    /// The stage this template is for.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn var(&mut self, var: ShaderVar) {
        self.vars.push(var);
    }

    fn prologue(&mut self, line: &str) {
        self.prologue.push(line.to_string());
    }

    fn epilogue(&mut self, line: &str) {
        self.epilogue.push(line.to_string());
    }
}

fn shared_varyings(template: &mut ShaderTemplate, features: ShaderFeatures) {
    template.var(ShaderVar::varying(GlslType::Vec2, "vTextureCoord"));
    if features.contains(ShaderFeatures::CUBE_MAPS) {
        template.var(ShaderVar::varying(GlslType::Vec3, "vCubeTextureCoord"));
    }
    template.var(ShaderVar::varying(GlslType::Vec3, "vNormal"));
    template.var(ShaderVar::varying(GlslType::Vec4, "vColor"));
    template.var(ShaderVar::varying(GlslType::Vec3, "vEyeDir"));
}

/// The base vertex shader.
pub fn vertex(features: ShaderFeatures) -> ShaderTemplate {
    let mut t = ShaderTemplate::new(ShaderStage::Vertex);

    t.var(ShaderVar::uniform(GlslType::Mat4, names::MVP_MATRIX));
    t.var(ShaderVar::uniform(GlslType::Mat3, names::NORMAL_MATRIX));
    t.var(ShaderVar::uniform(GlslType::Mat4, names::MODEL_MATRIX));
    t.var(ShaderVar::uniform(GlslType::Mat4, names::MODEL_VIEW_MATRIX));
    t.var(ShaderVar::uniform(GlslType::Vec4, names::COLOR));
    if features.contains(ShaderFeatures::TIME) {
        t.var(ShaderVar::uniform(GlslType::Float, names::TIME));
    }

    t.var(ShaderVar::attribute(GlslType::Vec2, "aTextureCoord"));
    t.var(ShaderVar::attribute(GlslType::Vec3, "aNormal"));
    t.var(ShaderVar::attribute(GlslType::Vec4, "aPosition"));
    if features.contains(ShaderFeatures::VERTEX_COLORS) {
        t.var(ShaderVar::attribute(GlslType::Vec4, "aVertexColor"));
    }

    shared_varyings(&mut t, features);

    t.var(ShaderVar::global(GlslType::Vec4, "gPosition"));
    t.var(ShaderVar::global(GlslType::Vec3, "gNormal"));
    t.var(ShaderVar::global(GlslType::Vec4, "gColor"));
    t.var(ShaderVar::global(GlslType::Vec2, "gTextureCoord"));

    t.prologue("gPosition = aPosition;");
    t.prologue("gNormal = aNormal;");
    t.prologue("gTextureCoord = aTextureCoord;");
    if features.contains(ShaderFeatures::VERTEX_COLORS) {
        t.prologue("gColor = aVertexColor;");
    } else {
        t.prologue("gColor = uColor;");
    }

    t.epilogue("gl_Position = uMVPMatrix * gPosition;");
    t.epilogue("vNormal = normalize(uNormalMatrix * gNormal);");
    t.epilogue("vTextureCoord = gTextureCoord;");
    if features.contains(ShaderFeatures::CUBE_MAPS) {
        t.epilogue("vCubeTextureCoord = vec3(aPosition);");
        if features.contains(ShaderFeatures::SKY_TEXTURE) {
            t.epilogue("vCubeTextureCoord.x *= -1.0;");
        }
    }
    t.epilogue("vColor = gColor;");
    t.epilogue("vEyeDir = vec3(uModelViewMatrix * gPosition);");
    t
}

/// The base fragment shader.
pub fn fragment(features: ShaderFeatures) -> ShaderTemplate {
    let mut t = ShaderTemplate::new(ShaderStage::Fragment);

    t.var(ShaderVar::uniform(GlslType::Float, names::COLOR_INFLUENCE));
    if features.contains(ShaderFeatures::TIME) {
        t.var(ShaderVar::uniform(GlslType::Float, names::TIME));
    }

    shared_varyings(&mut t, features);

    t.var(ShaderVar::global(GlslType::Vec4, "gColor"));
    t.var(ShaderVar::global(GlslType::Vec3, "gNormal"));
    t.var(ShaderVar::global(GlslType::Vec2, "gTextureCoord"));
    t.var(ShaderVar::global(GlslType::Float, "gSpecularValue"));

    t.prologue("gNormal = normalize(vNormal);");
    t.prologue("gTextureCoord = vTextureCoord;");
    t.prologue("gColor = uColorInfluence * vColor;");
    t.prologue("gSpecularValue = 1.0;");

    t.epilogue("gl_FragColor = gColor;");
    t
}
