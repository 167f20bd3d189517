//! GLSL shader model and composition.
//!
//! A [`Shader`] is one pipeline stage assembled from a base template and an
//! ordered list of immutable [`ShaderFragment`]s. Building a shader linearizes
//! everything into a single GLSL ES 1.00 source string.
//!
//! # Source Layout
//!
//! The generated source always has the same shape:
//!
//! 1. preprocessor directives (shader first, then fragments)
//! 2. the default float precision
//! 3. constants, uniforms, attributes, varyings, globals
//! 4. helper functions
//! 5. `void main()`: the template prologue, each fragment body in insertion
//!    order, the template epilogue, then [`InsertLocation::PostTransform`]
//!    bodies
//!
//! Declarations are deduplicated by name within their group; the first one
//! wins. Each fragment body is preceded by a `// <ID>` marker line, which
//! makes composed sources easy to inspect in logs.
//!
//! # Example
//!
//! ```ignore
//! use chroma_graphics::shader::{GlslType, Shader, ShaderFragment, ShaderStage, ShaderVar};
//!
//! let mut shader = Shader::new(ShaderStage::Fragment);
//! shader.add_var(ShaderVar::uniform(GlslType::Vec4, "uColor"));
//! shader.add_fragment(ShaderFragment::new("SOLID").with_line("gl_FragColor = uColor;"));
//! let source = shader.build();
//! ```

pub mod fragments;
pub mod templates;

use std::collections::HashSet;
use std::fmt::Write;

use chroma_core::profiling::profile_scope;

pub use templates::{ShaderFeatures, ShaderTemplate};

/// Shader stage in the graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

/// GLSL ES data types used in declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlslType {
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `mat3`
    Mat3,
    /// `mat4`
    Mat4,
    /// `int`
    Int,
    /// `bool`
    Bool,
    /// `sampler2D`
    Sampler2d,
    /// `samplerCube`
    SamplerCube,
    /// `samplerExternalOES`, requires `GL_OES_EGL_image_external`.
    SamplerExternalOes,
}

impl GlslType {
    /// GLSL spelling of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Sampler2d => "sampler2D",
            Self::SamplerCube => "samplerCube",
            Self::SamplerExternalOes => "samplerExternalOES",
        }
    }

    /// Whether this is a sampler type.
    pub fn is_sampler(self) -> bool {
        matches!(
            self,
            Self::Sampler2d | Self::SamplerCube | Self::SamplerExternalOes
        )
    }
}

/// Storage qualifier of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// `const` with its initializer expression.
    Const(String),
    /// `uniform`
    Uniform,
    /// `attribute` (vertex stage only)
    Attribute,
    /// `varying`
    Varying,
    /// Unqualified global variable.
    Global,
}

/// One variable declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderVar {
    /// Storage qualifier.
    pub qualifier: Qualifier,
    /// Data type.
    pub ty: GlslType,
    /// Identifier.
    pub name: String,
    /// Array length for array declarations.
    pub array_size: Option<u32>,
}

impl ShaderVar {
    fn new(qualifier: Qualifier, ty: GlslType, name: impl Into<String>) -> Self {
        Self {
            qualifier,
            ty,
            name: name.into(),
            array_size: None,
        }
    }

    /// A `uniform` declaration.
    pub fn uniform(ty: GlslType, name: impl Into<String>) -> Self {
        Self::new(Qualifier::Uniform, ty, name)
    }

    /// An `attribute` declaration.
    pub fn attribute(ty: GlslType, name: impl Into<String>) -> Self {
        Self::new(Qualifier::Attribute, ty, name)
    }

    /// A `varying` declaration.
    pub fn varying(ty: GlslType, name: impl Into<String>) -> Self {
        Self::new(Qualifier::Varying, ty, name)
    }

    /// An unqualified global.
    pub fn global(ty: GlslType, name: impl Into<String>) -> Self {
        Self::new(Qualifier::Global, ty, name)
    }

    /// A `const` with initializer `value`.
    pub fn constant(ty: GlslType, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(Qualifier::Const(value.into()), ty, name)
    }

    /// Turn the declaration into an array of `size` elements.
    pub fn array(mut self, size: u32) -> Self {
        self.array_size = Some(size);
        self
    }

    fn declaration(&self) -> String {
        let array = self
            .array_size
            .map(|size| format!("[{size}]"))
            .unwrap_or_default();
        let ty = self.ty.as_str();
        match &self.qualifier {
            Qualifier::Const(value) => format!("const {ty} {}{array} = {value};", self.name),
            Qualifier::Uniform => format!("uniform {ty} {}{array};", self.name),
            Qualifier::Attribute => format!("attribute {ty} {}{array};", self.name),
            Qualifier::Varying => format!("varying {ty} {}{array};", self.name),
            Qualifier::Global => format!("{ty} {}{array};", self.name),
        }
    }

    fn group(&self) -> usize {
        match self.qualifier {
            Qualifier::Const(_) => 0,
            Qualifier::Uniform => 1,
            Qualifier::Attribute => 2,
            Qualifier::Varying => 3,
            Qualifier::Global => 4,
        }
    }
}

const GROUP_COUNT: usize = 5;

/// The six ordered positions where plugin fragments are inserted.
///
/// The order of the variants is the order in which slots are filled during
/// composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InsertLocation {
    /// After texture sampling, before any lighting.
    PreLighting,
    /// After the light setup, before the diffuse method.
    PreDiffuse,
    /// After the diffuse method, before the specular method.
    PreSpecular,
    /// Before the alpha mask.
    PreAlpha,
    /// After all core fragments, before the template's closing code.
    PreTransform,
    /// After the template's closing code (e.g. after `gl_Position` is set).
    PostTransform,
}

impl InsertLocation {
    /// All slots in composition order.
    pub const ALL: [InsertLocation; 6] = [
        Self::PreLighting,
        Self::PreDiffuse,
        Self::PreSpecular,
        Self::PreAlpha,
        Self::PreTransform,
        Self::PostTransform,
    ];
}

/// An immutable chunk of GLSL: declarations, helper functions and a body
/// that runs inside `main()`.
///
/// Built with consuming `with_*` methods and never mutated once added to a
/// shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderFragment {
    id: String,
    location: Option<InsertLocation>,
    directives: Vec<String>,
    vars: Vec<ShaderVar>,
    functions: Vec<String>,
    body: Vec<String>,
}

impl ShaderFragment {
    /// Create an empty fragment identified by `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location: None,
            directives: Vec::new(),
            vars: Vec::new(),
            functions: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Tag the fragment with an insertion slot.
    pub fn with_location(mut self, location: InsertLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Add a preprocessor directive line, e.g. `#extension ... : require`.
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Add a declaration.
    pub fn with_var(mut self, var: ShaderVar) -> Self {
        self.vars.push(var);
        self
    }

    /// Add a helper function definition.
    pub fn with_function(mut self, source: impl Into<String>) -> Self {
        self.functions.push(source.into());
        self
    }

    /// Append one statement line to the body.
    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.body.push(line.into());
        self
    }

    /// Append several body lines.
    pub fn with_body(mut self, body: &str) -> Self {
        self.body.extend(body.lines().map(str::to_string));
        self
    }

    /// Fragment id, emitted as a marker comment.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Insertion slot, if any.
    pub fn location(&self) -> Option<InsertLocation> {
        self.location
    }

    /// Declarations in insertion order.
    pub fn vars(&self) -> &[ShaderVar] {
        &self.vars
    }

    /// Body lines.
    pub fn body(&self) -> &[String] {
        &self.body
    }

    fn is_post_transform(&self) -> bool {
        self.location == Some(InsertLocation::PostTransform)
    }
}

/// One shader stage.
///
/// Shaders come in three flavors:
/// - composed: created [`from_template`](Self::from_template), then filled
///   with fragments and built
/// - custom: created with [`new`](Self::new) and populated by the caller
/// - hand-written: [`from_glsl`](Self::from_glsl), already built
#[derive(Debug, Clone)]
pub struct Shader {
    stage: ShaderStage,
    template: Option<ShaderTemplate>,
    precision: Option<&'static str>,
    directives: Vec<String>,
    vars: Vec<ShaderVar>,
    functions: Vec<String>,
    prologue: Vec<String>,
    epilogue: Vec<String>,
    fragments: Vec<ShaderFragment>,
    source: Option<String>,
}

impl Shader {
    /// An empty shader for `stage`.
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            template: None,
            precision: None,
            directives: Vec::new(),
            vars: Vec::new(),
            functions: Vec::new(),
            prologue: Vec::new(),
            epilogue: Vec::new(),
            fragments: Vec::new(),
            source: None,
        }
    }

    /// A shader whose base declarations come from `template` on
    /// [`initialize`](Self::initialize).
    pub fn from_template(template: ShaderTemplate) -> Self {
        let mut shader = Self::new(template.stage());
        shader.template = Some(template);
        shader
    }

    /// Wrap a complete hand-written source. The shader is already built.
    pub fn from_glsl(stage: ShaderStage, source: impl Into<String>) -> Self {
        let mut shader = Self::new(stage);
        shader.source = Some(source.into());
        shader
    }

    /// The stage.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Whether [`build`](Self::build) still has to run.
    pub fn needs_build(&self) -> bool {
        self.source.is_none()
    }

    /// Apply the pending template, if any. Idempotent.
    pub fn initialize(&mut self) {
        let Some(template) = self.template.take() else {
            return;
        };
        self.precision = template.precision;
        self.directives.extend(template.directives);
        self.vars.extend(template.vars);
        self.functions.extend(template.functions);
        self.prologue.extend(template.prologue);
        self.epilogue.extend(template.epilogue);
    }

    /// Set the default float precision (`lowp`, `mediump`, `highp`).
    pub fn set_precision(&mut self, precision: &'static str) {
        self.precision = Some(precision);
        self.source = None;
    }

    /// Add a shader-level preprocessor directive.
    pub fn add_directive(&mut self, directive: impl Into<String>) {
        self.directives.push(directive.into());
        self.source = None;
    }

    /// Add a shader-level declaration.
    pub fn add_var(&mut self, var: ShaderVar) {
        self.vars.push(var);
        self.source = None;
    }

    /// Add a shader-level helper function.
    pub fn add_function(&mut self, source: impl Into<String>) {
        self.functions.push(source.into());
        self.source = None;
    }

    /// Append a line to the code that runs before fragment bodies.
    pub fn add_prologue_line(&mut self, line: impl Into<String>) {
        self.prologue.push(line.into());
        self.source = None;
    }

    /// Append a line to the code that runs after non-post-transform bodies.
    pub fn add_epilogue_line(&mut self, line: impl Into<String>) {
        self.epilogue.push(line.into());
        self.source = None;
    }

    /// Append a fragment.
    pub fn add_fragment(&mut self, fragment: ShaderFragment) {
        self.fragments.push(fragment);
        self.source = None;
    }

    /// Fragments in insertion order.
    pub fn fragments(&self) -> &[ShaderFragment] {
        &self.fragments
    }

    /// Whether a fragment with `id` was added.
    pub fn has_fragment(&self, id: &str) -> bool {
        self.fragments.iter().any(|f| f.id == id)
    }

    /// The built source, if built.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Linearize into GLSL and cache the result.
    pub fn build(&mut self) -> &str {
        if self.source.is_none() {
            self.initialize();
            self.source = Some(self.linearize());
        }
        self.source.as_deref().unwrap_or_default()
    }

    fn linearize(&self) -> String {
        profile_scope!("shader_linearize");
        let mut out = String::new();

        let mut seen = HashSet::new();
        let directives = self
            .directives
            .iter()
            .chain(self.fragments.iter().flat_map(|f| &f.directives));
        for directive in directives {
            if seen.insert(directive.as_str()) {
                let _ = writeln!(out, "{directive}");
            }
        }

        if let Some(precision) = self.precision {
            let _ = writeln!(out, "precision {precision} float;");
        }

        let vars: Vec<&ShaderVar> = self
            .vars
            .iter()
            .chain(self.fragments.iter().flat_map(|f| &f.vars))
            .collect();
        for group in 0..GROUP_COUNT {
            let mut seen = HashSet::new();
            for var in vars.iter().filter(|v| v.group() == group) {
                if seen.insert(var.name.as_str()) {
                    let _ = writeln!(out, "{}", var.declaration());
                }
            }
        }

        let mut seen = HashSet::new();
        let functions = self
            .functions
            .iter()
            .chain(self.fragments.iter().flat_map(|f| &f.functions));
        for function in functions {
            if seen.insert(function.as_str()) {
                let _ = writeln!(out, "{}", function.trim_end());
            }
        }

        out.push_str("void main() {\n");
        write_lines(&mut out, &self.prologue);
        for fragment in self.fragments.iter().filter(|f| !f.is_post_transform()) {
            write_fragment(&mut out, fragment);
        }
        write_lines(&mut out, &self.epilogue);
        for fragment in self.fragments.iter().filter(|f| f.is_post_transform()) {
            write_fragment(&mut out, fragment);
        }
        out.push_str("}\n");
        out
    }
}

fn write_lines(out: &mut String, lines: &[String]) {
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let _ = writeln!(out, "    {}", line.trim_end());
    }
}

fn write_fragment(out: &mut String, fragment: &ShaderFragment) {
    let _ = writeln!(out, "    // {}", fragment.id);
    write_lines(out, &fragment.body);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_fragment() -> Shader {
        let mut shader = Shader::new(ShaderStage::Fragment);
        shader.set_precision("mediump");
        shader.add_var(ShaderVar::uniform(GlslType::Vec4, "uColor"));
        shader.add_prologue_line("vec4 color = uColor;");
        shader.add_epilogue_line("gl_FragColor = color;");
        shader
    }

    #[test]
    fn test_var_declarations() {
        assert_eq!(
            ShaderVar::uniform(GlslType::Mat4, "uMVPMatrix").declaration(),
            "uniform mat4 uMVPMatrix;"
        );
        assert_eq!(
            ShaderVar::uniform(GlslType::Vec3, "uLightColor")
                .array(4)
                .declaration(),
            "uniform vec3 uLightColor[4];"
        );
        assert_eq!(
            ShaderVar::constant(GlslType::Float, "PI", "3.14159265").declaration(),
            "const float PI = 3.14159265;"
        );
        assert_eq!(
            ShaderVar::global(GlslType::Vec4, "gColor").declaration(),
            "vec4 gColor;"
        );
    }

    #[test]
    fn test_build_layout() {
        let mut shader = solid_fragment();
        shader.add_fragment(
            ShaderFragment::new("TINT")
                .with_var(ShaderVar::uniform(GlslType::Float, "uTint"))
                .with_line("color.rgb *= uTint;"),
        );
        let source = shader.build().to_string();
        assert_eq!(
            source,
            "precision mediump float;\n\
             uniform vec4 uColor;\n\
             uniform float uTint;\n\
             void main() {\n    \
             vec4 color = uColor;\n    \
             // TINT\n    \
             color.rgb *= uTint;\n    \
             gl_FragColor = color;\n\
             }\n"
        );
    }

    #[test]
    fn test_declarations_grouped_and_deduplicated() {
        let mut shader = Shader::new(ShaderStage::Vertex);
        shader.add_fragment(
            ShaderFragment::new("A")
                .with_var(ShaderVar::varying(GlslType::Vec3, "vWorld"))
                .with_var(ShaderVar::uniform(GlslType::Float, "uTime")),
        );
        shader.add_fragment(
            ShaderFragment::new("B")
                .with_var(ShaderVar::uniform(GlslType::Float, "uTime"))
                .with_var(ShaderVar::constant(GlslType::Float, "TAU", "6.2831853")),
        );
        let source = shader.build();
        assert_eq!(source.matches("uniform float uTime;").count(), 1);
        let konst = source.find("const float TAU").unwrap();
        let uniform = source.find("uniform float uTime").unwrap();
        let varying = source.find("varying vec3 vWorld").unwrap();
        assert!(konst < uniform && uniform < varying);
    }

    #[test]
    fn test_directives_come_first_and_once() {
        let mut shader = solid_fragment();
        let ext = "#extension GL_OES_EGL_image_external : require";
        shader.add_fragment(ShaderFragment::new("A").with_directive(ext));
        shader.add_directive(ext);
        let source = shader.build();
        assert!(source.starts_with(ext));
        assert_eq!(source.matches(ext).count(), 1);
    }

    #[test]
    fn test_post_transform_runs_after_epilogue() {
        let mut shader = solid_fragment();
        shader.add_fragment(
            ShaderFragment::new("LATE")
                .with_location(InsertLocation::PostTransform)
                .with_line("gl_FragColor.a = 1.0;"),
        );
        shader.add_fragment(ShaderFragment::new("EARLY").with_line("color.r = 0.0;"));
        let source = shader.build();
        let early = source.find("// EARLY").unwrap();
        let epilogue = source.find("gl_FragColor = color;").unwrap();
        let late = source.find("// LATE").unwrap();
        assert!(early < epilogue && epilogue < late);
    }

    #[test]
    fn test_helper_functions_deduplicated() {
        let mut shader = solid_fragment();
        let helper = "float sq(float x) { return x * x; }";
        shader.add_fragment(ShaderFragment::new("A").with_function(helper));
        shader.add_fragment(ShaderFragment::new("B").with_function(helper));
        let source = shader.build();
        assert_eq!(source.matches(helper).count(), 1);
        assert!(source.find(helper).unwrap() < source.find("void main()").unwrap());
    }

    #[test]
    fn test_from_glsl_is_prebuilt() {
        let mut shader = Shader::from_glsl(ShaderStage::Vertex, "void main() {}\n");
        assert!(!shader.needs_build());
        shader.initialize();
        assert_eq!(shader.source(), Some("void main() {}\n"));
    }

    #[test]
    fn test_adding_fragment_invalidates_build() {
        let mut shader = solid_fragment();
        shader.build();
        assert!(!shader.needs_build());
        shader.add_fragment(ShaderFragment::new("X"));
        assert!(shader.needs_build());
    }

    #[test]
    fn test_build_is_deterministic() {
        let make = || {
            let mut shader = solid_fragment();
            shader.add_fragment(ShaderFragment::new("A").with_line("color *= 0.5;"));
            shader.add_fragment(ShaderFragment::new("B").with_line("color += 0.1;"));
            shader.build().to_string()
        };
        assert_eq!(make(), make());
    }
}
