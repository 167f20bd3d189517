//! GPU backend abstraction layer.
//!
//! The material engine only needs the shader/program/uniform/texture-unit
//! subset of a GL-style driver. Every backend implements [`GpuBackend`] over
//! that subset, and everything above this module talks to the driver through
//! typed handles.
//!
//! # Available Backends
//!
//! - [`DummyBackend`] (always built): driver emulation for tests and headless tooling
//! - `gl-backend`: OpenGL / OpenGL ES through glow
//!
//! # Threading
//!
//! GL objects are only valid on the thread that owns the context, so backends
//! are not required to be `Send` or `Sync`. The device and every material
//! attached to it live on the render thread.

pub mod dummy;

#[cfg(feature = "gl-backend")]
pub mod gl;

use std::num::NonZeroU32;

use crate::resources::TextureTarget;
use crate::shader::ShaderStage;

pub use dummy::DummyBackend;
#[cfg(feature = "gl-backend")]
pub use gl::GlBackend;

/// Handle to a compiled shader object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderHandle(pub NonZeroU32);

/// Handle to a linked program object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub NonZeroU32);

impl ProgramHandle {
    /// Raw driver id of the program.
    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

/// Location of a uniform inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Driver-side texture object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub NonZeroU32);

impl TextureId {
    /// Wrap a raw driver id, returning `None` for the reserved id 0.
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }
}

/// A value written to a uniform location.
///
/// Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `int` or sampler unit.
    Int(i32),
    /// `float`
    Float(f32),
    /// `vec2`
    Vec2([f32; 2]),
    /// `vec3`
    Vec3([f32; 3]),
    /// `vec4`
    Vec4([f32; 4]),
    /// `mat3`
    Mat3([f32; 9]),
    /// `mat4`
    Mat4([f32; 16]),
}

/// Driver operations consumed by the material engine.
///
/// Compile and link failures are reported as `Err(diagnostic)`; the backend
/// deletes the partially created object before returning. Callers decide
/// whether a failure is fatal.
pub trait GpuBackend: 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Whether a graphics context is current and usable.
    fn has_context(&self) -> bool;

    /// Number of texture image units available to the fragment stage.
    fn max_texture_image_units(&self) -> u32;

    /// Compile one shader stage.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String>;

    /// Link a vertex and a fragment shader into a program.
    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String>;

    /// Delete a shader object.
    fn delete_shader(&self, shader: ShaderHandle);

    /// Delete a program object.
    fn delete_program(&self, program: ProgramHandle);

    /// Make `program` current, or unbind with `None`.
    fn use_program(&self, program: Option<ProgramHandle>);

    /// Look up a uniform; `None` when it was never declared or optimized out.
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Write a uniform of the currently bound program.
    fn set_uniform(&self, location: UniformLocation, value: &UniformValue);

    /// Select texture unit `unit` for subsequent binds.
    fn active_texture(&self, unit: u32);

    /// Bind (or unbind with `None`) a texture on the active unit.
    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureId>);

    /// Reset the `ARRAY_BUFFER` binding.
    fn unbind_array_buffer(&self);
}
