//! OpenGL / OpenGL ES backend using glow.
//!
//! The caller creates the GL context (EGL, glutin, a browser canvas) and hands
//! the loaded [`glow::Context`] to [`GlBackend::new`]. All calls must happen on
//! the thread where that context is current.

use glow::HasContext;

use crate::resources::TextureTarget;
use crate::shader::ShaderStage;

use super::{GpuBackend, ProgramHandle, ShaderHandle, TextureId, UniformLocation, UniformValue};

/// `GL_TEXTURE_EXTERNAL_OES` from `OES_EGL_image_external`.
const TEXTURE_EXTERNAL_OES: u32 = 0x8D65;

/// GL backend.
pub struct GlBackend {
    gl: glow::Context,
    max_texture_image_units: u32,
}

impl std::fmt::Debug for GlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlBackend")
            .field("max_texture_image_units", &self.max_texture_image_units)
            .finish_non_exhaustive()
    }
}

impl GlBackend {
    /// Wrap a loaded context and query its limits.
    pub fn new(gl: glow::Context) -> Self {
        let units = unsafe { gl.get_parameter_i32(glow::MAX_TEXTURE_IMAGE_UNITS) };
        let max_texture_image_units = u32::try_from(units).unwrap_or(0);
        log::info!("GL backend: {max_texture_image_units} texture image units");
        Self {
            gl,
            max_texture_image_units,
        }
    }

    /// The wrapped context.
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }
}

fn gl_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn gl_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2d => glow::TEXTURE_2D,
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
        TextureTarget::ExternalOes => TEXTURE_EXTERNAL_OES,
    }
}

impl GpuBackend for GlBackend {
    fn name(&self) -> &'static str {
        "GL Backend"
    }

    fn has_context(&self) -> bool {
        true
    }

    fn max_texture_image_units(&self) -> u32 {
        self.max_texture_image_units
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String> {
        let gl = &self.gl;
        unsafe {
            let shader = gl.create_shader(gl_stage(stage))?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(log);
            }
            Ok(ShaderHandle(shader.0))
        }
    }

    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String> {
        let gl = &self.gl;
        unsafe {
            let program = gl.create_program()?;
            gl.attach_shader(program, glow::NativeShader(vertex.0));
            gl.attach_shader(program, glow::NativeShader(fragment.0));
            gl.link_program(program);
            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(log);
            }
            Ok(ProgramHandle(program.0))
        }
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        unsafe { self.gl.delete_shader(glow::NativeShader(shader.0)) }
    }

    fn delete_program(&self, program: ProgramHandle) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        unsafe {
            self.gl
                .use_program(program.map(|p| glow::NativeProgram(p.0)))
        }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
                .map(|location| UniformLocation(location.0))
        }
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let gl = &self.gl;
        let location = glow::NativeUniformLocation(location.0);
        let location = Some(&location);
        unsafe {
            match *value {
                UniformValue::Int(v) => gl.uniform_1_i32(location, v),
                UniformValue::Float(v) => gl.uniform_1_f32(location, v),
                UniformValue::Vec2([x, y]) => gl.uniform_2_f32(location, x, y),
                UniformValue::Vec3([x, y, z]) => gl.uniform_3_f32(location, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => gl.uniform_4_f32(location, x, y, z, w),
                UniformValue::Mat3(ref m) => gl.uniform_matrix_3_f32_slice(location, false, m),
                UniformValue::Mat4(ref m) => gl.uniform_matrix_4_f32_slice(location, false, m),
            }
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureId>) {
        let texture = texture.map(|id| glow::NativeTexture(id.0));
        unsafe { self.gl.bind_texture(gl_target(target), texture) }
    }

    fn unbind_array_buffer(&self) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, None) }
    }
}

impl From<glow::NativeTexture> for TextureId {
    fn from(texture: glow::NativeTexture) -> Self {
        TextureId(texture.0)
    }
}

