//! Program compilation.
//!
//! This module drives the driver's compile and link steps for a vertex and
//! fragment source pair and turns the result into a [`BuildOutcome`].
//!
//! # Failure Policy
//!
//! A bad program is not an error for the caller. Compile and link diagnostics
//! are logged, every intermediate object is deleted, and the outcome says
//! which stage failed. The material that asked for the build records the
//! failure and stops retrying until one of its properties changes.
//!
//! # Example
//!
//! ```ignore
//! match build_program(&device, &vertex_source, &fragment_source) {
//!     BuildOutcome::Success(program) => backend.use_program(Some(program.program())),
//!     failure => log::warn!("{failure:?}"),
//! }
//! ```

use chroma_core::profiling::profile_scope;

use crate::backend::{GpuBackend, ProgramHandle, ShaderHandle};
use crate::device::GraphicsDevice;
use crate::shader::ShaderStage;

/// A linked program together with the shader objects it was linked from.
///
/// Exclusively owned by one material; release it with [`LinkedProgram::release`].
#[derive(Debug, PartialEq, Eq)]
pub struct LinkedProgram {
    program: ProgramHandle,
    vertex: ShaderHandle,
    fragment: ShaderHandle,
}

impl LinkedProgram {
    /// The program handle.
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// The vertex shader handle.
    pub fn vertex_shader(&self) -> ShaderHandle {
        self.vertex
    }

    /// The fragment shader handle.
    pub fn fragment_shader(&self) -> ShaderHandle {
        self.fragment
    }

    /// Delete the program and both shaders.
    pub fn release(self, backend: &dyn GpuBackend) {
        backend.delete_shader(self.vertex);
        backend.delete_shader(self.fragment);
        backend.delete_program(self.program);
    }
}

/// Result of one compile-and-link attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Both stages compiled and the program linked.
    Success(LinkedProgram),
    /// A stage failed to compile.
    CompileFailed {
        /// The stage that failed.
        stage: ShaderStage,
        /// The driver's info log.
        diagnostic: String,
    },
    /// Both stages compiled but linking failed.
    LinkFailed {
        /// The driver's info log.
        diagnostic: String,
    },
}

impl BuildOutcome {
    /// Whether the build produced a program.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The program handle on success.
    pub fn program(&self) -> Option<ProgramHandle> {
        match self {
            Self::Success(linked) => Some(linked.program()),
            _ => None,
        }
    }

    /// The diagnostic of a failed build.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::CompileFailed { diagnostic, .. } | Self::LinkFailed { diagnostic } => {
                Some(diagnostic)
            }
        }
    }
}

fn compile_stage(
    backend: &dyn GpuBackend,
    stage: ShaderStage,
    source: &str,
) -> Result<ShaderHandle, BuildOutcome> {
    backend.compile_shader(stage, source).map_err(|diagnostic| {
        log::error!("Could not compile {stage:?} shader: {diagnostic}");
        log::error!("{source}");
        BuildOutcome::CompileFailed { stage, diagnostic }
    })
}

/// Compile both stages and link them.
///
/// Intermediate objects are deleted on every failure path: a failed fragment
/// compile deletes the vertex shader, a failed link deletes both shaders.
pub fn build_program(
    device: &GraphicsDevice,
    vertex_source: &str,
    fragment_source: &str,
) -> BuildOutcome {
    profile_scope!("build_program");
    let backend = device.backend();

    let vertex = match compile_stage(backend, ShaderStage::Vertex, vertex_source) {
        Ok(handle) => handle,
        Err(outcome) => return outcome,
    };
    let fragment = match compile_stage(backend, ShaderStage::Fragment, fragment_source) {
        Ok(handle) => handle,
        Err(outcome) => {
            backend.delete_shader(vertex);
            return outcome;
        }
    };

    match backend.link_program(vertex, fragment) {
        Ok(program) => {
            log::debug!("Linked program {}", program.raw());
            BuildOutcome::Success(LinkedProgram {
                program,
                vertex,
                fragment,
            })
        }
        Err(diagnostic) => {
            log::error!("Could not link program: {diagnostic}");
            backend.delete_shader(vertex);
            backend.delete_shader(fragment);
            BuildOutcome::LinkFailed { diagnostic }
        }
    }
}
