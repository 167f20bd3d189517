//! Graphics error types.

use thiserror::Error;

use crate::materials::PluginKey;
use crate::shader::ShaderStage;

/// Errors raised by the device and backend layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphicsError {
    /// Failed to initialize the graphics system.
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    /// No graphics context is current on this thread.
    #[error("no graphics context available")]
    ContextUnavailable,
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Caller-correctable precondition violations on the material API.
///
/// Shader compile and link failures are not errors: they are recorded on the
/// material as [`BuildState::Failed`](crate::materials::BuildState::Failed).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaterialError {
    /// Adding one more texture would exceed the device's texture unit limit.
    #[error("maximum number of textures for this material has been reached (max {max})")]
    TextureLimitExceeded {
        /// The capability-reported maximum.
        max: u32,
    },
    /// A plugin with the same key is already attached.
    #[error("plugin {0} is already attached to this material")]
    DuplicatePlugin(PluginKey),
    /// A caller-supplied shader was passed in the wrong stage slot.
    #[error("expected a {expected:?} shader, got a {found:?} shader")]
    StageMismatch {
        /// Stage required by the slot.
        expected: ShaderStage,
        /// Stage of the supplied shader.
        found: ShaderStage,
    },
    /// The operation needs the material to be attached to a device.
    #[error("material is not attached to a graphics device")]
    NotAttached,
    /// The device could not answer a query.
    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::ContextUnavailable;
        assert_eq!(err.to_string(), "no graphics context available");

        let err = GraphicsError::InitializationFailed("no GL loader".to_string());
        assert_eq!(err.to_string(), "initialization failed: no GL loader");
    }

    #[test]
    fn test_material_error_display() {
        let err = MaterialError::TextureLimitExceeded { max: 8 };
        assert_eq!(
            err.to_string(),
            "maximum number of textures for this material has been reached (max 8)"
        );

        let err = MaterialError::DuplicatePlugin(PluginKey::Fresnel);
        assert_eq!(err.to_string(), "plugin Fresnel is already attached to this material");

        let err = MaterialError::StageMismatch {
            expected: ShaderStage::Vertex,
            found: ShaderStage::Fragment,
        };
        assert_eq!(err.to_string(), "expected a Vertex shader, got a Fragment shader");
    }

    #[test]
    fn test_graphics_error_converts() {
        let err: MaterialError = GraphicsError::ContextUnavailable.into();
        assert_eq!(err, MaterialError::Graphics(GraphicsError::ContextUnavailable));
    }
}
