//! Graphics device.
//!
//! The [`GraphicsDevice`] wraps the backend a renderer draws with and answers
//! capability queries. Materials hold an `Arc<GraphicsDevice>` once attached.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::backend::GpuBackend;
use crate::error::GraphicsError;

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Texture image units available to the fragment stage.
    pub max_texture_image_units: u32,
    /// Name of the backend that reported these values.
    pub backend_name: &'static str,
}

impl DeviceCapabilities {
    /// Capabilities with the given texture unit limit.
    pub fn with_max_texture_image_units(max_texture_image_units: u32) -> Self {
        Self {
            max_texture_image_units,
            backend_name: "unspecified",
        }
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self::with_max_texture_image_units(crate::backend::dummy::DEFAULT_MAX_TEXTURE_IMAGE_UNITS)
    }
}

/// A graphics device bound to one context.
///
/// # Thread Safety
///
/// Backends own thread-bound GL state, so a device is used from the render
/// thread only. Mutations coming from other threads must be serialized onto
/// that thread by the caller.
///
/// # Example
///
/// ```ignore
/// let backend = Arc::new(DummyBackend::new());
/// let device = GraphicsDevice::new(backend);
/// let caps = device.capabilities()?;
/// ```
pub struct GraphicsDevice {
    backend: Arc<dyn GpuBackend>,
    capabilities: RwLock<Option<DeviceCapabilities>>,
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("backend", &self.backend.name())
            .field("capabilities", &*self.capabilities.read())
            .finish()
    }
}

impl GraphicsDevice {
    /// Create a device over `backend`.
    ///
    /// Capabilities are queried now when a context is current, otherwise on the
    /// first [`capabilities`](Self::capabilities) call that finds one.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Arc<Self> {
        let device = Self {
            backend,
            capabilities: RwLock::new(None),
        };
        match device.refresh_capabilities() {
            Ok(caps) => log::info!(
                "GraphicsDevice: {} ({} texture units)",
                caps.backend_name,
                caps.max_texture_image_units
            ),
            Err(e) => log::debug!("GraphicsDevice: capabilities deferred: {e}"),
        }
        Arc::new(device)
    }

    /// Get the backend.
    pub fn backend(&self) -> &dyn GpuBackend {
        self.backend.as_ref()
    }

    /// Whether the backend currently has a usable context.
    pub fn has_context(&self) -> bool {
        self.backend.has_context()
    }

    /// Get the device capabilities, querying the backend if not known yet.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::ContextUnavailable`] when nothing was cached
    /// and no context is current.
    pub fn capabilities(&self) -> Result<DeviceCapabilities, GraphicsError> {
        if let Some(caps) = *self.capabilities.read() {
            return Ok(caps);
        }
        self.refresh_capabilities()
    }

    /// Re-query the backend, replacing cached capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::ContextUnavailable`] when no context is current.
    pub fn refresh_capabilities(&self) -> Result<DeviceCapabilities, GraphicsError> {
        if !self.backend.has_context() {
            return Err(GraphicsError::ContextUnavailable);
        }
        let caps = DeviceCapabilities {
            max_texture_image_units: self.backend.max_texture_image_units(),
            backend_name: self.backend.name(),
        };
        *self.capabilities.write() = Some(caps);
        Ok(caps)
    }
}

static_assertions::assert_impl_all!(DeviceCapabilities: Send, Sync);
