//! GPU resources referenced by materials.
//!
//! - [`Texture`] - a texture object with a semantic role
//!
//! Textures are owned by the caller and shared with [`Arc`]. A material keeps
//! a reference and records itself on the texture, but never uploads, frees or
//! otherwise owns the GPU object.
//!
//! [`Arc`]: std::sync::Arc

mod texture;

pub use texture::{EnvironmentUsage, Texture, TextureTarget, TextureType};
