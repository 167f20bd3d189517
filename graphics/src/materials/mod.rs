//! Material system.
//!
//! A [`Material`] describes a surface declaratively (textures, lighting,
//! diffuse and specular methods, plugins) and turns that description into a
//! linked GPU program on demand:
//!
//! ```text
//! mutator → dirty → use_program() → classify → compose → compile/link → resolve locations
//! ```
//!
//! - [`classify`] partitions textures by role
//! - [`compose`] assembles the vertex/fragment pair from templates and fragments
//! - [`UniformCache`] and [`ProgramUniforms`] handle locations and per-frame writes
//! - [`MaterialRegistry`] owns the materials of one renderer
//!
//! Lighting equations come from [`DiffuseMethod`] and [`SpecularMethod`]
//! implementations; extra effects come from [`MaterialPlugin`]s inserted at
//! one of six [`InsertLocation`]s.

mod binder;
mod classifier;
mod composer;
mod material;
pub mod methods;
pub mod plugins;
mod registry;

pub use binder::{ProgramUniforms, UniformCache};
pub use classifier::{ClassifiedTextures, classify};
pub use composer::{ComposedShaders, CompositionInput, compose};
pub use material::{BuildState, CapabilityCheck, Material, MaterialId};
pub use methods::{CookTorrance, DiffuseMethod, Lambert, Phong, SpecularMethod, Toon};
pub use plugins::{
    DecalPlugin, FresnelPlugin, MaterialPlugin, PluginKey, SpriteSheetPlugin, VertexWavePlugin,
};
pub use registry::MaterialRegistry;

pub use crate::shader::InsertLocation;
