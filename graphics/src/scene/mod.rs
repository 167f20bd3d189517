//! Scene collaborators consumed by materials.
//!
//! - [`Light`] - a light source shared between the scene and the materials it lights
//!
//! The scene owns its lights; materials hold `Arc` references handed to them
//! through [`Material::set_lights`](crate::materials::Material::set_lights).

mod light;

pub use light::{Light, LightKind, LightParams};
