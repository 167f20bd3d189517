//! # Chroma Demos
//!
//! Command-line tools showcasing the Chroma material engine.
//!
//! ## Available Demos
//!
//! - `material_inspector` - Compose a material on the dummy backend and print
//!   the generated GLSL

use std::str::FromStr;

use chroma_graphics::{EnvironmentUsage, TextureType};

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A texture given on the command line as `role:name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureArg {
    /// Texture role.
    pub texture_type: TextureType,
    /// How a cube or sphere map is drawn.
    pub usage: EnvironmentUsage,
    /// Texture name, also its sampler name.
    pub name: String,
}

impl FromStr for TextureArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (role, name) = s
            .split_once(':')
            .ok_or_else(|| format!("expected role:name, got '{s}'"))?;
        if name.is_empty() {
            return Err(format!("texture '{s}' has no name"));
        }
        let (texture_type, usage) = match role {
            "diffuse" => (TextureType::Diffuse, EnvironmentUsage::Environment),
            "normal" => (TextureType::Normal, EnvironmentUsage::Environment),
            "specular" => (TextureType::Specular, EnvironmentUsage::Environment),
            "alpha" => (TextureType::Alpha, EnvironmentUsage::Environment),
            "light" => (TextureType::Light, EnvironmentUsage::Environment),
            "cube" => (TextureType::CubeMap, EnvironmentUsage::Environment),
            "sky" => (TextureType::CubeMap, EnvironmentUsage::Sky),
            "sphere" => (TextureType::SphereMap, EnvironmentUsage::Environment),
            "video" => (TextureType::VideoTexture, EnvironmentUsage::Environment),
            "target" => (TextureType::RenderTarget, EnvironmentUsage::Environment),
            other => return Err(format!("unknown texture role '{other}'")),
        };
        Ok(Self {
            texture_type,
            usage,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_texture_arg() {
        let arg: TextureArg = "sky:stars".parse().unwrap();
        assert_eq!(arg.texture_type, TextureType::CubeMap);
        assert_eq!(arg.usage, EnvironmentUsage::Sky);
        assert_eq!(arg.name, "stars");
    }

    #[test]
    fn test_parse_texture_arg_errors() {
        assert!("earth".parse::<TextureArg>().is_err());
        assert!("diffuse:".parse::<TextureArg>().is_err());
        assert!("bump:earth".parse::<TextureArg>().is_err());
    }
}
