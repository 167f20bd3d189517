//! Partition of a material's textures by role.

use std::sync::Arc;

use crate::resources::{Texture, TextureType};

/// Textures grouped by the fragment that samples them.
///
/// Each list keeps the material's insertion order.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedTextures {
    /// Diffuse, video and render-target textures.
    pub diffuse: Vec<Arc<Texture>>,
    /// Normal maps.
    pub normal: Vec<Arc<Texture>>,
    /// Cube and sphere maps reflected on the surface.
    pub environment: Vec<Arc<Texture>>,
    /// Cube and sphere maps drawn as a sky.
    pub sky: Vec<Arc<Texture>>,
    /// Specular maps, consumed by the specular method.
    pub specular: Vec<Arc<Texture>>,
    /// Alpha masks.
    pub alpha: Vec<Arc<Texture>>,
    /// Light maps.
    pub light: Vec<Arc<Texture>>,
    /// At least one cube map is present.
    pub has_cube_maps: bool,
    /// At least one video texture is present.
    pub has_video_texture: bool,
}

impl ClassifiedTextures {
    /// Whether any sky texture is present.
    pub fn has_sky_texture(&self) -> bool {
        !self.sky.is_empty()
    }
}

/// Split `textures` by role. Lookup textures are left to plugins.
pub fn classify(textures: &[Arc<Texture>]) -> ClassifiedTextures {
    let mut out = ClassifiedTextures::default();
    for texture in textures {
        let list = match texture.texture_type() {
            TextureType::Diffuse | TextureType::RenderTarget => &mut out.diffuse,
            TextureType::VideoTexture => {
                out.has_video_texture = true;
                &mut out.diffuse
            }
            TextureType::Normal => &mut out.normal,
            TextureType::CubeMap | TextureType::SphereMap => {
                if texture.texture_type() == TextureType::CubeMap {
                    out.has_cube_maps = true;
                }
                if texture.is_sky_texture() {
                    &mut out.sky
                } else {
                    &mut out.environment
                }
            }
            TextureType::Specular => &mut out.specular,
            TextureType::Alpha => &mut out.alpha,
            TextureType::Light => &mut out.light,
            TextureType::Lookup => continue,
        };
        list.push(Arc::clone(texture));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::EnvironmentUsage;

    fn texture(name: &str, texture_type: TextureType) -> Arc<Texture> {
        Arc::new(Texture::new(name, texture_type))
    }

    fn names(list: &[Arc<Texture>]) -> Vec<&str> {
        list.iter().map(|t| t.name()).collect()
    }

    #[test]
    fn test_classify_by_role() {
        let textures = vec![
            texture("earth", TextureType::Diffuse),
            texture("bumps", TextureType::Normal),
            texture("video", TextureType::VideoTexture),
            texture("shine", TextureType::Specular),
            texture("mask", TextureType::Alpha),
            texture("baked", TextureType::Light),
            texture("table", TextureType::Lookup),
            texture("offscreen", TextureType::RenderTarget),
        ];
        let classified = classify(&textures);
        assert_eq!(names(&classified.diffuse), ["earth", "video", "offscreen"]);
        assert_eq!(names(&classified.normal), ["bumps"]);
        assert_eq!(names(&classified.specular), ["shine"]);
        assert_eq!(names(&classified.alpha), ["mask"]);
        assert_eq!(names(&classified.light), ["baked"]);
        assert!(classified.has_video_texture);
        assert!(!classified.has_cube_maps);
    }

    #[test]
    fn test_environment_and_sky_split() {
        let sky = Arc::new(
            Texture::new("skybox", TextureType::CubeMap)
                .with_environment_usage(EnvironmentUsage::Sky),
        );
        let textures = vec![
            sky,
            texture("reflection", TextureType::CubeMap),
            texture("dome", TextureType::SphereMap),
        ];
        let classified = classify(&textures);
        assert_eq!(names(&classified.sky), ["skybox"]);
        assert_eq!(names(&classified.environment), ["reflection", "dome"]);
        assert!(classified.has_cube_maps);
        assert!(classified.has_sky_texture());
    }

    #[test]
    fn test_sphere_map_alone_is_not_a_cube_map() {
        let classified = classify(&[texture("dome", TextureType::SphereMap)]);
        assert!(!classified.has_cube_maps);
    }
}
