//! # Material Inspector
//!
//! Demonstrates:
//! - Material composition from textures, lighting, methods and plugins
//! - Deferred capability checks against a device
//! - Build outcomes and diagnostics on the dummy backend
//!
//! Prints the composed GLSL of both stages.
//!
//! ```bash
//! cargo run -p chroma-demos --bin material_inspector -- \
//!     --texture diffuse:earth --texture sky:stars --lights 2 --diffuse lambert --plugin fresnel
//! ```

use std::sync::Arc;

use clap::{Parser, ValueEnum};

use chroma_core::math::Vec3;
use chroma_demos::TextureArg;
use chroma_graphics::materials::{
    CookTorrance, DecalPlugin, FresnelPlugin, Lambert, Phong, SpriteSheetPlugin, Toon,
    VertexWavePlugin,
};
use chroma_graphics::{
    BuildState, CapabilityCheck, DummyBackend, GraphicsDevice, Light, Material, MaterialError,
    MaterialPlugin, Texture, TextureId, TextureType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliDiffuse {
    None,
    Lambert,
    Toon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliSpecular {
    None,
    Phong,
    CookTorrance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliPlugin {
    Fresnel,
    SpriteSheet,
    Decal,
    VertexWave,
}

/// Material inspector arguments.
#[derive(Parser, Debug)]
#[command(
    name = "material_inspector",
    about = "Compose a Chroma material and print its shaders",
    long_about = "Composes a material on the dummy backend and prints the generated GLSL.\n\n\
        TEXTURE ROLES:\n\
          diffuse, normal, specular, alpha, light, cube, sky, sphere, video, target\n\
        \n\
        EXAMPLES:\n\
          # Lit earth with Lambert shading\n\
          ./material_inspector --texture diffuse:earth --lights 1 --diffuse lambert\n\
        \n\
          # Too many textures for the device\n\
          ./material_inspector --max-units 2 --deferred --texture diffuse:a --texture diffuse:b --texture diffuse:c",
    version
)]
struct Args {
    /// Texture as role:name. Repeatable.
    #[arg(long = "texture", value_name = "ROLE:NAME")]
    textures: Vec<TextureArg>,

    /// Number of point lights. Any value enables lighting.
    #[arg(long)]
    lights: Option<usize>,

    /// Diffuse method.
    #[arg(long, default_value = "lambert", value_enum)]
    diffuse: CliDiffuse,

    /// Specular method.
    #[arg(long, default_value = "none", value_enum)]
    specular: CliSpecular,

    /// Plugin to attach. Repeatable.
    #[arg(long = "plugin", value_enum)]
    plugins: Vec<CliPlugin>,

    /// Declare the time uniform.
    #[arg(long)]
    time: bool,

    /// Texture image units reported by the dummy device.
    #[arg(long, default_value = "8")]
    max_units: u32,

    /// Learn the unit limit on attach instead of at construction.
    #[arg(long)]
    deferred: bool,

    /// Default log filter, overridden by RUST_LOG.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn plugin(kind: CliPlugin, next_id: &mut u32) -> Arc<dyn MaterialPlugin> {
    match kind {
        CliPlugin::Fresnel => Arc::new(FresnelPlugin::new(0xff40_80ff)),
        CliPlugin::SpriteSheet => Arc::new(SpriteSheetPlugin::new(4, 4)),
        CliPlugin::Decal => {
            let decal = Texture::new("decal", TextureType::Lookup);
            decal.set_texture_id(TextureId::from_raw(*next_id));
            *next_id += 1;
            Arc::new(DecalPlugin::new(Arc::new(decal)))
        }
        CliPlugin::VertexWave => Arc::new(VertexWavePlugin::new(0.1, 2.0)),
    }
}

fn build_material(args: &Args, device: &Arc<GraphicsDevice>) -> Result<Material, MaterialError> {
    let check = if args.deferred {
        CapabilityCheck::Deferred
    } else {
        CapabilityCheck::Immediate(device.capabilities()?)
    };
    let mut material = Material::new(check).with_label("inspected");
    let mut next_id = 1;

    for arg in &args.textures {
        let texture = Texture::new(arg.name.clone(), arg.texture_type).with_environment_usage(arg.usage);
        texture.set_texture_id(TextureId::from_raw(next_id));
        next_id += 1;
        material.add_texture(Arc::new(texture))?;
    }

    if let Some(count) = args.lights {
        material.enable_lighting(true);
        let lights = (0..count)
            .map(|i| Arc::new(Light::point(Vec3::new(i as f32 * 2.0, 4.0, 2.0))))
            .collect();
        material.set_lights(lights);
    }

    material.set_diffuse_method(match args.diffuse {
        CliDiffuse::None => None,
        CliDiffuse::Lambert => Some(Arc::new(Lambert::new())),
        CliDiffuse::Toon => Some(Arc::new(Toon::new())),
    });
    material.set_specular_method(match args.specular {
        CliSpecular::None => None,
        CliSpecular::Phong => Some(Arc::new(Phong::new())),
        CliSpecular::CookTorrance => Some(Arc::new(CookTorrance::new())),
    });

    for kind in &args.plugins {
        material.add_plugin(plugin(*kind, &mut next_id))?;
    }
    material.enable_time(args.time);
    Ok(material)
}

fn main() -> Result<(), MaterialError> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();
    chroma_graphics::init();

    let backend = Arc::new(DummyBackend::new().with_max_texture_image_units(args.max_units));
    let device = GraphicsDevice::new(backend.clone());

    let mut material = build_material(&args, &device)?;
    material.add(&device)?;
    material.use_program()?;
    material.bind_textures();
    material.apply_params();

    match material.build_state() {
        BuildState::Clean => log::info!(
            "Built program {:?}: {} compiles, {} links, {} textures bound",
            material.program_handle(),
            backend.compile_count(),
            backend.link_count(),
            backend.bound_textures().len()
        ),
        BuildState::Dirty => log::warn!("Material not built: lighting is enabled without lights"),
        BuildState::Failed => log::error!(
            "Material failed to build: {}",
            material
                .last_outcome()
                .and_then(|outcome| outcome.diagnostic())
                .unwrap_or("unknown error")
        ),
    }

    if let Some(source) = material.vertex_source() {
        println!("// ---- vertex shader ----\n{source}");
    }
    if let Some(source) = material.fragment_source() {
        println!("// ---- fragment shader ----\n{source}");
    }

    material.unbind_textures();
    material.remove();
    Ok(())
}
