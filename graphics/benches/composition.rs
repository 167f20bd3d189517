use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use chroma_core::math::Vec3;
use chroma_graphics::materials::{
    CompositionInput, DiffuseMethod, FresnelPlugin, Lambert, MaterialPlugin, Phong,
    SpecularMethod, SpriteSheetPlugin, compose,
};
use chroma_graphics::{
    BuildOutcome, CapabilityCheck, DummyBackend, GraphicsDevice, Light, Material, Texture,
    TextureId, TextureType, build_program,
};

fn textures(count: u32) -> Vec<Arc<Texture>> {
    (1..=count)
        .map(|i| {
            let texture = Texture::new(format!("t{i}"), TextureType::Diffuse);
            texture.set_texture_id(TextureId::from_raw(i));
            Arc::new(texture)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

fn bench_compose_unlit(c: &mut Criterion) {
    let textures = textures(1);
    c.bench_function("compose_unlit_1_texture", |b| {
        b.iter(|| {
            black_box(compose(&CompositionInput {
                textures: &textures,
                lighting_enabled: false,
                lights: &[],
                diffuse: None,
                specular: None,
                plugins: &[],
                time_enabled: false,
                use_vertex_colors: false,
            }));
        });
    });
}

fn bench_compose_lit(c: &mut Criterion) {
    let textures = textures(4);
    let lights: Vec<Arc<Light>> = (0..4)
        .map(|i| Arc::new(Light::point(Vec3::new(i as f32, 2.0, 0.0))))
        .collect();
    let diffuse: Arc<dyn DiffuseMethod> = Arc::new(Lambert::new());
    let specular: Arc<dyn SpecularMethod> = Arc::new(Phong::new());
    let plugins: Vec<Arc<dyn MaterialPlugin>> = vec![
        Arc::new(FresnelPlugin::new(0xffff_ffff)),
        Arc::new(SpriteSheetPlugin::new(4, 4)),
    ];

    c.bench_function("compose_lit_4_lights_4_textures_2_plugins", |b| {
        b.iter(|| {
            black_box(compose(&CompositionInput {
                textures: &textures,
                lighting_enabled: true,
                lights: &lights,
                diffuse: Some(&diffuse),
                specular: Some(&specular),
                plugins: &plugins,
                time_enabled: true,
                use_vertex_colors: false,
            }));
        });
    });
}

// ---------------------------------------------------------------------------
// Program builds
// ---------------------------------------------------------------------------

fn bench_dummy_build_program(c: &mut Criterion) {
    let device = GraphicsDevice::new(Arc::new(DummyBackend::new()));
    let composed = compose(&CompositionInput {
        textures: &textures(2),
        lighting_enabled: false,
        lights: &[],
        diffuse: None,
        specular: None,
        plugins: &[],
        time_enabled: false,
        use_vertex_colors: false,
    });

    c.bench_function("dummy_build_program", |b| {
        b.iter(|| {
            let outcome = build_program(
                &device,
                composed.vertex_source(),
                composed.fragment_source(),
            );
            if let BuildOutcome::Success(linked) = outcome {
                linked.release(device.backend());
            }
        });
    });
}

fn bench_dummy_material_rebuild(c: &mut Criterion) {
    let device = GraphicsDevice::new(Arc::new(DummyBackend::new()));
    let mut material = Material::new(CapabilityCheck::Deferred);
    for texture in textures(3) {
        material.add_texture(texture).unwrap();
    }
    material.add(&device).unwrap();

    let mut time = false;
    c.bench_function("dummy_material_rebuild", |b| {
        b.iter(|| {
            time = !time;
            material.enable_time(time);
            black_box(material.use_program().unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_compose_unlit,
    bench_compose_lit,
    bench_dummy_build_program,
    bench_dummy_material_rebuild,
);
criterion_main!(benches);
