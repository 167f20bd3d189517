//! Uniform location cache and per-program uniform writes.
//!
//! Locations are looked up lazily and cached by name. The cache belongs to a
//! material and is invalidated every time the material links a new program.
//!
//! Two kinds of names are tracked:
//! - plain uniforms (matrices, colors, method parameters): a miss is cached
//!   too, since the driver is free to optimize unused uniforms out
//! - samplers: a miss is logged at error level once per link and cached
//!   until the next invalidation; names registered with
//!   [`UniformCache::register`] survive invalidation and are re-resolved
//!   after every link

use std::collections::HashMap;

use crate::backend::{GpuBackend, ProgramHandle, TextureId, UniformLocation, UniformValue};
use crate::resources::TextureTarget;

/// Name to location map for one material.
#[derive(Debug, Default)]
pub struct UniformCache {
    uniforms: HashMap<String, Option<UniformLocation>>,
    samplers: HashMap<String, Option<UniformLocation>>,
    registered: Vec<String>,
}

impl UniformCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ad-hoc sampler name to resolve after every link.
    pub fn register(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.registered.contains(&name) {
            self.registered.push(name);
        }
    }

    /// Registered ad-hoc names.
    pub fn registered(&self) -> &[String] {
        &self.registered
    }

    /// Drop every cached location. Registered names are kept.
    pub fn invalidate(&mut self) {
        self.uniforms.clear();
        self.samplers.clear();
    }

    /// Cached sampler location, without querying the driver.
    pub fn cached_sampler(&self, name: &str) -> Option<UniformLocation> {
        self.samplers.get(name).copied().flatten()
    }

    /// Resolve the registered names and then `sampler_names` for a freshly
    /// linked program.
    pub fn resolve_after_link<'a>(
        &mut self,
        backend: &dyn GpuBackend,
        program: ProgramHandle,
        sampler_names: impl IntoIterator<Item = &'a str>,
    ) {
        let registered = std::mem::take(&mut self.registered);
        for name in &registered {
            self.sampler_location(backend, program, name);
        }
        self.registered = registered;
        for name in sampler_names {
            self.sampler_location(backend, program, name);
        }
    }

    fn sampler_location(
        &mut self,
        backend: &dyn GpuBackend,
        program: ProgramHandle,
        name: &str,
    ) -> Option<UniformLocation> {
        if let Some(location) = self.samplers.get(name) {
            return *location;
        }
        let location = backend.uniform_location(program, name);
        if location.is_none() {
            log::error!(
                "Could not get uniform location for {name}, program {}",
                program.raw()
            );
        }
        self.samplers.insert(name.to_string(), location);
        location
    }

    fn uniform_location(
        &mut self,
        backend: &dyn GpuBackend,
        program: ProgramHandle,
        name: &str,
    ) -> Option<UniformLocation> {
        if let Some(location) = self.uniforms.get(name) {
            return *location;
        }
        let location = backend.uniform_location(program, name);
        if location.is_none() {
            log::trace!("Uniform {name} is not active in program {}", program.raw());
        }
        self.uniforms.insert(name.to_string(), location);
        location
    }
}

/// Uniform writer for the program a material has bound this frame.
///
/// Handed to lights, methods and plugins while parameters are pushed and
/// textures are bound.
pub struct ProgramUniforms<'a> {
    backend: &'a dyn GpuBackend,
    program: ProgramHandle,
    cache: &'a mut UniformCache,
}

impl<'a> ProgramUniforms<'a> {
    /// Wrap `program` and its cache.
    pub fn new(
        backend: &'a dyn GpuBackend,
        program: ProgramHandle,
        cache: &'a mut UniformCache,
    ) -> Self {
        Self {
            backend,
            program,
            cache,
        }
    }

    /// The bound program.
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// The backend, for calls not covered here.
    pub fn backend(&self) -> &dyn GpuBackend {
        self.backend
    }

    /// Write `value` to `name`. Inactive uniforms are skipped.
    pub fn set(&mut self, name: &str, value: UniformValue) {
        if let Some(location) = self.cache.uniform_location(self.backend, self.program, name) {
            self.backend.set_uniform(location, &value);
        }
    }

    /// Bind `texture` on `unit` and point sampler `name` at it.
    ///
    /// Returns `false` and binds nothing when the sampler has no location.
    pub fn bind_sampler(
        &mut self,
        name: &str,
        unit: u32,
        target: TextureTarget,
        texture: Option<TextureId>,
    ) -> bool {
        let Some(location) = self.cache.sampler_location(self.backend, self.program, name) else {
            return false;
        };
        self.backend.active_texture(unit);
        self.backend.bind_texture(target, texture);
        self.backend
            .set_uniform(location, &UniformValue::Int(unit as i32));
        true
    }

    /// Reset `target` on `unit`.
    pub fn unbind_unit(&mut self, unit: u32, target: TextureTarget) {
        self.backend.active_texture(unit);
        self.backend.bind_texture(target, None);
    }
}
