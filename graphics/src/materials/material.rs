//! The material aggregate and its build state machine.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chroma_core::color::{argb_to_rgb, argb_to_rgba, rgba_to_argb};
use chroma_core::math::{Mat4, mat3_to_array, mat4_to_array, normal_matrix};
use chroma_core::profiling::profile_scope;

use crate::backend::{ProgramHandle, UniformLocation, UniformValue};
use crate::compiler::{BuildOutcome, build_program};
use crate::device::{DeviceCapabilities, GraphicsDevice};
use crate::error::MaterialError;
use crate::resources::Texture;
use crate::scene::Light;
use crate::shader::fragments::{AMBIENT_COLOR, AMBIENT_INTENSITY};
use crate::shader::templates::names;
use crate::shader::{Shader, ShaderStage};

use super::binder::{ProgramUniforms, UniformCache};
use super::composer::{CompositionInput, compose};
use super::methods::{DiffuseMethod, SpecularMethod};
use super::plugins::{MaterialPlugin, PluginKey};

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique material identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u64);

impl MaterialId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Where a material stands relative to its GPU program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildState {
    /// Properties changed since the last build, or nothing was built yet.
    Dirty,
    /// Built and linked; a program is available.
    Clean,
    /// Built but compile or link failed. Not retried until the next mutation.
    Failed,
}

/// How a material learns the texture unit limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityCheck {
    /// The limit is known at construction.
    Immediate(DeviceCapabilities),
    /// No limit until [`Material::add`] queries the device.
    Deferred,
}

/// Per-frame matrices; never part of the build.
#[derive(Debug, Default, Clone)]
struct Matrices {
    mvp: Option<[f32; 16]>,
    model: Option<[f32; 16]>,
    normal: Option<[f32; 9]>,
    model_view: Option<[f32; 16]>,
    inverse_view: Option<[f32; 16]>,
}

/// A surface description compiled lazily into a GPU program.
///
/// Mutators that change the shader shape (textures, methods, plugins,
/// lighting, time, vertex colors) mark the material dirty. The next
/// [`use_program`](Self::use_program) rebuilds it. A failed build is
/// remembered and not retried until the material is mutated again.
///
/// Per-frame values (color, time, matrices, method and plugin parameters)
/// never trigger a rebuild.
///
/// # Threading
///
/// All calls that reach the GPU must happen on the context thread. Callers
/// mutating a material from elsewhere serialize those calls onto that thread.
///
/// # Example
///
/// ```ignore
/// let mut material = Material::new(CapabilityCheck::Immediate(device.capabilities()?));
/// material.add_texture(earth)?;
/// material.enable_lighting(true);
/// material.set_lights(vec![sun]);
/// material.set_diffuse_method(Some(Arc::new(Lambert::new())));
/// material.add(&device)?;
///
/// // every frame
/// material.use_program()?;
/// material.bind_textures();
/// material.apply_params();
/// // draw
/// material.unbind_textures();
/// ```
#[derive(Debug)]
pub struct Material {
    id: MaterialId,
    label: Option<String>,
    device: Option<Arc<GraphicsDevice>>,
    capability_check: CapabilityCheck,
    max_textures: u32,

    textures: Vec<Arc<Texture>>,
    diffuse: Option<Arc<dyn DiffuseMethod>>,
    specular: Option<Arc<dyn SpecularMethod>>,
    plugins: Vec<Arc<dyn MaterialPlugin>>,
    lighting_enabled: bool,
    lights: Vec<Arc<Light>>,
    time_enabled: bool,
    use_vertex_colors: bool,

    time: f32,
    color: [f32; 4],
    color_influence: f32,
    ambient_color: [f32; 3],
    ambient_intensity: [f32; 3],
    matrices: Matrices,

    custom_shaders: bool,
    shaders: Option<(Shader, Shader)>,
    dirty: bool,
    outcome: Option<BuildOutcome>,
    uniforms: UniformCache,
    composition_count: usize,
}

impl Material {
    /// A composed material.
    pub fn new(capability_check: CapabilityCheck) -> Self {
        let max_textures = match &capability_check {
            CapabilityCheck::Immediate(caps) => caps.max_texture_image_units,
            CapabilityCheck::Deferred => u32::MAX,
        };
        Self {
            id: MaterialId::next(),
            label: None,
            device: None,
            capability_check,
            max_textures,
            textures: Vec::new(),
            diffuse: None,
            specular: None,
            plugins: Vec::new(),
            lighting_enabled: false,
            lights: Vec::new(),
            time_enabled: false,
            use_vertex_colors: false,
            time: 0.0,
            color: [1.0, 0.0, 0.0, 1.0],
            color_influence: 1.0,
            ambient_color: [0.2, 0.2, 0.2],
            ambient_intensity: [0.3, 0.3, 0.3],
            matrices: Matrices::default(),
            custom_shaders: false,
            shaders: None,
            dirty: true,
            outcome: None,
            uniforms: UniformCache::new(),
            composition_count: 0,
        }
    }

    /// A material running caller-supplied shaders. Composition never runs;
    /// the shaders are only built if they still need it.
    ///
    /// # Errors
    ///
    /// Returns [`MaterialError::StageMismatch`] when either shader is not of
    /// the stage its slot requires.
    pub fn with_shaders(
        vertex: Shader,
        fragment: Shader,
        capability_check: CapabilityCheck,
    ) -> Result<Self, MaterialError> {
        let slots = [
            (vertex.stage(), ShaderStage::Vertex),
            (fragment.stage(), ShaderStage::Fragment),
        ];
        for (found, expected) in slots {
            if found != expected {
                return Err(MaterialError::StageMismatch { expected, found });
            }
        }
        let mut material = Self::new(capability_check);
        material.custom_shaders = true;
        material.shaders = Some((vertex, fragment));
        Ok(material)
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The material id.
    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// The debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn display_name(&self) -> String {
        match &self.label {
            Some(label) => format!("'{label}'"),
            None => format!("#{}", self.id.raw()),
        }
    }

    /// Whether the material was built from caller-supplied shaders.
    pub fn uses_custom_shaders(&self) -> bool {
        self.custom_shaders
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Attach to `device` and build if the lighting preconditions hold.
    ///
    /// A deferred capability check queries the device here.
    pub fn add(&mut self, device: &Arc<GraphicsDevice>) -> Result<(), MaterialError> {
        if let CapabilityCheck::Deferred = self.capability_check {
            let caps = device.capabilities()?;
            self.max_textures = caps.max_texture_image_units;
            if self.textures.len() > self.max_textures as usize {
                log::warn!(
                    "Material {} holds {} textures but the device has {} texture units",
                    self.display_name(),
                    self.textures.len(),
                    self.max_textures
                );
            }
            self.capability_check = CapabilityCheck::Immediate(caps);
        }

        let moved = matches!(&self.device, Some(previous) if !Arc::ptr_eq(previous, device));
        if moved {
            self.release_program();
            self.dirty = true;
        }
        self.device = Some(Arc::clone(device));

        if !self.dirty {
            return Ok(());
        }
        if self.lighting_ready() {
            self.build(device);
        } else {
            log::debug!(
                "Material {}: lighting enabled without lights, build deferred",
                self.display_name()
            );
        }
        Ok(())
    }

    /// Detach, release the GPU program and drop light, texture and matrix
    /// references.
    pub fn remove(&mut self) {
        self.matrices = Matrices::default();
        self.lights.clear();
        for texture in self.textures.drain(..) {
            texture.unregister_material(self.id);
        }
        self.release_program();
        self.uniforms.invalidate();
        if !self.custom_shaders {
            self.shaders = None;
        }
        self.dirty = true;
        self.device = None;
    }

    /// Rebuild from scratch, after the context was lost.
    ///
    /// Old GPU handles are forgotten, not deleted: they died with the context,
    /// and the new context may hand out the same names. Calling this while the
    /// old context is still alive leaks the previous program; mutate the
    /// material and call [`use_program`](Self::use_program) to rebuild instead.
    pub fn reload(&mut self) -> Result<(), MaterialError> {
        let device = self.device.clone().ok_or(MaterialError::NotAttached)?;
        self.outcome = None;
        self.uniforms.invalidate();
        self.dirty = true;
        if self.lighting_ready() {
            self.build(&device);
        }
        Ok(())
    }

    /// Make sure the program is built and bind it.
    ///
    /// Returns the bound program, or `None` when the build failed or is
    /// waiting for a light. A failed build is not retried here.
    pub fn use_program(&mut self) -> Result<Option<ProgramHandle>, MaterialError> {
        let device = self.device.clone().ok_or(MaterialError::NotAttached)?;
        if self.dirty {
            if !self.lighting_ready() {
                device.backend().use_program(None);
                return Ok(None);
            }
            self.build(&device);
            let program = self.program_handle();
            device.backend().use_program(program);
            self.push_matrices();
            return Ok(program);
        }
        let program = self.program_handle();
        device.backend().use_program(program);
        Ok(program)
    }

    /// Re-send the stored matrices to a freshly linked program.
    fn push_matrices(&mut self) {
        let matrices = self.matrices.clone();
        let mat4s = [
            (names::MVP_MATRIX, matrices.mvp),
            (names::MODEL_MATRIX, matrices.model),
            (names::MODEL_VIEW_MATRIX, matrices.model_view),
            (names::INVERSE_VIEW_MATRIX, matrices.inverse_view),
        ];
        for (name, raw) in mat4s {
            if let Some(raw) = raw {
                self.push(name, UniformValue::Mat4(raw));
            }
        }
        if let Some(raw) = matrices.normal {
            self.push(names::NORMAL_MATRIX, UniformValue::Mat3(raw));
        }
    }

    fn lighting_ready(&self) -> bool {
        !self.lighting_enabled || !self.lights.is_empty()
    }

    fn composes_lighting(&self) -> bool {
        self.lighting_enabled && !self.lights.is_empty()
    }

    fn build(&mut self, device: &GraphicsDevice) {
        profile_scope!("material_build");
        self.release_program();

        if !self.custom_shaders {
            let composed = compose(&CompositionInput {
                textures: &self.textures,
                lighting_enabled: self.lighting_enabled,
                lights: &self.lights,
                diffuse: self.diffuse.as_ref(),
                specular: self.specular.as_ref(),
                plugins: &self.plugins,
                time_enabled: self.time_enabled,
                use_vertex_colors: self.use_vertex_colors,
            });
            self.composition_count += 1;
            self.shaders = Some((composed.vertex, composed.fragment));
        }

        let Some((vertex, fragment)) = self.shaders.as_mut() else {
            log::error!("Material {} has no shaders to build", self.display_name());
            self.dirty = false;
            return;
        };
        if vertex.needs_build() {
            vertex.build();
        }
        if fragment.needs_build() {
            fragment.build();
        }
        log::debug!("Vertex shader:\n{}", vertex.source().unwrap_or_default());
        log::debug!("Fragment shader:\n{}", fragment.source().unwrap_or_default());

        let outcome = build_program(
            device,
            vertex.source().unwrap_or_default(),
            fragment.source().unwrap_or_default(),
        );

        self.uniforms.invalidate();
        match outcome.program() {
            Some(program) => {
                self.uniforms.resolve_after_link(
                    device.backend(),
                    program,
                    self.textures.iter().map(|t| t.name()),
                );
            }
            None => log::warn!(
                "Material {} failed to build; it stays unbound until changed",
                self.display_name()
            ),
        }
        self.outcome = Some(outcome);
        self.dirty = false;
    }

    fn release_program(&mut self) {
        let Some(BuildOutcome::Success(linked)) = self.outcome.take() else {
            return;
        };
        match &self.device {
            Some(device) if device.has_context() => linked.release(device.backend()),
            _ => log::debug!(
                "Material {}: no context, program {} forgotten",
                self.display_name(),
                linked.program().raw()
            ),
        }
    }

    fn active_program(&self) -> Option<(Arc<GraphicsDevice>, ProgramHandle)> {
        if self.dirty {
            return None;
        }
        Some((self.device.clone()?, self.program_handle()?))
    }

    fn push(&mut self, name: &str, value: UniformValue) {
        if let Some((device, program)) = self.active_program() {
            ProgramUniforms::new(device.backend(), program, &mut self.uniforms).set(name, value);
        }
    }

    // ------------------------------------------------------------------
    // Per-frame binding
    // ------------------------------------------------------------------

    /// Push time, color, ambient light, texture influences, lights, methods
    /// and plugin parameters into the bound program.
    pub fn apply_params(&mut self) {
        let Some((device, program)) = self.active_program() else {
            return;
        };
        let lit = self.composes_lighting();
        let mut uniforms = ProgramUniforms::new(device.backend(), program, &mut self.uniforms);

        if self.time_enabled {
            uniforms.set(names::TIME, UniformValue::Float(self.time));
        }
        uniforms.set(names::COLOR, UniformValue::Vec4(self.color));
        uniforms.set(names::COLOR_INFLUENCE, UniformValue::Float(self.color_influence));
        for texture in &self.textures {
            uniforms.set(
                &texture.influence_uniform(),
                UniformValue::Float(texture.influence()),
            );
        }

        if lit {
            uniforms.set(AMBIENT_COLOR, UniformValue::Vec3(self.ambient_color));
            uniforms.set(AMBIENT_INTENSITY, UniformValue::Vec3(self.ambient_intensity));
            for (index, light) in self.lights.iter().enumerate() {
                light.apply_params(index, &mut uniforms);
            }
            if let Some(diffuse) = &self.diffuse {
                diffuse.apply_params(&mut uniforms);
            }
            if let Some(specular) = &self.specular {
                specular.apply_params(&mut uniforms);
            }
        }

        for plugin in &self.plugins {
            plugin.apply_params(&mut uniforms);
        }
    }

    /// Number of material textures that get a unit.
    fn bound_texture_count(&self) -> usize {
        self.textures.len().min(self.max_textures as usize)
    }

    /// Bind texture `i` on unit `i`, then the plugins' textures after them.
    ///
    /// Textures beyond the unit limit are skipped with a warning, on every
    /// call.
    pub fn bind_textures(&mut self) {
        profile_scope!("bind_textures");
        let Some((device, program)) = self.active_program() else {
            return;
        };
        let count = self.bound_texture_count();
        if count < self.textures.len() {
            log::warn!(
                "Material {}: maximum number of textures reached, binding {count} of {}",
                self.display_name(),
                self.textures.len()
            );
        }

        let mut uniforms = ProgramUniforms::new(device.backend(), program, &mut self.uniforms);
        for (unit, texture) in self.textures.iter().take(count).enumerate() {
            uniforms.bind_sampler(
                texture.name(),
                unit as u32,
                texture.target(),
                texture.texture_id(),
            );
        }
        for plugin in &self.plugins {
            plugin.bind_textures(&mut uniforms, count as u32);
        }
    }

    /// Reset every unit [`bind_textures`](Self::bind_textures) used and the
    /// array buffer binding.
    pub fn unbind_textures(&mut self) {
        let Some((device, program)) = self.active_program() else {
            return;
        };
        let count = self.bound_texture_count();
        let mut uniforms = ProgramUniforms::new(device.backend(), program, &mut self.uniforms);
        for plugin in &self.plugins {
            plugin.unbind_textures(&mut uniforms);
        }
        for (unit, texture) in self.textures.iter().take(count).enumerate() {
            uniforms.unbind_unit(unit as u32, texture.target());
        }
        device.backend().unbind_array_buffer();
    }

    /// Bind `texture` to the sampler `name` on `unit`.
    ///
    /// Returns `false` when `name` has no location in the program.
    pub fn bind_texture_by_name(&mut self, name: &str, unit: u32, texture: &Texture) -> bool {
        let Some((device, program)) = self.active_program() else {
            return false;
        };
        ProgramUniforms::new(device.backend(), program, &mut self.uniforms).bind_sampler(
            name,
            unit,
            texture.target(),
            texture.texture_id(),
        )
    }

    /// Resolve sampler `name` after every link, alongside the material's own
    /// textures.
    pub fn register_texture_name(&mut self, name: impl Into<String>) {
        self.uniforms.register(name);
    }

    /// Cached location of a sampler.
    pub fn texture_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.cached_sampler(name)
    }

    // ------------------------------------------------------------------
    // Textures
    // ------------------------------------------------------------------

    /// Append a texture. Adding a texture that is already present does
    /// nothing.
    pub fn add_texture(&mut self, texture: Arc<Texture>) -> Result<(), MaterialError> {
        if self.textures.iter().any(|t| Arc::ptr_eq(t, &texture)) {
            return Ok(());
        }
        if self.textures.len() >= self.max_textures as usize {
            return Err(MaterialError::TextureLimitExceeded {
                max: self.max_textures,
            });
        }
        texture.register_material(self.id);
        self.textures.push(texture);
        self.dirty = true;
        Ok(())
    }

    /// Remove a texture. Returns whether it was present.
    pub fn remove_texture(&mut self, texture: &Arc<Texture>) -> bool {
        let Some(index) = self.textures.iter().position(|t| Arc::ptr_eq(t, texture)) else {
            return false;
        };
        self.textures.remove(index).unregister_material(self.id);
        self.dirty = true;
        true
    }

    /// Textures in insertion order.
    pub fn textures(&self) -> &[Arc<Texture>] {
        &self.textures
    }

    /// Add every texture of this material to `other`.
    pub fn copy_textures_to(&self, other: &mut Material) -> Result<(), MaterialError> {
        for texture in &self.textures {
            other.add_texture(Arc::clone(texture))?;
        }
        Ok(())
    }

    /// Texture unit limit; `u32::MAX` while a deferred check is pending.
    pub fn max_textures(&self) -> u32 {
        self.max_textures
    }

    // ------------------------------------------------------------------
    // Lighting, methods and plugins
    // ------------------------------------------------------------------

    /// Set or clear the diffuse method.
    pub fn set_diffuse_method(&mut self, method: Option<Arc<dyn DiffuseMethod>>) {
        let same = match (&self.diffuse, &method) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.diffuse = method;
            self.dirty = true;
        }
    }

    /// The diffuse method.
    pub fn diffuse_method(&self) -> Option<&Arc<dyn DiffuseMethod>> {
        self.diffuse.as_ref()
    }

    /// Set or clear the specular method.
    pub fn set_specular_method(&mut self, method: Option<Arc<dyn SpecularMethod>>) {
        let same = match (&self.specular, &method) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.specular = method;
            self.dirty = true;
        }
    }

    /// The specular method.
    pub fn specular_method(&self) -> Option<&Arc<dyn SpecularMethod>> {
        self.specular.as_ref()
    }

    /// Attach a plugin. One plugin per [`PluginKey`].
    pub fn add_plugin(&mut self, plugin: Arc<dyn MaterialPlugin>) -> Result<(), MaterialError> {
        let key = plugin.key();
        if self.plugins.iter().any(|p| p.key() == key) {
            return Err(MaterialError::DuplicatePlugin(key));
        }
        self.plugins.push(plugin);
        self.dirty = true;
        Ok(())
    }

    /// Detach the plugin with `key`.
    pub fn remove_plugin(&mut self, key: &PluginKey) -> Option<Arc<dyn MaterialPlugin>> {
        let index = self.plugins.iter().position(|p| p.key() == *key)?;
        self.dirty = true;
        Some(self.plugins.remove(index))
    }

    /// The plugin with `key`.
    pub fn plugin(&self, key: &PluginKey) -> Option<&Arc<dyn MaterialPlugin>> {
        self.plugins.iter().find(|p| p.key() == *key)
    }

    /// Plugins in registration order.
    pub fn plugins(&self) -> &[Arc<dyn MaterialPlugin>] {
        &self.plugins
    }

    /// Toggle lighting.
    pub fn enable_lighting(&mut self, enabled: bool) {
        if self.lighting_enabled != enabled {
            self.lighting_enabled = enabled;
            self.dirty = true;
        }
    }

    /// Whether lighting is enabled.
    pub fn lighting_enabled(&self) -> bool {
        self.lighting_enabled
    }

    /// Replace the referenced lights. A different list marks the material
    /// dirty.
    pub fn set_lights(&mut self, lights: Vec<Arc<Light>>) {
        let same = self.lights.len() == lights.len()
            && self.lights.iter().zip(&lights).all(|(a, b)| Arc::ptr_eq(a, b));
        if !same {
            self.lights = lights;
            self.dirty = true;
        }
    }

    /// Referenced lights.
    pub fn lights(&self) -> &[Arc<Light>] {
        &self.lights
    }

    /// Toggle the `uTime` uniform.
    pub fn enable_time(&mut self, enabled: bool) {
        if self.time_enabled != enabled {
            self.time_enabled = enabled;
            self.dirty = true;
        }
    }

    /// Take the base color from the vertex color attribute.
    pub fn use_vertex_colors(&mut self, enabled: bool) {
        if self.use_vertex_colors != enabled {
            self.use_vertex_colors = enabled;
            self.dirty = true;
        }
    }

    // ------------------------------------------------------------------
    // Per-frame values
    // ------------------------------------------------------------------

    /// Time pushed as `uTime`.
    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Current time.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Set the color from ARGB.
    pub fn set_color(&mut self, color: u32) {
        self.color = argb_to_rgba(color);
    }

    /// Set the color as RGBA.
    pub fn set_color_rgba(&mut self, color: [f32; 4]) {
        self.color = color;
    }

    /// The color as ARGB.
    pub fn color(&self) -> u32 {
        rgba_to_argb(self.color)
    }

    /// Weight of the material color against texture colors.
    pub fn set_color_influence(&mut self, influence: f32) {
        self.color_influence = influence;
    }

    /// Current color influence.
    pub fn color_influence(&self) -> f32 {
        self.color_influence
    }

    /// Set the ambient light color from ARGB.
    pub fn set_ambient_color(&mut self, color: u32) {
        self.ambient_color = argb_to_rgb(color);
    }

    /// Set the per-channel ambient intensity.
    pub fn set_ambient_intensity(&mut self, intensity: [f32; 3]) {
        self.ambient_intensity = intensity;
    }

    /// Model-view-projection matrix.
    pub fn set_mvp_matrix(&mut self, mvp: &Mat4) {
        let raw = mat4_to_array(mvp);
        self.matrices.mvp = Some(raw);
        self.push(names::MVP_MATRIX, UniformValue::Mat4(raw));
    }

    /// Model matrix; also derives the normal matrix.
    pub fn set_model_matrix(&mut self, model: &Mat4) {
        let raw = mat4_to_array(model);
        self.matrices.model = Some(raw);
        self.push(names::MODEL_MATRIX, UniformValue::Mat4(raw));

        match normal_matrix(model) {
            Some(normal) => {
                let raw = mat3_to_array(&normal);
                self.matrices.normal = Some(raw);
                self.push(names::NORMAL_MATRIX, UniformValue::Mat3(raw));
            }
            None => log::debug!(
                "Material {}: singular model matrix, keeping the previous normal matrix",
                self.display_name()
            ),
        }
    }

    /// Model-view matrix.
    pub fn set_model_view_matrix(&mut self, model_view: &Mat4) {
        let raw = mat4_to_array(model_view);
        self.matrices.model_view = Some(raw);
        self.push(names::MODEL_VIEW_MATRIX, UniformValue::Mat4(raw));
    }

    /// Inverse view matrix.
    pub fn set_inverse_view_matrix(&mut self, inverse_view: &Mat4) {
        let raw = mat4_to_array(inverse_view);
        self.matrices.inverse_view = Some(raw);
        self.push(names::INVERSE_VIEW_MATRIX, UniformValue::Mat4(raw));
    }

    /// The last normal matrix, column-major.
    pub fn normal_matrix(&self) -> Option<[f32; 9]> {
        self.matrices.normal
    }

    /// The last model-view-projection matrix, column-major.
    pub fn mvp_matrix(&self) -> Option<[f32; 16]> {
        self.matrices.mvp
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Current build state.
    pub fn build_state(&self) -> BuildState {
        if self.dirty {
            return BuildState::Dirty;
        }
        match &self.outcome {
            Some(outcome) if outcome.is_success() => BuildState::Clean,
            Some(_) => BuildState::Failed,
            None => BuildState::Dirty,
        }
    }

    /// Whether a rebuild is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the material is attached to a device.
    pub fn is_attached(&self) -> bool {
        self.device.is_some()
    }

    /// The linked program, when the material is clean and the last build
    /// succeeded. `None` while a rebuild is pending.
    pub fn program_handle(&self) -> Option<ProgramHandle> {
        if self.dirty {
            return None;
        }
        self.outcome.as_ref().and_then(BuildOutcome::program)
    }

    /// The last build result.
    pub fn last_outcome(&self) -> Option<&BuildOutcome> {
        self.outcome.as_ref()
    }

    /// How many times composition ran.
    pub fn composition_count(&self) -> usize {
        self.composition_count
    }

    /// The last built vertex source.
    pub fn vertex_source(&self) -> Option<&str> {
        self.shaders.as_ref().and_then(|(vertex, _)| vertex.source())
    }

    /// The last built fragment source.
    pub fn fragment_source(&self) -> Option<&str> {
        self.shaders.as_ref().and_then(|(_, fragment)| fragment.source())
    }
}
