//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't talk to a driver but emulates the parts of one the
//! material engine depends on: shader sources are checked for obvious
//! errors, programs expose only the uniforms their sources declare, and
//! every call is recorded so tests can assert on what reached the "GPU".

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;

use parking_lot::Mutex;

use crate::resources::TextureTarget;
use crate::shader::ShaderStage;

use super::{GpuBackend, ProgramHandle, ShaderHandle, TextureId, UniformLocation, UniformValue};

/// Texture unit count reported when none is configured (the GLES 2.0 minimum).
pub const DEFAULT_MAX_TEXTURE_IMAGE_UNITS: u32 = 8;

#[derive(Debug)]
struct DummyProgram {
    uniforms: HashMap<String, UniformLocation>,
}

#[derive(Debug, Default)]
struct DummyState {
    has_context: bool,
    next_object: u32,
    next_location: u32,
    shaders: HashMap<ShaderHandle, (ShaderStage, String)>,
    programs: HashMap<ProgramHandle, DummyProgram>,
    location_names: HashMap<UniformLocation, String>,
    fail_next_link: Option<String>,
    compile_calls: usize,
    link_calls: usize,
    deleted_shaders: usize,
    deleted_programs: usize,
    current_program: Option<ProgramHandle>,
    active_unit: u32,
    bound: BTreeMap<u32, (TextureTarget, TextureId)>,
    bind_calls: usize,
    uniform_lookups: usize,
    uniform_writes: Vec<(String, UniformValue)>,
    array_buffer_unbinds: usize,
}

impl DummyState {
    fn allocate_object(&mut self) -> NonZeroU32 {
        let id = NonZeroU32::MIN.saturating_add(self.next_object);
        self.next_object += 1;
        id
    }
}

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    max_texture_image_units: u32,
    state: Mutex<DummyState>,
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyBackend {
    /// Create a new dummy backend with a current context.
    pub fn new() -> Self {
        Self {
            max_texture_image_units: DEFAULT_MAX_TEXTURE_IMAGE_UNITS,
            state: Mutex::new(DummyState {
                has_context: true,
                ..Default::default()
            }),
        }
    }

    /// Report `units` texture image units.
    pub fn with_max_texture_image_units(mut self, units: u32) -> Self {
        self.max_texture_image_units = units;
        self
    }

    /// Start without a current context, as before surface creation.
    pub fn without_context(self) -> Self {
        self.state.lock().has_context = false;
        self
    }

    /// Make the next `link_program` call fail with `diagnostic`.
    pub fn fail_next_link(&self, diagnostic: impl Into<String>) {
        self.state.lock().fail_next_link = Some(diagnostic.into());
    }

    /// Drop every GPU object, as a context loss would.
    pub fn lose_context(&self) {
        let mut state = self.state.lock();
        log::trace!("DummyBackend: context lost");
        state.has_context = false;
        state.shaders.clear();
        state.programs.clear();
        state.location_names.clear();
        state.current_program = None;
        state.bound.clear();
    }

    /// Provide a fresh context.
    pub fn restore_context(&self) {
        log::trace!("DummyBackend: context restored");
        self.state.lock().has_context = true;
    }

    /// Number of `compile_shader` calls so far.
    pub fn compile_count(&self) -> usize {
        self.state.lock().compile_calls
    }

    /// Number of `link_program` calls so far.
    pub fn link_count(&self) -> usize {
        self.state.lock().link_calls
    }

    /// Number of shader objects alive.
    pub fn live_shaders(&self) -> usize {
        self.state.lock().shaders.len()
    }

    /// Number of program objects alive.
    pub fn live_programs(&self) -> usize {
        self.state.lock().programs.len()
    }

    /// Number of shader deletions so far.
    pub fn deleted_shader_count(&self) -> usize {
        self.state.lock().deleted_shaders
    }

    /// Number of program deletions so far.
    pub fn deleted_program_count(&self) -> usize {
        self.state.lock().deleted_programs
    }

    /// The program passed to the last `use_program` call.
    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.state.lock().current_program
    }

    /// Source of a live shader object.
    pub fn shader_source(&self, shader: ShaderHandle) -> Option<String> {
        self.state
            .lock()
            .shaders
            .get(&shader)
            .map(|(_, source)| source.clone())
    }

    /// Textures currently bound, as `(unit, target, texture)` sorted by unit.
    pub fn bound_textures(&self) -> Vec<(u32, TextureTarget, TextureId)> {
        self.state
            .lock()
            .bound
            .iter()
            .map(|(unit, (target, id))| (*unit, *target, *id))
            .collect()
    }

    /// Number of `bind_texture` calls with a texture (not unbinds).
    pub fn texture_bind_count(&self) -> usize {
        self.state.lock().bind_calls
    }

    /// Number of `uniform_location` queries so far.
    pub fn uniform_lookup_count(&self) -> usize {
        self.state.lock().uniform_lookups
    }

    /// The last value written to the uniform called `name`.
    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.state
            .lock()
            .uniform_writes
            .iter()
            .rev()
            .find(|(written, _)| written == name)
            .map(|(_, value)| *value)
    }

    /// Number of writes to the uniform called `name`.
    pub fn uniform_write_count(&self, name: &str) -> usize {
        self.state
            .lock()
            .uniform_writes
            .iter()
            .filter(|(written, _)| written == name)
            .count()
    }

    /// Number of `unbind_array_buffer` calls so far.
    pub fn array_buffer_unbind_count(&self) -> usize {
        self.state.lock().array_buffer_unbinds
    }
}

/// Reject what a real GLSL compiler would reject first.
fn validate_source(source: &str) -> Result<(), String> {
    if source.trim().is_empty() {
        return Err("ERROR: 0:0: '' : empty shader source".to_string());
    }
    for (index, line) in source.lines().enumerate() {
        if let Some(message) = line.trim_start().strip_prefix("#error") {
            return Err(format!("ERROR: 0:{}: '#error' : {}", index + 1, message.trim()));
        }
    }
    let mut depth: i64 = 0;
    for c in source.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Err("ERROR: 0:0: '}' : syntax error".to_string());
        }
    }
    if depth != 0 {
        return Err("ERROR: 0:0: '' : unexpected end of file".to_string());
    }
    Ok(())
}

/// Names of the `uniform` declarations in a source, array suffixes stripped.
fn declared_uniforms(source: &str) -> impl Iterator<Item = &str> {
    source.lines().filter_map(|line| {
        let declaration = line.trim().strip_prefix("uniform ")?;
        let name = declaration.split_whitespace().last()?.trim_end_matches(';');
        let name = name.split('[').next().unwrap_or(name);
        (!name.is_empty()).then_some(name)
    })
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn has_context(&self) -> bool {
        self.state.lock().has_context
    }

    fn max_texture_image_units(&self) -> u32 {
        self.max_texture_image_units
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String> {
        let mut state = self.state.lock();
        state.compile_calls += 1;
        let handle = ShaderHandle(state.allocate_object());
        log::trace!("DummyBackend: compiling {stage:?} shader {:?}", handle.0);
        if let Err(diagnostic) = validate_source(source) {
            // the partial object is created and deleted, as a driver would
            state.deleted_shaders += 1;
            return Err(diagnostic);
        }
        state.shaders.insert(handle, (stage, source.to_string()));
        Ok(handle)
    }

    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String> {
        let mut state = self.state.lock();
        state.link_calls += 1;
        let handle = ProgramHandle(state.allocate_object());
        log::trace!("DummyBackend: linking program {:?}", handle.0);

        if let Some(diagnostic) = state.fail_next_link.take() {
            state.deleted_programs += 1;
            return Err(diagnostic);
        }
        let names: Option<Vec<String>> = match (state.shaders.get(&vertex), state.shaders.get(&fragment)) {
            (Some((ShaderStage::Vertex, vs)), Some((ShaderStage::Fragment, fs))) => Some(
                declared_uniforms(vs)
                    .chain(declared_uniforms(fs))
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        };
        let Some(names) = names else {
            state.deleted_programs += 1;
            return Err("ERROR: link requires a compiled vertex and fragment shader".to_string());
        };

        let mut uniforms = HashMap::new();
        for name in names {
            if uniforms.contains_key(&name) {
                continue;
            }
            let location = UniformLocation(state.next_location);
            state.next_location += 1;
            state.location_names.insert(location, name.clone());
            uniforms.insert(name, location);
        }
        state.programs.insert(handle, DummyProgram { uniforms });
        Ok(handle)
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.lock();
        log::trace!("DummyBackend: deleting shader {:?}", shader.0);
        if state.shaders.remove(&shader).is_some() {
            state.deleted_shaders += 1;
        }
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.lock();
        log::trace!("DummyBackend: deleting program {:?}", program.0);
        if let Some(removed) = state.programs.remove(&program) {
            state.deleted_programs += 1;
            for location in removed.uniforms.values() {
                state.location_names.remove(location);
            }
        }
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        log::trace!("DummyBackend: use program {program:?}");
        self.state.lock().current_program = program;
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.lock();
        state.uniform_lookups += 1;
        state
            .programs
            .get(&program)
            .and_then(|p| p.uniforms.get(name).copied())
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let mut state = self.state.lock();
        let Some(name) = state.location_names.get(&location).cloned() else {
            log::trace!("DummyBackend: write to unknown uniform location {location:?}");
            return;
        };
        state.uniform_writes.push((name, *value));
    }

    fn active_texture(&self, unit: u32) {
        self.state.lock().active_unit = unit;
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureId>) {
        let mut state = self.state.lock();
        let unit = state.active_unit;
        match texture {
            Some(id) => {
                state.bind_calls += 1;
                state.bound.insert(unit, (target, id));
            }
            None => {
                if state.bound.get(&unit).is_some_and(|(bound, _)| *bound == target) {
                    state.bound.remove(&unit);
                }
            }
        }
    }

    fn unbind_array_buffer(&self) {
        self.state.lock().array_buffer_unbinds += 1;
    }
}
