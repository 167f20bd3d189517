//! Per-renderer material registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::MaterialError;

use super::{Material, MaterialId};

/// Owns the materials attached to one device.
///
/// Each renderer keeps its own registry, so several independent renderers
/// can live in one process.
#[derive(Debug)]
pub struct MaterialRegistry {
    device: Arc<GraphicsDevice>,
    materials: BTreeMap<MaterialId, Material>,
}

impl MaterialRegistry {
    /// An empty registry for `device`.
    pub fn new(device: Arc<GraphicsDevice>) -> Self {
        Self {
            device,
            materials: BTreeMap::new(),
        }
    }

    /// The device materials are attached to.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Attach `material` and take ownership of it.
    ///
    /// On error the material is dropped without being registered.
    pub fn insert(&mut self, mut material: Material) -> Result<MaterialId, MaterialError> {
        material.add(&self.device)?;
        let id = material.id();
        log::debug!("Registered material {}", id.raw());
        self.materials.insert(id, material);
        Ok(id)
    }

    /// Detach a material and hand it back.
    pub fn remove(&mut self, id: MaterialId) -> Option<Material> {
        let mut material = self.materials.remove(&id)?;
        material.remove();
        Some(material)
    }

    /// Rebuild every material after a context loss.
    pub fn reload_all(&mut self) -> Result<(), MaterialError> {
        log::info!("Reloading {} materials", self.materials.len());
        self.device.refresh_capabilities()?;
        for material in self.materials.values_mut() {
            material.reload()?;
        }
        Ok(())
    }

    /// A material by id.
    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    /// A material by id, mutably.
    pub fn get_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(&id)
    }

    /// Number of registered materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether no material is registered.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Materials in id order.
    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials.iter().map(|(id, material)| (*id, material))
    }
}
