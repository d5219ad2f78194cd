//! Mod registry contracts.

use super::contract::DataMod;
use super::managed::ManagedMod;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// One `(identifier, instance)` pair yielded by host mod discovery.
#[derive(Clone)]
pub struct DiscoveredMod {
    pub id: String,
    pub instance: Arc<dyn DataMod>,
}

impl DiscoveredMod {
    pub fn new(id: impl Into<String>, instance: Arc<dyn DataMod>) -> Self {
        Self {
            id: id.into(),
            instance,
        }
    }
}

impl Debug for DiscoveredMod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveredMod")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// In-process registry of managed mods.
///
/// Iteration order is registration order, which is discovery order.
#[derive(Debug, Default)]
pub struct ModRegistry {
    mods: Vec<ManagedMod>,
    index: HashMap<String, usize>,
}

impl ModRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one discovered instance.
    ///
    /// # Errors
    /// - `InvalidModId` / `NoCapabilities` from record creation.
    /// - `DuplicateModId` when the id is already registered.
    pub fn register(
        &mut self,
        id: &str,
        instance: &dyn DataMod,
    ) -> Result<&mut ManagedMod, RegistryError> {
        if self.index.contains_key(id) {
            return Err(RegistryError::DuplicateModId(id.to_string()));
        }
        let managed = ManagedMod::try_create(id, instance)?;
        let position = self.mods.len();
        self.index.insert(managed.id().to_string(), position);
        self.mods.push(managed);
        Ok(&mut self.mods[position])
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn contains(&self, mod_id: &str) -> bool {
        self.index.contains_key(mod_id)
    }

    pub fn get(&self, mod_id: &str) -> Option<&ManagedMod> {
        self.index.get(mod_id).map(|position| &self.mods[*position])
    }

    pub fn get_mut(&mut self, mod_id: &str) -> Option<&mut ManagedMod> {
        let position = *self.index.get(mod_id)?;
        self.mods.get_mut(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManagedMod> {
        self.mods.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ManagedMod> {
        self.mods.iter_mut()
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.mods.iter().map(ManagedMod::id).collect()
    }

    /// Ids of mods that declared themselves required, sorted.
    pub fn required_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .mods
            .iter()
            .filter(|managed| managed.is_required())
            .map(|managed| managed.id().to_string())
            .collect();
        ids.sort();
        ids
    }
}

/// Mod registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidModId(String),
    DuplicateModId(String),
    NoCapabilities(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidModId(value) => write!(f, "mod id is invalid: {value:?}"),
            Self::DuplicateModId(value) => write!(f, "mod id already registered: {value}"),
            Self::NoCapabilities(value) => {
                write!(f, "mod implements no data scope or required marker: {value}")
            }
        }
    }
}

impl Error for RegistryError {}
