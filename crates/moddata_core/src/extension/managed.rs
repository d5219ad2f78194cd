//! Managed mod record: one per registered mod.
//!
//! # Responsibility
//! - Hold the scope handles a mod exposed at discovery time.
//! - Load and save each scope through path layout + fragment storage.
//! - Apply the error policy: absence and failures both end in "no data".
//!
//! # Invariants
//! - No operation panics or propagates an error; every outcome is returned
//!   as a value and failures are logged with the mod id.
//! - A load never leaves in-memory state half-applied: failures reset to
//!   "no data".
//! - A save with nothing to persist never touches the existing fragment.
//! - Profile and Global data are loaded at most once per session.

use super::contract::{DataMod, ScopeData};
use super::registry::RegistryError;
use crate::model::scope::DataScope;
use crate::model::slot::SlotIndex;
use crate::paths::DataPaths;
use crate::storage::{open_fragment, write_fragment};
use log::{debug, error, info};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Result of one scope load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A fragment was read and applied.
    Loaded,
    /// No fragment on disk; state reset to "no data".
    Absent,
    /// Reading or decoding failed; state reset to "no data".
    Failed,
    /// The mod does not implement this scope.
    Unsupported,
    /// Profile/Global data was loaded earlier in this session.
    AlreadyLoaded,
}

/// Result of one scope save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// `has_data()` was false; nothing written.
    NoData,
    /// Writing failed; the previous fragment is untouched.
    Failed,
    /// The mod does not implement this scope.
    Unsupported,
}

/// Registry record for one mod.
pub struct ManagedMod {
    id: String,
    profile: Option<Arc<dyn ScopeData>>,
    global: Option<Arc<dyn ScopeData>>,
    save: Option<Arc<dyn ScopeData>>,
    once_save: Option<Arc<dyn ScopeData>>,
    required: bool,
    loaded_profile: bool,
    loaded_global: bool,
}

impl ManagedMod {
    /// Builds a record from a discovered instance.
    ///
    /// # Errors
    /// - `InvalidModId` when `id` cannot be used as a fragment file name.
    /// - `NoCapabilities` when the instance implements no scope and no
    ///   required marker.
    pub fn try_create(id: &str, instance: &dyn DataMod) -> Result<Self, RegistryError> {
        if !is_valid_mod_id(id) {
            return Err(RegistryError::InvalidModId(id.to_string()));
        }

        let profile = instance.profile_data();
        let global = instance.global_data();
        let save = instance.save_data();
        let once_save = instance.once_save_data();
        let required_marker = instance.required();

        if profile.is_none()
            && global.is_none()
            && save.is_none()
            && once_save.is_none()
            && required_marker.is_none()
        {
            return Err(RegistryError::NoCapabilities(id.to_string()));
        }

        let managed = Self {
            id: id.to_string(),
            profile,
            global,
            save,
            once_save,
            required: required_marker == Some(true),
            loaded_profile: false,
            loaded_global: false,
        };

        info!(
            "event=mod_register module=registry status=ok mod_id={} scopes={} required={}",
            managed.id,
            managed.scope_list(),
            managed.required
        );
        Ok(managed)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `true` only when the mod explicitly declared itself required.
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn implements(&self, scope: DataScope) -> bool {
        self.handle(scope).is_some()
    }

    /// Implemented scopes in lifecycle order.
    pub fn scopes(&self) -> Vec<DataScope> {
        DataScope::all()
            .iter()
            .copied()
            .filter(|scope| self.implements(*scope))
            .collect()
    }

    pub fn has_loaded_profile_data(&self) -> bool {
        self.loaded_profile
    }

    pub fn has_loaded_global_data(&self) -> bool {
        self.loaded_global
    }

    pub fn load_profile_data(&mut self, paths: &DataPaths) -> LoadOutcome {
        if self.loaded_profile {
            return LoadOutcome::AlreadyLoaded;
        }
        let outcome = self.load_scope(paths, DataScope::Profile, None);
        self.loaded_profile = true;
        outcome
    }

    pub fn save_profile_data(&self, paths: &DataPaths) -> SaveOutcome {
        self.save_scope(paths, DataScope::Profile, None)
    }

    pub fn load_global_data(&mut self, paths: &DataPaths) -> LoadOutcome {
        if self.loaded_global {
            return LoadOutcome::AlreadyLoaded;
        }
        let outcome = self.load_scope(paths, DataScope::Global, None);
        self.loaded_global = true;
        outcome
    }

    pub fn save_global_data(&self, paths: &DataPaths) -> SaveOutcome {
        self.save_scope(paths, DataScope::Global, None)
    }

    pub fn load_save_data(&self, paths: &DataPaths, slot: SlotIndex) -> LoadOutcome {
        self.load_scope(paths, DataScope::Save, Some(slot))
    }

    pub fn save_save_data(&self, paths: &DataPaths, slot: SlotIndex) -> SaveOutcome {
        self.save_scope(paths, DataScope::Save, Some(slot))
    }

    pub fn load_once_save_data(&self, paths: &DataPaths, slot: SlotIndex) -> LoadOutcome {
        self.load_scope(paths, DataScope::OnceSave, Some(slot))
    }

    pub fn save_once_save_data(&self, paths: &DataPaths, slot: SlotIndex) -> SaveOutcome {
        self.save_scope(paths, DataScope::OnceSave, Some(slot))
    }

    /// Drops in-memory Save and OnceSave values (title screen).
    pub fn reset_slot_data(&self) {
        for scope in [DataScope::Save, DataScope::OnceSave] {
            if let Some(data) = self.handle(scope) {
                self.reset(scope, &**data);
            }
        }
    }

    fn handle(&self, scope: DataScope) -> Option<&Arc<dyn ScopeData>> {
        match scope {
            DataScope::Profile => self.profile.as_ref(),
            DataScope::Global => self.global.as_ref(),
            DataScope::Save => self.save.as_ref(),
            DataScope::OnceSave => self.once_save.as_ref(),
        }
    }

    fn load_scope(
        &self,
        paths: &DataPaths,
        scope: DataScope,
        slot: Option<SlotIndex>,
    ) -> LoadOutcome {
        let Some(data) = self.handle(scope) else {
            return LoadOutcome::Unsupported;
        };
        let Some(path) = paths.fragment_path(scope, &self.id, slot) else {
            return LoadOutcome::Unsupported;
        };
        let started_at = Instant::now();

        let mut file = match open_fragment(&path) {
            Ok(Some(file)) => file,
            Ok(None) => {
                self.reset(scope, &**data);
                debug!(
                    "event=data_load module=registry status=absent mod_id={} scope={} slot={}",
                    self.id,
                    scope,
                    slot_label(slot)
                );
                return LoadOutcome::Absent;
            }
            Err(err) => {
                self.reset(scope, &**data);
                error!(
                    "event=data_load module=registry status=error mod_id={} scope={} slot={} error_code=open_failed error={}",
                    self.id,
                    scope,
                    slot_label(slot),
                    err
                );
                return LoadOutcome::Failed;
            }
        };

        match data.read_data(Some(&mut file)) {
            Ok(()) => {
                info!(
                    "event=data_load module=registry status=ok mod_id={} scope={} slot={} type={} duration_ms={}",
                    self.id,
                    scope,
                    slot_label(slot),
                    data.data_type(),
                    started_at.elapsed().as_millis()
                );
                LoadOutcome::Loaded
            }
            Err(err) => {
                self.reset(scope, &**data);
                error!(
                    "event=data_load module=registry status=error mod_id={} scope={} slot={} type={} error_code=decode_failed error={}",
                    self.id,
                    scope,
                    slot_label(slot),
                    data.data_type(),
                    err
                );
                LoadOutcome::Failed
            }
        }
    }

    fn save_scope(
        &self,
        paths: &DataPaths,
        scope: DataScope,
        slot: Option<SlotIndex>,
    ) -> SaveOutcome {
        let Some(data) = self.handle(scope) else {
            return SaveOutcome::Unsupported;
        };
        if !data.has_data() {
            return SaveOutcome::NoData;
        }
        let Some(path) = paths.fragment_path(scope, &self.id, slot) else {
            return SaveOutcome::Unsupported;
        };
        let started_at = Instant::now();

        match write_fragment(&path, |out| data.write_data(out)) {
            Ok(()) => {
                info!(
                    "event=data_save module=registry status=ok mod_id={} scope={} slot={} type={} duration_ms={}",
                    self.id,
                    scope,
                    slot_label(slot),
                    data.data_type(),
                    started_at.elapsed().as_millis()
                );
                SaveOutcome::Saved
            }
            Err(err) => {
                error!(
                    "event=data_save module=registry status=error mod_id={} scope={} slot={} type={} error_code=write_failed error={}",
                    self.id,
                    scope,
                    slot_label(slot),
                    data.data_type(),
                    err
                );
                SaveOutcome::Failed
            }
        }
    }

    fn reset(&self, scope: DataScope, data: &dyn ScopeData) {
        if let Err(err) = data.read_data(None) {
            error!(
                "event=data_reset module=registry status=error mod_id={} scope={} error={}",
                self.id, scope, err
            );
        }
    }

    fn scope_list(&self) -> String {
        let scopes = self.scopes();
        if scopes.is_empty() {
            return "none".to_string();
        }
        scopes
            .iter()
            .map(|scope| scope.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Debug for ManagedMod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedMod")
            .field("id", &self.id)
            .field("scopes", &self.scopes())
            .field("required", &self.required)
            .field("loaded_profile", &self.loaded_profile)
            .field("loaded_global", &self.loaded_global)
            .finish()
    }
}

/// Whether `value` can be used verbatim as a fragment file stem.
pub fn is_valid_mod_id(value: &str) -> bool {
    if value.is_empty() || value.trim() != value {
        return false;
    }
    if value == "." || value == ".." {
        return false;
    }
    !value.chars().any(|c| {
        c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
    })
}

fn slot_label(slot: Option<SlotIndex>) -> String {
    slot.map(|slot| slot.to_string())
        .unwrap_or_else(|| "-".to_string())
}
