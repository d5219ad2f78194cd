//! Path layout for mod data fragments.
//!
//! # Responsibility
//! - Map (scope, mod id, save slot) to a deterministic on-disk location.
//!
//! # Invariants
//! - Pure: nothing here creates, reads or removes files.
//! - The unloaded sentinel has no directory (`SlotIndex` cannot be `0`).
//!
//! ```text
//! <modded_root>/
//!   Global/<mod_id>.json.dat
//!   user<slot>/
//!     SaveData/<mod_id>.json.dat
//!     OncePerSave/<mod_id>.json.dat
//! <profile_root>/<mod_id>.json
//! ```

use crate::model::scope::DataScope;
use crate::model::slot::SlotIndex;
use std::path::{Path, PathBuf};

const GLOBAL_SUBDIR: &str = "Global";
const SAVE_SLOT_PREFIX: &str = "user";
const SAVE_DATA_SUBDIR: &str = "SaveData";
const ONCE_SAVE_SUBDIR: &str = "OncePerSave";

/// Root directories every fragment path is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    modded_root: PathBuf,
    profile_root: PathBuf,
}

impl DataPaths {
    /// `modded_root` holds Global and per-slot data; `profile_root` holds
    /// profile-scoped fragments.
    pub fn new(modded_root: impl Into<PathBuf>, profile_root: impl Into<PathBuf>) -> Self {
        Self {
            modded_root: modded_root.into(),
            profile_root: profile_root.into(),
        }
    }

    pub fn profile_data_dir(&self) -> &Path {
        &self.profile_root
    }

    pub fn global_data_dir(&self) -> PathBuf {
        self.modded_root.join(GLOBAL_SUBDIR)
    }

    /// Root of everything stored for one save slot.
    pub fn save_slot_dir(&self, slot: SlotIndex) -> PathBuf {
        self.modded_root
            .join(format!("{SAVE_SLOT_PREFIX}{}", slot.get()))
    }

    pub fn save_data_dir(&self, slot: SlotIndex) -> PathBuf {
        self.save_slot_dir(slot).join(SAVE_DATA_SUBDIR)
    }

    pub fn once_save_data_dir(&self, slot: SlotIndex) -> PathBuf {
        self.save_slot_dir(slot).join(ONCE_SAVE_SUBDIR)
    }

    /// Directory holding fragments of `scope`.
    ///
    /// Returns `None` for slot-bound scopes when no slot is given.
    pub fn scope_dir(&self, scope: DataScope, slot: Option<SlotIndex>) -> Option<PathBuf> {
        match scope {
            DataScope::Profile => Some(self.profile_root.clone()),
            DataScope::Global => Some(self.global_data_dir()),
            DataScope::Save => slot.map(|slot| self.save_data_dir(slot)),
            DataScope::OnceSave => slot.map(|slot| self.once_save_data_dir(slot)),
        }
    }

    /// Full fragment path for one mod in one scope.
    pub fn fragment_path(
        &self,
        scope: DataScope,
        mod_id: &str,
        slot: Option<SlotIndex>,
    ) -> Option<PathBuf> {
        self.scope_dir(scope, slot)
            .map(|dir| dir.join(fragment_file_name(scope, mod_id)))
    }
}

/// `<mod_id><suffix>` where the suffix depends on `scope`.
pub fn fragment_file_name(scope: DataScope, mod_id: &str) -> String {
    format!("{mod_id}{}", scope.fragment_suffix())
}
