//! Persistence scope declarations.
//!
//! # Responsibility
//! - Name the four lifetimes mod data can be stored under.
//! - Own the fragment file suffix for each scope.
//!
//! # Invariants
//! - Scope string ids are stable; they appear in logs.
//! - Only `Profile` fragments use the plain `.json` suffix.

use std::fmt::{Display, Formatter};

/// Scope string for profile-wide data.
pub const SCOPE_PROFILE: &str = "profile";
/// Scope string for data shared across all profiles.
pub const SCOPE_GLOBAL: &str = "global";
/// Scope string for per-save-slot data.
pub const SCOPE_SAVE: &str = "save";
/// Scope string for write-once per-save-slot data.
pub const SCOPE_ONCE_SAVE: &str = "once_save";

/// Suffix for fragments that users may edit by hand.
pub const EDITABLE_FRAGMENT_SUFFIX: &str = ".json";
/// Suffix for fragments that are not meant for external editing.
pub const SYNCED_FRAGMENT_SUFFIX: &str = ".json.dat";

const ALL_SCOPES: &[DataScope] = &[
    DataScope::Profile,
    DataScope::Global,
    DataScope::Save,
    DataScope::OnceSave,
];

/// Lifetime a fragment of mod data is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataScope {
    /// One value per mod for the current installation profile.
    Profile,
    /// One value per mod shared by every installation profile.
    Global,
    /// One value per mod per save slot, rewritten on every save.
    Save,
    /// One value per mod per save slot, written when a new game starts.
    OnceSave,
}

impl DataScope {
    /// Returns every scope in lifecycle order.
    pub fn all() -> &'static [DataScope] {
        ALL_SCOPES
    }

    /// Stable string id used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => SCOPE_PROFILE,
            Self::Global => SCOPE_GLOBAL,
            Self::Save => SCOPE_SAVE,
            Self::OnceSave => SCOPE_ONCE_SAVE,
        }
    }

    /// File name suffix appended to the mod id for this scope.
    pub fn fragment_suffix(self) -> &'static str {
        match self {
            Self::Profile => EDITABLE_FRAGMENT_SUFFIX,
            Self::Global | Self::Save | Self::OnceSave => SYNCED_FRAGMENT_SUFFIX,
        }
    }
}

impl Display for DataScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
