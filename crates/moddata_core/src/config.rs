//! Data manager configuration.
//!
//! # Responsibility
//! - Describe where fragments live and how the manager identifies itself.
//! - Load that description from a JSON file and validate it.
//!
//! # Invariants
//! - Validated configs only carry absolute, non-empty roots.
//! - `manager_id` is always usable as a fragment file stem.

use crate::extension::managed::is_valid_mod_id;
use crate::paths::DataPaths;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Mod id the manager registers its own data under.
pub const DEFAULT_MANAGER_ID: &str = "org.moddata.manager";

/// Construction-time settings for `DataManager`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Host's per-platform modded-data root (Global + save slots).
    pub modded_root: PathBuf,
    /// Installation-profile config root (Profile fragments).
    pub profile_root: PathBuf,
    #[serde(default = "default_manager_id")]
    pub manager_id: String,
    /// Whether platform storage is usable at startup; gates Global loads.
    #[serde(default = "default_storage_ready")]
    pub storage_ready: bool,
}

fn default_manager_id() -> String {
    DEFAULT_MANAGER_ID.to_string()
}

fn default_storage_ready() -> bool {
    true
}

impl ManagerConfig {
    pub fn new(modded_root: impl Into<PathBuf>, profile_root: impl Into<PathBuf>) -> Self {
        Self {
            modded_root: modded_root.into(),
            profile_root: profile_root.into(),
            manager_id: default_manager_id(),
            storage_ready: default_storage_ready(),
        }
    }

    pub fn with_manager_id(mut self, manager_id: impl Into<String>) -> Self {
        self.manager_id = manager_id.into();
        self
    }

    pub fn with_storage_ready(mut self, storage_ready: bool) -> Self {
        self.storage_ready = storage_ready;
        self
    }

    /// Reads and validates a JSON config file.
    ///
    /// # Errors
    /// - `ConfigError::Io` when the file cannot be read.
    /// - `ConfigError::Parse` when the content is not a valid config.
    /// - Any `validate()` error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks declaration-level invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_root("modded_root", &self.modded_root)?;
        validate_root("profile_root", &self.profile_root)?;
        if !is_valid_mod_id(&self.manager_id) {
            return Err(ConfigError::InvalidManagerId(self.manager_id.clone()));
        }
        Ok(())
    }

    pub fn paths(&self) -> DataPaths {
        DataPaths::new(&self.modded_root, &self.profile_root)
    }
}

fn validate_root(field: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::EmptyRoot(field));
    }
    if !path.is_absolute() {
        return Err(ConfigError::RelativeRoot {
            field,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Configuration loading and validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    EmptyRoot(&'static str),
    RelativeRoot {
        field: &'static str,
        path: PathBuf,
    },
    InvalidManagerId(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::EmptyRoot(field) => write!(f, "{field} cannot be empty"),
            Self::RelativeRoot { field, path } => write!(
                f,
                "{field} must be an absolute path, got `{}`",
                path.display()
            ),
            Self::InvalidManagerId(value) => write!(f, "manager_id is invalid: {value:?}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::EmptyRoot(_) | Self::RelativeRoot { .. } | Self::InvalidManagerId(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ManagerConfig, DEFAULT_MANAGER_ID};
    use std::fs;

    #[test]
    fn load_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let modded = dir.path().join("Modded");
        let profile = dir.path().join("profile");
        let config_path = dir.path().join("moddata.json");
        fs::write(
            &config_path,
            format!(
                "{{\"modded_root\": {:?}, \"profile_root\": {:?}}}",
                modded.to_str().unwrap(),
                profile.to_str().unwrap()
            ),
        )
        .unwrap();

        let config = ManagerConfig::load(&config_path).expect("config load");
        assert_eq!(config.manager_id, DEFAULT_MANAGER_ID);
        assert!(config.storage_ready);
        assert_eq!(config.paths().global_data_dir(), modded.join("Global"));
    }

    #[test]
    fn rejects_relative_roots() {
        let err = ManagerConfig::new("saves/Modded", "/abs/profile")
            .validate()
            .expect_err("relative root must fail");
        assert!(matches!(
            err,
            ConfigError::RelativeRoot {
                field: "modded_root",
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_roots_and_bad_manager_ids() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManagerConfig::new("", dir.path())
            .validate()
            .expect_err("empty root must fail");
        assert!(matches!(err, ConfigError::EmptyRoot("modded_root")));

        let err = ManagerConfig::new(dir.path(), dir.path())
            .with_manager_id("bad/id")
            .validate()
            .expect_err("manager id with separator must fail");
        assert!(matches!(err, ConfigError::InvalidManagerId(_)));
    }

    #[test]
    fn missing_and_malformed_files_are_distinguished() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ManagerConfig::load(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{\"modded_root\": 5}").unwrap();
        let parse = ManagerConfig::load(&broken).unwrap_err();
        assert!(matches!(parse, ConfigError::Parse { .. }));
    }
}
