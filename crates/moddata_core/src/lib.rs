//! Per-mod data persistence for a modded game host.
//!
//! Mods declare data in up to four scopes (profile, global, save, once per
//! save). The `DataManager` loads and saves that data on host lifecycle
//! events, and the `CompatibilityValidator` blocks saves that reference mods
//! which are no longer installed.

pub mod config;
pub mod extension;
pub mod logging;
pub mod model;
pub mod paths;
pub mod service;
pub mod storage;

pub use config::{ConfigError, ManagerConfig, DEFAULT_MANAGER_ID};
pub use extension::contract::{DataMod, DataSlot, ModScopes, ScopeData};
pub use extension::managed::{LoadOutcome, ManagedMod, SaveOutcome};
pub use extension::registry::{DiscoveredMod, ModRegistry, RegistryError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::scope::DataScope;
pub use model::slot::{SaveSlot, SlotIndex};
pub use paths::DataPaths;
pub use service::compatibility::{
    CompatibilityValidator, SaveSlotView, SaveStatsOutcome, SlotMessage,
};
pub use service::lifecycle::{
    DataManager, EventSummary, HostEvent, ManagerError, RequiredModsRecord,
};
pub use storage::{CodecError, FragmentError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
