//! Lifecycle coordinator driven by host events.
//!
//! # Responsibility
//! - Own the mod registry and run scope loads/saves for each host event.
//! - Keep the required-mods record for new games.
//! - Serve on-demand loads requested by mods after startup.
//!
//! # Invariants
//! - Within one event, mods are processed in registration order and scope
//!   operations for one mod run in a fixed order (Save before OnceSave).
//! - A failing mod never stops the pass; failures are counted and logged.
//! - The unloaded slot never reaches a directory operation.
//! - Global data is only loaded while platform storage is ready.
//!
//! # See also
//! - `crate::service::compatibility` for save-slot validation.

use crate::config::{ConfigError, ManagerConfig};
use crate::extension::contract::{DataMod, DataSlot, ModScopes};
use crate::extension::managed::{LoadOutcome, SaveOutcome};
use crate::extension::registry::{DiscoveredMod, ModRegistry, RegistryError};
use crate::model::scope::DataScope;
use crate::model::slot::{SaveSlot, SlotIndex};
use crate::paths::DataPaths;
use crate::storage::{self, clear_dir, ensure_dir, open_fragment, ClearOutcome, FragmentError};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Host lifecycle events the coordinator reacts to.
#[derive(Debug, Clone)]
pub enum HostEvent {
    Startup(Vec<DiscoveredMod>),
    Quit,
    LoadGameData(SaveSlot),
    SaveGame { slot: SaveSlot, succeeded: bool },
    StartNewGame(SaveSlot),
    ClearSaveFile(SaveSlot),
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Startup(_) => "startup",
            Self::Quit => "quit",
            Self::LoadGameData(_) => "load_game_data",
            Self::SaveGame { .. } => "save_game",
            Self::StartNewGame(_) => "start_new_game",
            Self::ClearSaveFile(_) => "clear_save_file",
        }
    }
}

/// Per-event tally of scope operations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventSummary {
    pub event: &'static str,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Ids of mods with at least one failed operation, first failure first.
    pub failed_mods: Vec<String>,
}

impl EventSummary {
    fn new(event: &'static str) -> Self {
        Self {
            event,
            ..Self::default()
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    fn record_load(&mut self, mod_id: &str, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded | LoadOutcome::Absent => self.succeeded += 1,
            LoadOutcome::Failed => self.record_failure(mod_id),
            LoadOutcome::Unsupported | LoadOutcome::AlreadyLoaded => self.skipped += 1,
        }
    }

    fn record_save(&mut self, mod_id: &str, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Saved => self.succeeded += 1,
            SaveOutcome::Failed => self.record_failure(mod_id),
            SaveOutcome::NoData | SaveOutcome::Unsupported => self.skipped += 1,
        }
    }

    fn record_failure(&mut self, mod_id: &str) {
        self.failed += 1;
        if !self.failed_mods.iter().any(|id| id == mod_id) {
            self.failed_mods.push(mod_id.to_string());
        }
    }
}

/// Coordinator-owned OnceSave payload listing mods a save depends on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequiredModsRecord {
    #[serde(default)]
    pub required_mods: Vec<String>,
}

/// Reads the required-mods record stored for `slot`.
///
/// Returns `Ok(None)` when the slot has no record.
pub fn read_required_mods(
    paths: &DataPaths,
    manager_id: &str,
    slot: SlotIndex,
) -> Result<Option<RequiredModsRecord>, FragmentError> {
    let Some(path) = paths.fragment_path(DataScope::OnceSave, manager_id, Some(slot)) else {
        return Ok(None);
    };
    let file = open_fragment(&path)?;
    storage::decode(file).map_err(|err| FragmentError::codec(&path, err))
}

/// Coordinator errors surfaced to callers.
#[derive(Debug)]
pub enum ManagerError {
    /// An on-demand load was requested before startup completed.
    NotInitialized,
    Config(ConfigError),
    Registry(RegistryError),
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "data manager has not completed startup"),
            Self::Config(err) => write!(f, "invalid manager config: {err}"),
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ManagerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotInitialized => None,
            Self::Config(err) => Some(err),
            Self::Registry(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ManagerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RegistryError> for ManagerError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

/// Explicitly constructed lifecycle coordinator.
#[derive(Debug)]
pub struct DataManager {
    manager_id: String,
    paths: DataPaths,
    registry: ModRegistry,
    required_record: Arc<DataSlot<RequiredModsRecord>>,
    storage_ready: bool,
    initialized: bool,
}

impl DataManager {
    /// Builds a coordinator from a validated config.
    ///
    /// # Errors
    /// - `ManagerError::Config` when `config.validate()` fails.
    pub fn new(config: ManagerConfig) -> Result<Self, ManagerError> {
        config.validate()?;
        Ok(Self {
            paths: config.paths(),
            manager_id: config.manager_id,
            registry: ModRegistry::new(),
            required_record: DataSlot::shared(),
            storage_ready: config.storage_ready,
            initialized: false,
        })
    }

    pub fn manager_id(&self) -> &str {
        &self.manager_id
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn registry(&self) -> &ModRegistry {
        &self.registry
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_storage_ready(&self) -> bool {
        self.storage_ready
    }

    /// Required mods recorded in memory for the current save, if any.
    pub fn recorded_required_mods(&self) -> Option<Vec<String>> {
        self.required_record
            .with(|record| record.map(|record| record.required_mods.clone()))
    }

    /// Runs the handler matching `event`.
    pub fn dispatch(&mut self, event: HostEvent) -> EventSummary {
        match event {
            HostEvent::Startup(mods) => self.on_startup(mods),
            HostEvent::Quit => self.on_quit(),
            HostEvent::LoadGameData(slot) => self.on_load_game_data(slot),
            HostEvent::SaveGame { slot, succeeded } => self.on_save_game(slot, succeeded),
            HostEvent::StartNewGame(slot) => self.on_start_new_game(slot),
            HostEvent::ClearSaveFile(slot) => self.on_clear_save_file(slot),
        }
    }

    /// Registers discovered mods and loads their Profile then Global data.
    ///
    /// The coordinator registers its own OnceSave record first. Ids that
    /// fail registration are skipped with a warning.
    pub fn on_startup(&mut self, mods: impl IntoIterator<Item = DiscoveredMod>) -> EventSummary {
        let started_at = Instant::now();
        let mut summary = EventSummary::new("startup");
        self.ensure_profile_and_global_dirs();

        if !self.initialized {
            let own = ModScopes::new().with_once_save(self.required_record.clone());
            if let Err(err) = self.registry.register(&self.manager_id, &own) {
                error!(
                    "event=mod_register module=lifecycle status=error mod_id={} error={}",
                    self.manager_id, err
                );
            }
        }

        for discovered in mods {
            let managed = match self.registry.register(&discovered.id, &*discovered.instance) {
                Ok(managed) => managed,
                Err(err) => {
                    warn!(
                        "event=mod_register module=lifecycle status=skip mod_id={} error={}",
                        discovered.id, err
                    );
                    summary.skipped += 1;
                    continue;
                }
            };
            let outcome = managed.load_profile_data(&self.paths);
            summary.record_load(&discovered.id, outcome);
            if self.storage_ready {
                let outcome = managed.load_global_data(&self.paths);
                summary.record_load(&discovered.id, outcome);
            } else if managed.implements(DataScope::Global) {
                summary.skipped += 1;
            }
        }

        self.initialized = true;
        if !self.storage_ready {
            info!("event=global_load module=lifecycle status=skip reason=storage_not_ready");
        }
        finish(summary, started_at, SaveSlot::Unloaded)
    }

    /// Saves Profile and Global data for every mod.
    pub fn on_quit(&mut self) -> EventSummary {
        let started_at = Instant::now();
        let mut summary = EventSummary::new("quit");
        self.ensure_profile_and_global_dirs();

        for managed in self.registry.iter() {
            summary.record_save(managed.id(), managed.save_profile_data(&self.paths));
            if self.storage_ready {
                summary.record_save(managed.id(), managed.save_global_data(&self.paths));
            } else if managed.implements(DataScope::Global) {
                summary.skipped += 1;
            }
        }

        finish(summary, started_at, SaveSlot::Unloaded)
    }

    /// Loads Save then OnceSave data for `slot`, or resets both for the
    /// unloaded slot.
    pub fn on_load_game_data(&mut self, slot: SaveSlot) -> EventSummary {
        let started_at = Instant::now();
        let mut summary = EventSummary::new("load_game_data");

        match slot.active() {
            None => {
                for managed in self.registry.iter() {
                    managed.reset_slot_data();
                }
            }
            Some(index) => {
                for managed in self.registry.iter() {
                    let outcome = managed.load_save_data(&self.paths, index);
                    summary.record_load(managed.id(), outcome);
                    let outcome = managed.load_once_save_data(&self.paths, index);
                    summary.record_load(managed.id(), outcome);
                }
            }
        }

        finish(summary, started_at, slot)
    }

    /// Saves Save data after the host reports a successful save.
    pub fn on_save_game(&mut self, slot: SaveSlot, succeeded: bool) -> EventSummary {
        let started_at = Instant::now();
        let mut summary = EventSummary::new("save_game");

        let Some(index) = slot.active().filter(|_| succeeded) else {
            info!(
                "event=save_game module=lifecycle status=skip slot={} succeeded={}",
                slot, succeeded
            );
            return summary;
        };

        if let Err(err) = ensure_dir(&self.paths.save_data_dir(index)) {
            log_dir_error("save_game", &err);
        }
        for managed in self.registry.iter() {
            let outcome = managed.save_save_data(&self.paths, index);
            summary.record_save(managed.id(), outcome);
        }

        finish(summary, started_at, slot)
    }

    /// Clears stale slot state, then writes OnceSave data for a new game.
    pub fn on_start_new_game(&mut self, slot: SaveSlot) -> EventSummary {
        let started_at = Instant::now();
        let mut summary = EventSummary::new("start_new_game");

        let Some(index) = slot.active() else {
            info!("event=start_new_game module=lifecycle status=skip slot=0");
            return summary;
        };

        self.clear_slot_dir("start_new_game", &self.paths.save_slot_dir(index));
        if let Err(err) = ensure_dir(&self.paths.once_save_data_dir(index)) {
            log_dir_error("start_new_game", &err);
        }

        let required_mods = self.registry.required_ids();
        if required_mods.is_empty() {
            self.required_record.clear();
        } else {
            self.required_record.set(RequiredModsRecord { required_mods });
        }

        for managed in self.registry.iter() {
            let outcome = managed.save_once_save_data(&self.paths, index);
            summary.record_save(managed.id(), outcome);
        }

        finish(summary, started_at, slot)
    }

    /// Deletes everything stored for `slot`; a missing directory is fine.
    pub fn on_clear_save_file(&mut self, slot: SaveSlot) -> EventSummary {
        let started_at = Instant::now();
        let mut summary = EventSummary::new("clear_save_file");

        let Some(index) = slot.active() else {
            info!("event=clear_save_file module=lifecycle status=skip slot=0");
            return summary;
        };

        if self.clear_slot_dir("clear_save_file", &self.paths.save_slot_dir(index)) {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }

        finish(summary, started_at, slot)
    }

    /// Updates platform storage readiness.
    ///
    /// Becoming ready after startup runs the Global loads skipped so far.
    pub fn set_storage_ready(&mut self, ready: bool) -> EventSummary {
        let started_at = Instant::now();
        let mut summary = EventSummary::new("storage_ready");
        self.storage_ready = ready;
        if ready && self.initialized {
            self.load_pending_global(&mut summary);
        }
        finish(summary, started_at, SaveSlot::Unloaded)
    }

    /// Loads Profile (and, when storage is ready, Global) data for one mod
    /// on demand, registering it first if needed.
    ///
    /// # Errors
    /// - `ManagerError::NotInitialized` before `on_startup` ran.
    /// - `ManagerError::Registry` when the instance cannot be registered.
    pub fn ensure_data_loaded(
        &mut self,
        mod_id: &str,
        instance: &dyn DataMod,
    ) -> Result<(), ManagerError> {
        if !self.initialized {
            error!(
                "event=ensure_loaded module=lifecycle status=error mod_id={} error_code=not_initialized",
                mod_id
            );
            return Err(ManagerError::NotInitialized);
        }

        if !self.registry.contains(mod_id) {
            if let Err(err) = self.registry.register(mod_id, instance) {
                warn!(
                    "event=ensure_loaded module=lifecycle status=error mod_id={} error={}",
                    mod_id, err
                );
                return Err(err.into());
            }
        }

        let Some(managed) = self.registry.get_mut(mod_id) else {
            return Err(ManagerError::Registry(RegistryError::InvalidModId(
                mod_id.to_string(),
            )));
        };
        let profile = managed.load_profile_data(&self.paths);
        let global = if self.storage_ready {
            managed.load_global_data(&self.paths)
        } else {
            LoadOutcome::Unsupported
        };
        info!(
            "event=ensure_loaded module=lifecycle status=ok mod_id={} profile={:?} global={:?} storage_ready={}",
            mod_id, profile, global, self.storage_ready
        );
        Ok(())
    }

    fn load_pending_global(&mut self, summary: &mut EventSummary) {
        for managed in self.registry.iter_mut() {
            if !managed.implements(DataScope::Global) || managed.has_loaded_global_data() {
                continue;
            }
            let outcome = managed.load_global_data(&self.paths);
            summary.record_load(managed.id(), outcome);
        }
    }

    fn ensure_profile_and_global_dirs(&self) {
        for dir in [
            self.paths.profile_data_dir().to_path_buf(),
            self.paths.global_data_dir(),
        ] {
            if let Err(err) = ensure_dir(&dir) {
                log_dir_error("ensure_dirs", &err);
            }
        }
    }

    fn clear_slot_dir(&self, event: &str, dir: &Path) -> bool {
        match clear_dir(dir) {
            Ok(ClearOutcome::Removed) => {
                info!(
                    "event={} module=lifecycle status=ok action=clear_slot dir={}",
                    event,
                    dir.display()
                );
                true
            }
            Ok(ClearOutcome::Missing) => {
                info!(
                    "event={} module=lifecycle status=ok action=clear_slot dir={} detail=not_found",
                    event,
                    dir.display()
                );
                true
            }
            Err(err) => {
                error!(
                    "event={} module=lifecycle status=error action=clear_slot error_code=clear_failed error={}",
                    event, err
                );
                false
            }
        }
    }
}

fn log_dir_error(event: &str, err: &FragmentError) {
    error!(
        "event={} module=lifecycle status=error error_code=dir_create_failed error={}",
        event, err
    );
}

fn finish(summary: EventSummary, started_at: Instant, slot: SaveSlot) -> EventSummary {
    let status = if summary.has_failures() { "error" } else { "ok" };
    info!(
        "event={} module=lifecycle status={} slot={} succeeded={} failed={} skipped={} duration_ms={}",
        summary.event,
        status,
        slot,
        summary.succeeded,
        summary.failed,
        summary.skipped,
        started_at.elapsed().as_millis()
    );
    if summary.has_failures() {
        warn!(
            "event={} module=lifecycle status=error failed_mods={}",
            summary.event,
            summary.failed_mods.join(",")
        );
    }
    summary
}
