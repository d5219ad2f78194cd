//! Save-slot compatibility validation.
//!
//! # Responsibility
//! - Find mods a save slot has data for that are not registered anymore.
//! - Override the host's slot presentation while such mods are missing and
//!   restore the host's own text once they are back.
//!
//! # Invariants
//! - Detection reads disk only; in-memory mod data is never touched.
//! - A missing slot directory means "nothing missing".
//! - Scan and record read failures are logged and fail open: the slot falls
//!   back to the host's own validation instead of being blocked.
//! - Each slot keeps at most one displaced host message, restored to that
//!   slot exactly once.

use super::lifecycle::read_required_mods;
use crate::extension::registry::ModRegistry;
use crate::model::slot::{SaveSlot, SlotIndex};
use crate::paths::DataPaths;
use crate::storage::list_fragment_ids;
use log::{error, info};
use std::collections::{BTreeSet, HashMap};

/// Localization key of the "required mods missing" message.
pub const REQUIRED_MODS_MISSING_KEY: &str = "REQUIRED_MODS_MISSING";

/// Localized text reference shown on a save slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMessage {
    pub sheet: String,
    pub key: String,
    pub args: Vec<String>,
}

impl SlotMessage {
    pub fn new(sheet: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            key: key.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

/// Host save-slot widget the validator drives.
pub trait SaveSlotView {
    /// Swaps the "save incompatible" text and returns the one displaced.
    fn replace_incompatible_text(&mut self, message: SlotMessage) -> SlotMessage;

    fn mark_incompatible(&mut self, animate: bool);

    fn set_last_error(&mut self, text: &str);
}

/// Result of one `process_save_stats` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatsOutcome {
    /// Nothing missing; the host runs its own validation.
    Deferred,
    /// Slot marked incompatible; the host's default validation is skipped.
    Blocked { missing: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct CompatibilityValidator {
    manager_id: String,
    displaced: HashMap<SlotIndex, SlotMessage>,
}

impl CompatibilityValidator {
    pub fn new(manager_id: impl Into<String>) -> Self {
        Self {
            manager_id: manager_id.into(),
            displaced: HashMap::new(),
        }
    }

    /// Host text currently replaced by the missing-mods message on `slot`.
    pub fn displaced_text(&self, slot: SaveSlot) -> Option<&SlotMessage> {
        slot.active().and_then(|index| self.displaced.get(&index))
    }

    /// Sorted ids referenced by `slot` on disk but not registered.
    ///
    /// Sources are every synced fragment below the slot directory plus the
    /// slot's required-mods record.
    pub fn missing_mods(
        &self,
        registry: &ModRegistry,
        paths: &DataPaths,
        slot: SaveSlot,
    ) -> Vec<String> {
        let Some(index) = slot.active() else {
            return Vec::new();
        };
        let mut referenced = BTreeSet::new();

        match list_fragment_ids(&paths.save_slot_dir(index)) {
            Ok(ids) => referenced.extend(ids),
            Err(err) => error!(
                "event=missing_mods module=compatibility status=error slot={} error_code=scan_failed error={}",
                index, err
            ),
        }
        match read_required_mods(paths, &self.manager_id, index) {
            Ok(Some(record)) => referenced.extend(record.required_mods),
            Ok(None) => {}
            Err(err) => error!(
                "event=missing_mods module=compatibility status=error slot={} error_code=record_unreadable error={}",
                index, err
            ),
        }

        referenced
            .into_iter()
            .filter(|id| id != &self.manager_id && !registry.contains(id))
            .collect()
    }

    /// Validates `slot` before the host presents it.
    pub fn process_save_stats(
        &mut self,
        registry: &ModRegistry,
        paths: &DataPaths,
        view: &mut dyn SaveSlotView,
        slot: SaveSlot,
        animate: bool,
        error_text: &str,
    ) -> SaveStatsOutcome {
        let missing = self.missing_mods(registry, paths, slot);

        let Some(index) = slot.active().filter(|_| !missing.is_empty()) else {
            let restored = slot.active().and_then(|index| self.displaced.remove(&index));
            if let Some(original) = restored {
                view.replace_incompatible_text(original);
                info!(
                    "event=save_stats module=compatibility status=ok slot={} action=restore_text",
                    slot
                );
            }
            return SaveStatsOutcome::Deferred;
        };

        info!(
            "event=save_stats module=compatibility status=blocked slot={} missing={}",
            slot,
            missing.join(",")
        );
        let sheet = format!("Mods.{}", self.manager_id);
        let message =
            SlotMessage::new(sheet, REQUIRED_MODS_MISSING_KEY).with_args(missing.clone());
        let previous = view.replace_incompatible_text(message);
        self.displaced.entry(index).or_insert(previous);
        view.set_last_error(error_text);
        view.mark_incompatible(animate);

        SaveStatsOutcome::Blocked { missing }
    }
}
