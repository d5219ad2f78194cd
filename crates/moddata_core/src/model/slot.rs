//! Save slot identity.
//!
//! # Responsibility
//! - Separate the "no save loaded" sentinel from real slot indices.
//!
//! # Invariants
//! - `SlotIndex` is never `0`; only `SaveSlot::Unloaded` represents index `0`.
//! - Directory-producing APIs accept `SlotIndex` only, so the sentinel cannot
//!   reach the filesystem.

use std::fmt::{Display, Formatter};
use std::num::NonZeroU32;

/// Index of a persisted save slot (always `>= 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotIndex(NonZeroU32);

impl SlotIndex {
    /// Returns `None` for the reserved index `0`.
    pub fn new(index: u32) -> Option<Self> {
        NonZeroU32::new(index).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Display for SlotIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Slot carried by host lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveSlot {
    /// Title screen / nothing loaded (host index `0`).
    Unloaded,
    /// A real save slot.
    Active(SlotIndex),
}

impl SaveSlot {
    /// Maps the host's raw slot index, treating `0` as unloaded.
    pub fn from_index(index: u32) -> Self {
        match SlotIndex::new(index) {
            Some(slot) => Self::Active(slot),
            None => Self::Unloaded,
        }
    }

    /// Raw host index (`0` for unloaded).
    pub fn index(self) -> u32 {
        match self {
            Self::Unloaded => 0,
            Self::Active(slot) => slot.get(),
        }
    }

    pub fn active(self) -> Option<SlotIndex> {
        match self {
            Self::Unloaded => None,
            Self::Active(slot) => Some(slot),
        }
    }
}

impl From<SlotIndex> for SaveSlot {
    fn from(value: SlotIndex) -> Self {
        Self::Active(value)
    }
}

impl Display for SaveSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.index())
    }
}
