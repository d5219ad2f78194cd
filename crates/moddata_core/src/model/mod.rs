//! Shared value types for mod data persistence.
//!
//! # Responsibility
//! - Define the scope and save-slot vocabulary used by every other module.
//!
//! # Invariants
//! - Slot index `0` is never treated as a persisted slot.

pub mod scope;
pub mod slot;
