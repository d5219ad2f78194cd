//! Mod registration and per-scope persistence contracts.
//!
//! This module defines what a mod exposes (`contract`), the record the
//! registry keeps for it (`managed`) and the registry itself (`registry`).
//! Host-side discovery is out of scope; it only feeds `DiscoveredMod` values.

pub mod contract;
pub mod managed;
pub mod registry;
