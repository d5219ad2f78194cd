//! Host-facing services.
//!
//! # Responsibility
//! - `lifecycle`: react to host events and on-demand load requests.
//! - `compatibility`: decide whether a save slot can be loaded.

pub mod compatibility;
pub mod lifecycle;
