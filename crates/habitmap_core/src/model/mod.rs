//! Domain model for tracked habits and tasks.
//!
//! # Responsibility
//! - Define the `Item` record shared by both list variants.
//! - Define `ListVariant`, the switch between the dated task list and the
//!   undated habit list.
//!
//! # Invariants
//! - Every item is identified by a non-nil `ItemId` that never changes.

pub mod item;
pub mod variant;
