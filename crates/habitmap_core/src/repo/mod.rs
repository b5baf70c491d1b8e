//! Storage-facing layer.
//!
//! # Responsibility
//! - `kv_repo`: byte blobs under string keys in the local `kv_entries` table.
//! - `item_repo`: whole-list JSON encoding of items on top of a key-value
//!   store.
//!
//! # Invariants
//! - SQL stays inside `kv_repo`; JSON stays inside `item_repo`.

pub mod item_repo;
pub mod kv_repo;
