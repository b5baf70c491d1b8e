//! Use-case layer over item persistence.
//!
//! # Responsibility
//! - Own the in-memory item list for a session and keep storage in step
//!   with it.
//! - Keep UI/FFI callers away from JSON and SQL details.

pub mod item_store;
