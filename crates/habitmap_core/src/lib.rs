//! Core of the HabitMap habit/task tracker.
//! Owns the item model, the local key-value persistence and the day filter.

pub mod db;
pub mod filter;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::item::{Item, ItemId, ItemValidationError};
pub use model::variant::ListVariant;
pub use repo::item_repo::{
    DiscardReason, ItemPersistence, LoadReport, LoadStatus, PersistenceError,
};
pub use repo::kv_repo::{KeyValueStore, RepoError, RepoResult, SqliteKeyValueStore};
pub use service::item_store::{ItemStore, StoreChange, StoreError, StoreEvent};

/// Minimal health-check API for FFI wiring.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
