//! Whole-list persistence of items in the key-value table.
//!
//! # Responsibility
//! - Encode the full ordered item list as one JSON array per list variant.
//! - Decode it back on startup, downgrading unreadable state to an empty list.
//!
//! # Invariants
//! - `save` always writes the complete list; there are no partial updates.
//! - `load` never fails: absent, corrupt or schema-mismatched blobs yield an
//!   empty list, and the reason is logged and reported through `LoadStatus`.
//! - A decoded list never contains nil ids (rejected by `Item`'s decoder)
//!   or duplicate ids.
//! - Dated lists require `creationDate` on every record; undated lists drop it.

use crate::model::item::Item;
use crate::model::variant::ListVariant;
use crate::repo::kv_repo::{KeyValueStore, RepoError};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure to write the item list.
#[derive(Debug)]
pub enum PersistenceError {
    Encode(serde_json::Error),
    Storage(RepoError),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode item list: {err}"),
            Self::Storage(err) => write!(f, "failed to write item list: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<RepoError> for PersistenceError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Why a persisted blob was ignored on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// The key-value table could not be read.
    ReadFailed(String),
    /// The blob is not a JSON array of item records.
    Undecodable(String),
    /// The records decode but break an item-list invariant.
    SchemaMismatch(String),
}

impl Display for DiscardReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailed(details) => write!(f, "read failed: {details}"),
            Self::Undecodable(details) => write!(f, "undecodable: {details}"),
            Self::SchemaMismatch(details) => write!(f, "schema mismatch: {details}"),
        }
    }
}

/// Outcome classification of [`ItemPersistence::load_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing stored under the key yet (cold start).
    Missing,
    Restored { count: usize },
    /// Stored data existed but was unusable; the list starts empty.
    Discarded { reason: DiscardReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub items: Vec<Item>,
    pub status: LoadStatus,
}

/// Persistence adapter binding one list variant to a key-value store.
pub struct ItemPersistence<S: KeyValueStore> {
    kv: S,
    variant: ListVariant,
}

impl<S: KeyValueStore> ItemPersistence<S> {
    pub fn new(kv: S, variant: ListVariant) -> Self {
        Self { kv, variant }
    }

    pub fn variant(&self) -> ListVariant {
        self.variant
    }

    /// Writes the whole ordered list under the variant's key.
    ///
    /// # Errors
    /// - `PersistenceError::Encode` when JSON encoding fails.
    /// - `PersistenceError::Storage` when the key-value write fails.
    pub fn save(&self, items: &[Item]) -> Result<(), PersistenceError> {
        let key = self.variant.storage_key();
        let encoded = match serde_json::to_vec(items) {
            Ok(encoded) => encoded,
            Err(err) => {
                error!(
                    "event=items_save module=persistence status=error key={key} count={} error_code=encode_failed",
                    items.len()
                );
                return Err(PersistenceError::Encode(err));
            }
        };

        if let Err(err) = self.kv.put(key, &encoded) {
            error!(
                "event=items_save module=persistence status=error key={key} count={} error={err}",
                items.len()
            );
            return Err(err.into());
        }

        debug!(
            "event=items_save module=persistence status=ok key={key} count={} bytes={}",
            items.len(),
            encoded.len()
        );
        Ok(())
    }

    /// Reads the persisted list, or an empty list when none is usable.
    pub fn load(&self) -> Vec<Item> {
        self.load_report().items
    }

    /// Reads the persisted list and reports how it was obtained.
    pub fn load_report(&self) -> LoadReport {
        let key = self.variant.storage_key();

        let blob = match self.kv.get(key) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                info!("event=items_load module=persistence status=missing key={key}");
                return LoadReport {
                    items: Vec::new(),
                    status: LoadStatus::Missing,
                };
            }
            Err(err) => {
                error!("event=items_load module=persistence status=error key={key} error={err}");
                return discarded(DiscardReason::ReadFailed(err.to_string()));
            }
        };

        match decode_items(self.variant, &blob) {
            Ok(items) => {
                info!(
                    "event=items_load module=persistence status=ok key={key} count={}",
                    items.len()
                );
                let count = items.len();
                LoadReport {
                    items,
                    status: LoadStatus::Restored { count },
                }
            }
            Err(reason) => {
                warn!(
                    "event=items_load module=persistence status=discarded key={key} bytes={} reason={reason}",
                    blob.len()
                );
                discarded(reason)
            }
        }
    }
}

fn discarded(reason: DiscardReason) -> LoadReport {
    LoadReport {
        items: Vec::new(),
        status: LoadStatus::Discarded { reason },
    }
}

fn decode_items(variant: ListVariant, blob: &[u8]) -> Result<Vec<Item>, DiscardReason> {
    // serde_json messages can quote record content; keep only the position.
    let mut items: Vec<Item> = serde_json::from_slice(blob).map_err(|err| {
        DiscardReason::Undecodable(format!(
            "{:?} error at line {} column {}",
            err.classify(),
            err.line(),
            err.column()
        ))
    })?;

    let mut seen = HashSet::with_capacity(items.len());
    for (index, item) in items.iter_mut().enumerate() {
        if !seen.insert(item.id) {
            return Err(DiscardReason::SchemaMismatch(format!(
                "record {index} repeats id {}",
                item.id
            )));
        }
        if variant.is_dated() {
            if item.associated_date.is_none() {
                return Err(DiscardReason::SchemaMismatch(format!(
                    "record {index} is missing creationDate"
                )));
            }
        } else {
            item.associated_date = None;
        }
    }

    Ok(items)
}
