//! Item record.
//!
//! # Invariants
//! - `id` is generated once and never reassigned.
//! - `associated_date` is fixed at construction; only `name` is mutable.
//! - Wire names follow the persisted blob: `id`, `habitName`, `creationDate`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one tracked item.
pub type ItemId = Uuid;

/// Rejected item construction input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemValidationError {
    NilId,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "item id must not be nil"),
        }
    }
}

impl Error for ItemValidationError {}

/// One habit or task in a list.
///
/// Deserialization goes through [`Item::with_id`], so a decoded item never
/// carries a nil id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ItemRecord")]
pub struct Item {
    pub id: ItemId,
    /// User-facing label. Empty strings are allowed.
    #[serde(rename = "habitName")]
    pub name: String,
    /// Day this item belongs to. Only set for the dated list variant.
    #[serde(
        rename = "creationDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub associated_date: Option<DateTime<Utc>>,
}

/// Wire shape of [`Item`] before id validation.
#[derive(Deserialize)]
struct ItemRecord {
    id: ItemId,
    #[serde(rename = "habitName")]
    name: String,
    #[serde(rename = "creationDate", default)]
    associated_date: Option<DateTime<Utc>>,
}

impl TryFrom<ItemRecord> for Item {
    type Error = ItemValidationError;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        Self::with_id(record.id, record.name, record.associated_date)
    }
}

impl Item {
    /// Creates an item with a freshly generated id.
    pub fn new(name: impl Into<String>, associated_date: Option<DateTime<Utc>>) -> Self {
        Self::from_parts(Uuid::new_v4(), name.into(), associated_date)
    }

    /// Creates an item with a known id, e.g. when rebuilding from storage.
    ///
    /// # Errors
    /// - `ItemValidationError::NilId` when `id` is the nil UUID.
    pub fn with_id(
        id: ItemId,
        name: impl Into<String>,
        associated_date: Option<DateTime<Utc>>,
    ) -> Result<Self, ItemValidationError> {
        if id.is_nil() {
            return Err(ItemValidationError::NilId);
        }
        Ok(Self::from_parts(id, name.into(), associated_date))
    }

    fn from_parts(id: ItemId, name: String, associated_date: Option<DateTime<Utc>>) -> Self {
        Self {
            id,
            name,
            associated_date,
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}
