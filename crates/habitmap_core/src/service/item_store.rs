//! In-memory item store with write-through persistence.
//!
//! # Responsibility
//! - Hold the authoritative ordered item list for one list variant.
//! - Apply add/rename/remove and immediately persist the whole list.
//! - Notify subscribers after every in-memory change.
//!
//! # Invariants
//! - Item ids are pairwise distinct at all times.
//! - Order is insertion order; rename keeps an item's position.
//! - A failed lookup leaves the list untouched.
//! - A failed write keeps the in-memory change; the caller gets `Unsaved`.

use crate::filter;
use crate::model::item::{Item, ItemId};
use crate::model::variant::ListVariant;
use crate::repo::item_repo::{ItemPersistence, LoadStatus, PersistenceError};
use crate::repo::kv_repo::KeyValueStore;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Error returned by store mutations.
#[derive(Debug)]
pub enum StoreError {
    /// No item with this id exists; nothing was changed.
    NotFound(ItemId),
    /// The change is applied in memory but could not be persisted.
    Unsaved {
        change: Item,
        source: PersistenceError,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::Unsaved { change, source } => write!(
                f,
                "change to item {} was applied but not saved: {source}",
                change.id
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Unsaved { source, .. } => Some(source),
        }
    }
}

/// Kind of change applied to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Added(ItemId),
    Renamed(ItemId),
    Removed(ItemId),
}

/// Notification sent to subscribers after each in-memory change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreEvent {
    pub change: StoreChange,
    /// Whether the write-through after this change succeeded.
    pub saved: bool,
}

/// Session-scoped item list for one variant.
pub struct ItemStore<S: KeyValueStore> {
    persistence: ItemPersistence<S>,
    items: Vec<Item>,
    load_status: LoadStatus,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl<S: KeyValueStore> ItemStore<S> {
    /// Opens the store for `variant`, loading whatever is persisted in `kv`.
    ///
    /// Never fails: unreadable state starts an empty list, see
    /// [`ItemStore::load_status`].
    pub fn open(variant: ListVariant, kv: S) -> Self {
        let persistence = ItemPersistence::new(kv, variant);
        let report = persistence.load_report();
        info!(
            "event=store_open module=store status=ok list={variant} count={}",
            report.items.len()
        );
        Self {
            persistence,
            items: report.items,
            load_status: report.status,
            subscribers: Vec::new(),
        }
    }

    pub fn variant(&self) -> ListVariant {
        self.persistence.variant()
    }

    /// How the initial list was obtained.
    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    /// Full list in insertion order.
    pub fn all(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Registers a change listener. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (sender, receiver) = channel();
        self.subscribers.push(sender);
        receiver
    }

    /// Appends a new item and persists the list.
    ///
    /// # Contract
    /// - Dated lists default a missing `date` to now.
    /// - Undated lists ignore any supplied `date`.
    /// - Empty names are accepted.
    /// - Returns the created item, including its fresh id.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        date: Option<DateTime<Utc>>,
    ) -> Result<Item, StoreError> {
        let associated_date = if self.variant().is_dated() {
            Some(date.unwrap_or_else(Utc::now))
        } else {
            if date.is_some() {
                debug!(
                    "event=item_add module=store list={} note=date_ignored",
                    self.variant()
                );
            }
            None
        };

        let item = Item::new(name, associated_date);
        self.items.push(item.clone());
        info!(
            "event=item_add module=store list={} item_id={} count={}",
            self.variant(),
            item.id,
            self.items.len()
        );
        self.commit(StoreChange::Added(item.id), item)
    }

    /// Replaces the name of item `id` in place and persists the list.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when `id` is unknown; nothing changes.
    /// - `StoreError::Unsaved` when the write-through fails.
    pub fn rename(&mut self, id: ItemId, new_name: impl Into<String>) -> Result<Item, StoreError> {
        let position = self.position_of(id, "item_rename")?;
        let item = &mut self.items[position];
        item.rename(new_name);
        let renamed = item.clone();
        info!(
            "event=item_rename module=store list={} item_id={id} position={position}",
            self.variant()
        );
        self.commit(StoreChange::Renamed(id), renamed)
    }

    /// Removes item `id` and persists the list.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when `id` is unknown; nothing changes.
    /// - `StoreError::Unsaved` when the write-through fails.
    pub fn remove(&mut self, id: ItemId) -> Result<Item, StoreError> {
        let position = self.position_of(id, "item_remove")?;
        let removed = self.items.remove(position);
        info!(
            "event=item_remove module=store list={} item_id={id} count={}",
            self.variant(),
            self.items.len()
        );
        self.commit(StoreChange::Removed(id), removed)
    }

    /// Items shown for `day` in the local calendar.
    ///
    /// Undated lists show every item regardless of `day`.
    pub fn visible_items(&self, day: NaiveDate) -> Vec<&Item> {
        self.visible_items_in(day, &Local)
    }

    /// Like [`ItemStore::visible_items`] with an explicit timezone.
    pub fn visible_items_in<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> Vec<&Item> {
        if !self.variant().is_dated() {
            return self.items.iter().collect();
        }
        filter::on_day(&self.items, day, tz)
    }

    fn position_of(&self, id: ItemId, event: &str) -> Result<usize, StoreError> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| {
                warn!(
                    "event={event} module=store status=not_found list={} item_id={id}",
                    self.variant()
                );
                StoreError::NotFound(id)
            })
    }

    fn commit(&mut self, change: StoreChange, item: Item) -> Result<Item, StoreError> {
        let result = self.persistence.save(&self.items);
        self.notify(StoreEvent {
            change,
            saved: result.is_ok(),
        });

        match result {
            Ok(()) => Ok(item),
            Err(source) => {
                warn!(
                    "event=store_commit module=store status=unsaved list={} item_id={}",
                    self.variant(),
                    item.id
                );
                Err(StoreError::Unsaved {
                    change: item,
                    source,
                })
            }
        }
    }

    fn notify(&mut self, event: StoreEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemStore, StoreChange, StoreError, StoreEvent};
    use crate::db::open_db_in_memory;
    use crate::model::variant::ListVariant;
    use crate::repo::kv_repo::SqliteKeyValueStore;
    use uuid::Uuid;

    #[test]
    fn subscribers_receive_one_event_per_mutation() {
        let conn = open_db_in_memory().unwrap();
        let mut store = ItemStore::open(ListVariant::Habits, SqliteKeyValueStore::new(&conn));
        let events = store.subscribe();

        let added = store.add("Walk", None).unwrap();
        store.rename(added.id, "Run").unwrap();
        store.remove(added.id).unwrap();

        let received: Vec<StoreEvent> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                StoreEvent {
                    change: StoreChange::Added(added.id),
                    saved: true
                },
                StoreEvent {
                    change: StoreChange::Renamed(added.id),
                    saved: true
                },
                StoreEvent {
                    change: StoreChange::Removed(added.id),
                    saved: true
                },
            ]
        );
    }

    #[test]
    fn not_found_emits_no_event() {
        let conn = open_db_in_memory().unwrap();
        let mut store = ItemStore::open(ListVariant::Habits, SqliteKeyValueStore::new(&conn));
        let events = store.subscribe();

        let err = store.remove(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let conn = open_db_in_memory().unwrap();
        let mut store = ItemStore::open(ListVariant::Habits, SqliteKeyValueStore::new(&conn));
        drop(store.subscribe());

        store.add("Read", None).unwrap();
        assert!(store.subscribers.is_empty());
    }
}
