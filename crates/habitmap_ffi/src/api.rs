//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the item list operations to Dart via FRB.
//! - Map core results to flat envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Each call runs load, mutate and save inside one `IMMEDIATE` transaction,
//!   so concurrent UI calls never interleave whole-list writes.
//! - The store lives for one call only: a failed call is rolled back and its
//!   change is reported as not applied.
//! - Mutations are refused when the stored list could not be read, so a
//!   transient read error never overwrites it.
//! - List variants are addressed as `tasks` or `habits`.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use habitmap_core::db::open_db;
use habitmap_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DiscardReason, Item, ItemId, ItemStore, KeyValueStore, ListVariant, LoadStatus,
    SqliteKeyValueStore, StoreError,
};
use log::warn;
use rusqlite::TransactionBehavior;
use std::path::PathBuf;
use std::sync::OnceLock;

const DEFAULT_DB_FILE_NAME: &str = "habitmap_items.sqlite3";
static STORAGE_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Pins the database file used by every item call.
///
/// Must run before the first item call; otherwise a file in the system temp
/// directory is used.
///
/// # FFI contract
/// - Repeating the call with the same path is a no-op.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_storage(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }

    let requested = PathBuf::from(trimmed);
    let active = STORAGE_PATH.get_or_init(|| requested.clone());
    if *active != requested {
        return format!(
            "storage already initialized at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        );
    }
    String::new()
}

/// Flat item shape rendered by list rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    /// Stable item ID in string form.
    pub id: String,
    pub name: String,
    /// Associated day as epoch milliseconds; `None` for habits.
    pub associated_date_ms: Option<i64>,
}

impl From<&Item> for ItemView {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            associated_date_ms: item.associated_date.map(|date| date.timestamp_millis()),
        }
    }
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemListResponse {
    pub ok: bool,
    /// Items in list order (empty on failure).
    pub items: Vec<ItemView>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

impl ItemListResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            message: message.into(),
        }
    }
}

/// Mutation response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemActionResponse {
    pub ok: bool,
    /// Affected item after the change (removed item for deletes).
    pub item: Option<ItemView>,
    pub message: String,
}

impl ItemActionResponse {
    fn success(message: impl Into<String>, item: &Item) -> Self {
        Self {
            ok: true,
            item: Some(item.into()),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            item: None,
            message: message.into(),
        }
    }
}

/// Lists every item of `variant` in insertion order.
#[flutter_rust_bridge::frb(sync)]
pub fn items_list(variant: String) -> ItemListResponse {
    match with_store(&variant, |store| {
        Ok((to_views(store.all().iter()), store.load_status().clone()))
    }) {
        Ok((items, status)) => listed(items, &status),
        Err(err) => ItemListResponse::failure(format!("items_list failed: {err}")),
    }
}

/// Lists the items shown for one local calendar day.
///
/// Habits ignore the day and return the whole list.
#[flutter_rust_bridge::frb(sync)]
pub fn items_visible(variant: String, year: i32, month: u32, day: u32) -> ItemListResponse {
    let Some(selected) = NaiveDate::from_ymd_opt(year, month, day) else {
        return ItemListResponse::failure(format!(
            "items_visible failed: invalid date {year:04}-{month:02}-{day:02}"
        ));
    };
    match with_store(&variant, |store| {
        Ok((
            to_views(store.visible_items(selected).into_iter()),
            store.load_status().clone(),
        ))
    }) {
        Ok((items, status)) => listed(items, &status),
        Err(err) => ItemListResponse::failure(format!("items_visible failed: {err}")),
    }
}

/// Appends an item to `variant`.
///
/// Tasks default a missing `associated_date_ms` to now; habits ignore it.
#[flutter_rust_bridge::frb(sync)]
pub fn item_add(
    variant: String,
    name: String,
    associated_date_ms: Option<i64>,
) -> ItemActionResponse {
    let date = match associated_date_ms.map(parse_epoch_ms).transpose() {
        Ok(date) => date,
        Err(err) => return ItemActionResponse::failure(format!("item_add failed: {err}")),
    };
    match with_store(&variant, |store| {
        ensure_writable(store)?;
        store.add(name, date).map_err(store_error)
    }) {
        Ok(item) => ItemActionResponse::success("Item added.", &item),
        Err(err) => ItemActionResponse::failure(format!("item_add failed: {err}")),
    }
}

/// Renames one item by ID.
#[flutter_rust_bridge::frb(sync)]
pub fn item_rename(variant: String, item_id: String, new_name: String) -> ItemActionResponse {
    let id = match parse_item_id(&item_id) {
        Ok(id) => id,
        Err(err) => return ItemActionResponse::failure(format!("item_rename failed: {err}")),
    };
    match with_store(&variant, |store| {
        ensure_writable(store)?;
        store.rename(id, new_name).map_err(store_error)
    }) {
        Ok(item) => ItemActionResponse::success("Item renamed.", &item),
        Err(err) => ItemActionResponse::failure(format!("item_rename failed: {err}")),
    }
}

/// Removes one item by ID.
#[flutter_rust_bridge::frb(sync)]
pub fn item_remove(variant: String, item_id: String) -> ItemActionResponse {
    let id = match parse_item_id(&item_id) {
        Ok(id) => id,
        Err(err) => return ItemActionResponse::failure(format!("item_remove failed: {err}")),
    };
    match with_store(&variant, |store| {
        ensure_writable(store)?;
        store.remove(id).map_err(store_error)
    }) {
        Ok(item) => ItemActionResponse::success("Item removed.", &item),
        Err(err) => ItemActionResponse::failure(format!("item_remove failed: {err}")),
    }
}

fn resolve_db_path() -> PathBuf {
    STORAGE_PATH
        .get_or_init(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
        .clone()
}

fn with_store<T>(
    variant: &str,
    f: impl FnOnce(&mut ItemStore<SqliteKeyValueStore<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    let variant: ListVariant = variant.parse()?;
    let mut conn =
        open_db(resolve_db_path()).map_err(|err| format!("item DB open failed: {err}"))?;
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| format!("item DB lock failed: {err}"))?;

    let result = {
        let mut store = ItemStore::open(variant, SqliteKeyValueStore::new(&tx));
        f(&mut store)
    };

    match result {
        Ok(value) => {
            tx.commit()
                .map_err(|err| format!("item DB commit failed: {err}"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!("event=ffi_rollback module=ffi status=error error={rollback_err}");
            }
            Err(err)
        }
    }
}

/// The per-call store is dropped with the call, so an unsaved change is lost.
fn store_error(err: StoreError) -> String {
    match err {
        StoreError::Unsaved { change, source } => {
            warn!(
                "event=ffi_store module=ffi status=not_applied item_id={}",
                change.id
            );
            format!("change to item {} was not applied: {source}", change.id)
        }
        other => other.to_string(),
    }
}

fn ensure_writable<S: KeyValueStore>(store: &ItemStore<S>) -> Result<(), String> {
    match store.load_status() {
        LoadStatus::Discarded {
            reason: DiscardReason::ReadFailed(details),
        } => Err(format!(
            "stored {} list could not be read ({details}); refusing to overwrite it",
            store.variant()
        )),
        _ => Ok(()),
    }
}

fn to_views<'a>(items: impl Iterator<Item = &'a Item>) -> Vec<ItemView> {
    items.map(ItemView::from).collect()
}

fn listed(items: Vec<ItemView>, status: &LoadStatus) -> ItemListResponse {
    let mut message = if items.is_empty() {
        "No items.".to_string()
    } else {
        format!("Found {} item(s).", items.len())
    };
    if let LoadStatus::Discarded { reason } = status {
        message.push_str(&format!(" Stored list was discarded: {reason}."));
    }
    ItemListResponse {
        ok: true,
        items,
        message,
    }
}

fn parse_item_id(raw: &str) -> Result<ItemId, String> {
    ItemId::parse_str(raw.trim()).map_err(|_| format!("invalid item id `{raw}`"))
}

fn parse_epoch_ms(ms: i64) -> Result<DateTime<Utc>, String> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| format!("invalid epoch milliseconds {ms}"))
}
