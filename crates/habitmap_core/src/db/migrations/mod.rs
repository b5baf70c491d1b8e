//! Ordered schema migrations for the key-value table.
//!
//! # Invariants
//! - `version` values are strictly increasing.
//! - All pending steps run inside one `IMMEDIATE` transaction.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_kv_entries.sql"),
}];

/// Latest schema version this binary knows how to produce.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file is ahead of this binary.
/// - `DbError::Sqlite` when any step fails; nothing is committed in that case.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let supported = latest_version();
    if check_version(conn, supported)? == supported {
        return Ok(());
    }

    // Re-read under the write lock; another connection may have migrated.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let found = check_version(&tx, supported)?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > found) {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
    }
    tx.commit()?;

    if found < supported {
        info!("event=db_migrate module=db status=ok from_version={found} to_version={supported}");
    }
    Ok(())
}

fn check_version(conn: &Connection, supported: u32) -> DbResult<u32> {
    let found = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    if found > supported {
        return Err(DbError::UnsupportedSchemaVersion { found, supported });
    }
    Ok(found)
}
