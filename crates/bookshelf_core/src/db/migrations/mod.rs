//! Versioned schema for the catalogue and account tables.
//!
//! Each step is one SQL file applied inside a single write transaction; the
//! highest applied step is stored in `PRAGMA user_version`. Steps are never
//! edited after release, new schema goes into a new step.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, TransactionBehavior};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "catalog",
        sql: include_str!("0001_catalog.sql"),
    },
    Migration {
        version: 2,
        name: "accounts",
        sql: include_str!("0002_accounts.sql"),
    },
    Migration {
        version: 3,
        name: "permissions",
        sql: include_str!("0003_permissions.sql"),
    },
];

/// Highest schema version this build can write.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Schema version recorded in the database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Brings the schema up to `latest_version()` and returns the versions
/// applied by this call (empty when already current).
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
/// - `MigrationFailed` naming the step whose SQL failed; nothing of the
///   batch is kept.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<Vec<u32>> {
    let latest = latest_version();
    let found = schema_version(conn)?;
    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }
    if found == latest {
        debug!("event=db_migrate module=db status=current version={found}");
        return Ok(Vec::new());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    // Re-read under the write lock: a concurrent opener may have migrated.
    let base = schema_version(&tx)?;
    let mut applied = Vec::new();
    for step in MIGRATIONS.iter().filter(|step| step.version > base) {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::MigrationFailed {
                version: step.version,
                name: step.name,
                source,
            })?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            step.version, step.name
        );
        applied.push(step.version);
    }
    tx.commit()?;
    Ok(applied)
}
