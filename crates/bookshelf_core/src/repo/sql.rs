//! Shared SQLite helpers for repository implementations.

use crate::repo::error::{RepoError, RepoResult};
use log::warn;
use rusqlite::{Connection, Params, Transaction, TransactionBehavior};
use uuid::Uuid;

const WRITE_SAVEPOINT: &str = "bookshelf_write";

/// Runs `op` as one atomic write.
///
/// Outside a transaction this takes the write lock up front
/// (`BEGIN IMMEDIATE`). Inside a caller-owned transaction (seed batches) it
/// nests in a savepoint so a failed write is undone without aborting the
/// caller.
pub(crate) fn write_atomically<T>(
    conn: &Connection,
    op: impl FnOnce(&Connection) -> RepoResult<T>,
) -> RepoResult<T> {
    if conn.is_autocommit() {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        let value = op(&tx)?;
        tx.commit()?;
        return Ok(value);
    }

    conn.execute_batch(&format!("SAVEPOINT {WRITE_SAVEPOINT};"))?;
    match op(conn) {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {WRITE_SAVEPOINT};"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = conn.execute_batch(&format!(
                "ROLLBACK TO {WRITE_SAVEPOINT}; RELEASE {WRITE_SAVEPOINT};"
            )) {
                warn!(
                    "event=savepoint_rollback module=repo status=error error={}",
                    rollback_err
                );
            }
            Err(err)
        }
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn exists(conn: &Connection, sql: &str, params: impl Params) -> RepoResult<bool> {
    let found: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(found == 1)
}

pub(crate) fn count(conn: &Connection, sql: &str, params: impl Params) -> RepoResult<u64> {
    let value: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    u64::try_from(value).map_err(|_| RepoError::InvalidData(format!("negative count {value}")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
