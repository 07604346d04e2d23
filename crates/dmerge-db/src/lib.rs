//! # dmerge-db
//!
//! SQLite storage behind the local ledger gateway.
//!
//! ## Schema
//!
//! - `slots`: one row per named slot, holding raw bytes and a write counter
//! - `slot_writes`: append-only journal of every accepted write
//! - `settings`: daemon key/value settings
//!
//! WAL mode, foreign keys on, timestamps in Unix seconds, schema version in
//! `PRAGMA user_version`.

pub mod migrations;
pub mod queries;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Conditional write lost the race: the slot moved past the expected version.
    #[error("version conflict on '{key}': expected {expected}, found {actual}")]
    VersionConflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the ledger database at the given path.
///
/// Configures WAL mode, foreign keys, and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_memory() {
        let conn = open_memory().expect("open in-memory db");
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("get user_version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_open_file_twice() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("ledger.db");
        {
            let conn = open(&path).expect("first open");
            let write = queries::slots::SlotWrite {
                key: "mergers",
                value: b"[]",
                expected_version: 0,
                writer: "0xabc",
                content_hash: &[0u8; 32],
                written_at: 1,
            };
            queries::slots::put(&conn, &write).expect("put");
        }
        let conn = open(&path).expect("reopen");
        let slot = queries::slots::get(&conn, "mergers").expect("get");
        assert_eq!(slot.version, 1);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open_memory().expect("open");
        let fk: i32 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .expect("get foreign_keys");
        assert_eq!(fk, 1);
    }
}
