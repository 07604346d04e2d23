//! Named slot storage with versioned, conditional writes.

use rusqlite::{Connection, OptionalExtension};

use crate::{DbError, Result};

/// Current contents of a slot. A slot that was never written has version 0
/// and no bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoredSlot {
    pub value: Vec<u8>,
    pub version: u64,
    pub updated_at: u64,
}

/// A write request against one slot.
#[derive(Clone, Copy, Debug)]
pub struct SlotWrite<'a> {
    pub key: &'a str,
    pub value: &'a [u8],
    /// Version the writer read; the write is refused if the slot moved on.
    pub expected_version: u64,
    pub writer: &'a str,
    pub content_hash: &'a [u8],
    pub written_at: u64,
}

/// Journal entry for an accepted write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteRecord {
    pub key: String,
    pub version: u64,
    pub writer: String,
    pub content_hash: Vec<u8>,
    pub size_bytes: u64,
    pub written_at: u64,
}

/// Read a slot. Missing slots read as empty with version 0.
pub fn get(conn: &Connection, key: &str) -> Result<StoredSlot> {
    let row = conn
        .query_row(
            "SELECT value, version, updated_at FROM slots WHERE key = ?1",
            [key],
            |row| {
                Ok(StoredSlot {
                    value: row.get(0)?,
                    version: row.get::<_, i64>(1)? as u64,
                    updated_at: row.get::<_, i64>(2)? as u64,
                })
            },
        )
        .optional()?;
    Ok(row.unwrap_or_default())
}

/// Overwrite a slot if its version still equals `expected_version`.
///
/// Returns the new version. The check, the overwrite and the journal entry
/// commit atomically.
pub fn put(conn: &Connection, write: &SlotWrite<'_>) -> Result<u64> {
    let tx = conn.unchecked_transaction()?;

    let current: u64 = tx
        .query_row(
            "SELECT version FROM slots WHERE key = ?1",
            [write.key],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .unwrap_or(0) as u64;

    if current != write.expected_version {
        return Err(DbError::VersionConflict {
            key: write.key.to_string(),
            expected: write.expected_version,
            actual: current,
        });
    }

    let next = current + 1;
    tx.execute(
        "INSERT INTO slots (key, value, version, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value,
             version = excluded.version, updated_at = excluded.updated_at",
        rusqlite::params![write.key, write.value, next as i64, write.written_at as i64],
    )?;
    tx.execute(
        "INSERT INTO slot_writes (key, version, writer, content_hash, size_bytes, written_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            write.key,
            next as i64,
            write.writer,
            write.content_hash,
            write.value.len() as i64,
            write.written_at as i64,
        ],
    )?;
    tx.commit()?;

    tracing::debug!(key = write.key, version = next, "slot written");
    Ok(next)
}

/// Journal of accepted writes to a slot, oldest first.
pub fn history(conn: &Connection, key: &str) -> Result<Vec<WriteRecord>> {
    let mut stmt = conn.prepare(
        "SELECT key, version, writer, content_hash, size_bytes, written_at
         FROM slot_writes WHERE key = ?1 ORDER BY version ASC",
    )?;
    let rows = stmt.query_map([key], |row| {
        Ok(WriteRecord {
            key: row.get(0)?,
            version: row.get::<_, i64>(1)? as u64,
            writer: row.get(2)?,
            content_hash: row.get(3)?,
            size_bytes: row.get::<_, i64>(4)? as u64,
            written_at: row.get::<_, i64>(5)? as u64,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(DbError::Sqlite)
}
