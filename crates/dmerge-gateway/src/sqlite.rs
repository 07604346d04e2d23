//! Ledger persisted in the local SQLite database.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dmerge_db::queries::{settings, slots};
use dmerge_db::DbError;
use dmerge_types::{unix_now, AccountId};
use tokio::sync::Mutex;

use crate::{GatewayError, Ledger, Result, Slot, TransactionCause, WriteReceipt};

/// Durable ledger backed by `dmerge-db`.
#[derive(Clone)]
pub struct SqliteLedger {
    address: String,
    db: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteLedger {
    /// Open (or create) the ledger database at `path`.
    pub fn open(path: &Path, address: impl Into<String>) -> Result<Self> {
        let conn = dmerge_db::open(path).map_err(db_unavailable)?;
        Ok(Self::from_connection(conn, address))
    }

    /// Ledger over an in-memory database.
    pub fn open_memory(address: impl Into<String>) -> Result<Self> {
        let conn = dmerge_db::open_memory().map_err(db_unavailable)?;
        Ok(Self::from_connection(conn, address))
    }

    fn from_connection(conn: rusqlite::Connection, address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Toggle the availability flag reported by the liveness probe.
    pub async fn set_available(&self, available: bool) -> Result<()> {
        let db = self.db.lock().await;
        settings::set(&db, "available", if available { "true" } else { "false" })
            .map_err(db_unavailable)
    }

    /// Accepted writes to `key`, oldest first.
    pub async fn history(&self, key: &str) -> Result<Vec<slots::WriteRecord>> {
        let db = self.db.lock().await;
        slots::history(&db, key).map_err(db_unavailable)
    }
}

fn db_unavailable(e: DbError) -> GatewayError {
    GatewayError::Unavailable(e.to_string())
}

#[async_trait]
impl Ledger for SqliteLedger {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn is_available(&self) -> Result<bool> {
        let db = self.db.lock().await;
        settings::get_bool(&db, "available", true).map_err(db_unavailable)
    }

    async fn chain_id(&self) -> Result<u64> {
        let db = self.db.lock().await;
        settings::get_u64(&db, "chain_id", 0).map_err(db_unavailable)
    }

    async fn get_data(&self, key: &str) -> Result<Slot> {
        let db = self.db.lock().await;
        let stored = slots::get(&db, key).map_err(db_unavailable)?;
        Ok(Slot {
            bytes: stored.value,
            version: stored.version,
        })
    }

    async fn set_data(
        &self,
        key: &str,
        bytes: &[u8],
        expected_version: u64,
        writer: &AccountId,
    ) -> Result<WriteReceipt> {
        let content_hash = *blake3::hash(bytes).as_bytes();
        let written_at = unix_now();
        let write = slots::SlotWrite {
            key,
            value: bytes,
            expected_version,
            writer,
            content_hash: &content_hash,
            written_at,
        };

        let db = self.db.lock().await;
        let version = slots::put(&db, &write).map_err(|e| match e {
            DbError::VersionConflict {
                expected, actual, ..
            } => GatewayError::Transaction(TransactionCause::Conflict { expected, actual }),
            other => GatewayError::Transaction(TransactionCause::Other(other.to_string())),
        })?;

        Ok(WriteReceipt {
            key: key.to_string(),
            version,
            writer: writer.clone(),
            content_hash,
            written_at,
        })
    }
}
