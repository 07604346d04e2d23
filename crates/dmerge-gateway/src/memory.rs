//! In-process ledger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dmerge_types::{unix_now, AccountId, DEFAULT_CHAIN_ID};

use crate::{GatewayError, Ledger, Result, Slot, TransactionCause, WriteReceipt};

#[derive(Default)]
struct Inner {
    slots: HashMap<String, Slot>,
    journal: Vec<WriteReceipt>,
    read_failure: Option<String>,
    write_failure: Option<String>,
}

/// Ledger kept in memory, for tests and throwaway sessions.
///
/// Read and write failures can be injected to exercise error paths. Lock
/// poisoning maps to [`GatewayError::Unavailable`].
pub struct MemoryLedger {
    address: String,
    chain_id: u64,
    available: AtomicBool,
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            chain_id: DEFAULT_CHAIN_ID,
            available: AtomicBool::new(true),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Seed a slot with raw bytes, bypassing versioning.
    pub fn seed(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut inner = self.lock()?;
        let slot = inner.slots.entry(key.to_string()).or_default();
        slot.bytes = bytes.to_vec();
        slot.version += 1;
        Ok(())
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make every read fail with `message` until cleared with `None`.
    pub fn set_read_failure(&self, message: Option<&str>) -> Result<()> {
        self.lock()?.read_failure = message.map(str::to_string);
        Ok(())
    }

    /// Make every write fail with `message` until cleared with `None`.
    pub fn set_write_failure(&self, message: Option<&str>) -> Result<()> {
        self.lock()?.write_failure = message.map(str::to_string);
        Ok(())
    }

    /// Accepted writes, oldest first.
    pub fn journal(&self) -> Result<Vec<WriteReceipt>> {
        Ok(self.lock()?.journal.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| GatewayError::Unavailable("ledger lock poisoned".to_string()))
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn is_available(&self) -> Result<bool> {
        Ok(self.available.load(Ordering::SeqCst))
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn get_data(&self, key: &str) -> Result<Slot> {
        let inner = self.lock()?;
        if let Some(msg) = &inner.read_failure {
            return Err(GatewayError::Unavailable(msg.clone()));
        }
        Ok(inner.slots.get(key).cloned().unwrap_or_default())
    }

    async fn set_data(
        &self,
        key: &str,
        bytes: &[u8],
        expected_version: u64,
        writer: &AccountId,
    ) -> Result<WriteReceipt> {
        let mut inner = self.lock()?;
        if let Some(msg) = &inner.write_failure {
            return Err(GatewayError::Transaction(TransactionCause::Other(msg.clone())));
        }

        let slot = inner.slots.entry(key.to_string()).or_default();
        if slot.version != expected_version {
            return Err(GatewayError::Transaction(TransactionCause::Conflict {
                expected: expected_version,
                actual: slot.version,
            }));
        }
        slot.bytes = bytes.to_vec();
        slot.version += 1;

        let receipt = WriteReceipt {
            key: key.to_string(),
            version: slot.version,
            writer: writer.clone(),
            content_hash: *blake3::hash(bytes).as_bytes(),
            written_at: unix_now(),
        };
        inner.journal.push(receipt.clone());
        Ok(receipt)
    }
}
