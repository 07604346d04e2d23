//! Proposal collection synchronized with the ledger slot.

use std::sync::Arc;

use dmerge_crypto::codec;
use dmerge_gateway::{ContractGateway, Wallet};
use dmerge_types::{unix_now, ProposalDraft, ProposalRecord, MERGERS_SLOT};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::workflow::Workflow;
use crate::{Result, StoreError};

/// Conditional-write retries after a version conflict.
pub const DEFAULT_MAX_WRITE_RETRIES: u32 = 3;

#[derive(Clone, Debug, Default)]
struct Snapshot {
    records: Vec<ProposalRecord>,
    /// Slot version the records were read at.
    version: u64,
}

/// Read cache of the proposal collection plus the create workflow.
pub struct ProposalStore {
    gateway: ContractGateway,
    snapshot: RwLock<Snapshot>,
    max_write_retries: u32,
    load: Workflow,
    create: Workflow,
}

impl ProposalStore {
    pub fn new(gateway: ContractGateway) -> Self {
        Self {
            gateway,
            snapshot: RwLock::new(Snapshot::default()),
            max_write_retries: DEFAULT_MAX_WRITE_RETRIES,
            load: Workflow::new(),
            create: Workflow::new(),
        }
    }

    pub fn with_max_write_retries(mut self, retries: u32) -> Self {
        self.max_write_retries = retries;
        self
    }

    pub fn gateway(&self) -> &ContractGateway {
        &self.gateway
    }

    /// Load workflow (refresh).
    pub fn load_workflow(&self) -> &Workflow {
        &self.load
    }

    /// Create workflow.
    pub fn create_workflow(&self) -> &Workflow {
        &self.create
    }

    /// Current records, in slot order.
    pub async fn records(&self) -> Vec<ProposalRecord> {
        self.snapshot.read().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.snapshot.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshot.read().await.records.is_empty()
    }

    /// Slot version the cached records were read at.
    pub async fn version(&self) -> u64 {
        self.snapshot.read().await.version
    }

    pub async fn get(&self, id: u64) -> Option<ProposalRecord> {
        self.snapshot
            .read()
            .await
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Reload the collection from the slot, replacing the cache.
    ///
    /// Empty or unparseable payloads become an empty collection. A failed
    /// read returns [`StoreError::Load`] and keeps the previous cache.
    pub async fn refresh(&self) -> Result<usize> {
        self.load.begin();
        let slot = match self.gateway.read_only().load(MERGERS_SLOT).await {
            Ok(slot) => slot,
            Err(e) => {
                warn!("Error loading data: {e}");
                self.load.fail(e.to_string());
                return Err(e.into());
            }
        };

        let records = parse_records(&slot.bytes);
        let count = records.len();
        *self.snapshot.write().await = Snapshot {
            records,
            version: slot.version,
        };
        self.load.succeed();
        debug!(count, version = slot.version, "proposals refreshed");
        Ok(count)
    }

    /// Create a proposal from form input. Unparseable numbers count as zero.
    pub async fn create_from_draft(
        &self,
        draft: &ProposalDraft,
        wallet: Option<Arc<dyn Wallet>>,
    ) -> Result<ProposalRecord> {
        self.create(
            &draft.name,
            codec::parse_input(&draft.treasury),
            codec::parse_input(&draft.activity),
            wallet,
        )
        .await
    }

    /// Create a proposal and persist the whole collection.
    ///
    /// The creator is the connected wallet's account. On a version conflict
    /// the slot is re-read and the append retried with a fresh id, up to the
    /// configured retry limit. Any failure leaves the cache untouched.
    pub async fn create(
        &self,
        name: &str,
        treasury: f64,
        activity: f64,
        wallet: Option<Arc<dyn Wallet>>,
    ) -> Result<ProposalRecord> {
        let signer = self.gateway.with_signer(wallet)?;
        self.create.begin();

        let mut base = self.snapshot.read().await.clone();
        let mut attempt = 0;
        let record = loop {
            let record = ProposalRecord {
                id: base.records.len() as u64 + 1,
                name: name.to_string(),
                treasury_encoded: codec::encode(treasury),
                activity_encoded: codec::encode(activity),
                valuation_encoded: codec::encode(0.0),
                created_at: unix_now(),
                creator: signer.account(),
            };

            let mut updated = base.records.clone();
            updated.push(record.clone());
            let bytes = match serde_json::to_vec(&updated) {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.create.fail(e.to_string());
                    return Err(StoreError::Serialization(e.to_string()));
                }
            };

            match signer.save(MERGERS_SLOT, &bytes, base.version).await {
                Ok(_) => break record,
                Err(e) if e.is_conflict() && attempt < self.max_write_retries => {
                    attempt += 1;
                    warn!(attempt, "proposal slot changed underneath us; retrying: {e}");
                    let slot = match signer.load(MERGERS_SLOT).await {
                        Ok(slot) => slot,
                        Err(e) => {
                            self.create.fail(e.to_string());
                            return Err(e.into());
                        }
                    };
                    base = Snapshot {
                        records: parse_records(&slot.bytes),
                        version: slot.version,
                    };
                }
                Err(e) => {
                    warn!("proposal submission failed: {e}");
                    self.create.fail(e.to_string());
                    return Err(e.into());
                }
            }
        };

        info!(id = record.id, name = %record.name, creator = %record.creator, "proposal created");
        self.create.succeed();

        if let Err(e) = self.refresh().await {
            warn!("refresh after create failed: {e}");
        }
        Ok(record)
    }
}

/// Decode a slot payload leniently: empty, blank, non-UTF-8 or
/// structurally invalid input is an empty collection.
pub fn parse_records(bytes: &[u8]) -> Vec<ProposalRecord> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let Ok(text) = std::str::from_utf8(bytes) else {
        debug!("proposal slot is not UTF-8; treating as empty");
        return Vec::new();
    };
    if text.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(text).unwrap_or_else(|e| {
        debug!("proposal slot is not a record array ({e}); treating as empty");
        Vec::new()
    })
}
