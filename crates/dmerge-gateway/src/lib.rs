//! # dmerge-gateway
//!
//! Access to the ledger-backed key/value store holding the proposal slot.
//!
//! ```text
//!            ContractGateway
//!             │          │
//!   read_only()          with_signer(wallet)
//!       │                      │
//! ReadOnlyContract       SignedContract ── Wallet::sign_message
//!       │                      │
//!       └──────── dyn Ledger ──┘
//!                 ├─ MemoryLedger
//!                 └─ SqliteLedger (dmerge-db)
//! ```
//!
//! Every slot carries a version. Writers pass the version they read and
//! the ledger refuses the write if another writer got there first, so
//! concurrent read-modify-write cycles surface as
//! [`TransactionCause::Conflict`] instead of silently clobbering.

pub mod contract;
pub mod memory;
pub mod sqlite;
pub mod wallet;

use async_trait::async_trait;
use dmerge_types::AccountId;

pub use contract::{ContractGateway, ReadOnlyContract, SignedContract};
pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
pub use wallet::{LocalWallet, SignError, Wallet};

/// Raw contents of a named slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Slot {
    pub bytes: Vec<u8>,
    /// Number of accepted writes; 0 for a slot that was never written.
    pub version: u64,
}

/// Acknowledgement of an accepted write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteReceipt {
    pub key: String,
    pub version: u64,
    pub writer: AccountId,
    /// BLAKE3 of the written bytes.
    pub content_hash: [u8; 32],
    pub written_at: u64,
}

impl WriteReceipt {
    /// Transaction-hash style identifier, `0x` + hex of the content hash.
    pub fn tx_id(&self) -> String {
        format!("0x{}", hex::encode(self.content_hash))
    }
}

/// Why a write was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionCause {
    /// The account holder refused to sign.
    Declined,
    /// The slot was written by someone else after it was read.
    Conflict { expected: u64, actual: u64 },
    /// Anything else, with a human-readable message.
    Other(String),
}

impl std::fmt::Display for TransactionCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Declined => write!(f, "user rejected transaction"),
            Self::Conflict { expected, actual } => write!(
                f,
                "slot changed since it was read (expected version {expected}, found {actual})"
            ),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// Gateway error types.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No wallet/account is connected.
    #[error("no wallet connected")]
    Connection,

    /// A write was rejected or failed.
    #[error("transaction failed: {0}")]
    Transaction(TransactionCause),

    /// The ledger could not be reached or read.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::Transaction(TransactionCause::Declined))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Transaction(TransactionCause::Conflict { .. }))
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Storage backend holding named slots.
///
/// Implementations perform a single attempt per call and never retry;
/// retry policy belongs to the caller.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Address of the contract the slots live under.
    fn address(&self) -> String;

    /// Liveness probe.
    async fn is_available(&self) -> Result<bool>;

    /// Chain the contract is deployed on, as reported by the backend.
    async fn chain_id(&self) -> Result<u64>;

    /// Read a slot. Missing slots are empty with version 0.
    async fn get_data(&self, key: &str) -> Result<Slot>;

    /// Overwrite a slot if it is still at `expected_version`.
    async fn set_data(
        &self,
        key: &str,
        bytes: &[u8],
        expected_version: u64,
        writer: &AccountId,
    ) -> Result<WriteReceipt>;
}
