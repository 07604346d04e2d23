//! # dmerge-store
//!
//! The in-memory proposal collection and its synchronization with the
//! `"mergers"` ledger slot.
//!
//! The slot is the source of truth. [`ProposalStore::refresh`] replaces the
//! cached collection wholesale; [`ProposalStore::create`] appends to a copy,
//! writes the whole collection back conditionally on the version it was
//! read at, and then refreshes.

pub mod store;
pub mod workflow;

use dmerge_gateway::{GatewayError, TransactionCause};

pub use store::{parse_records, ProposalStore, DEFAULT_MAX_WRITE_RETRIES};
pub use workflow::Workflow;

/// Store error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No wallet connected.
    #[error("no wallet connected")]
    Connection,

    /// The write was rejected or failed.
    #[error("transaction failed: {0}")]
    Transaction(TransactionCause),

    /// The slot could not be read.
    #[error("failed to load data: {0}")]
    Load(String),

    /// The collection could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::Transaction(TransactionCause::Declined))
    }
}

impl From<GatewayError> for StoreError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Connection => Self::Connection,
            GatewayError::Transaction(cause) => Self::Transaction(cause),
            GatewayError::Unavailable(msg) => Self::Load(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
