//! # dmerge-types
//!
//! Shared domain types used across the dmerge workspace.
//!
//! Field names on the serialized structures are the wire contract of the
//! `"mergers"` slot and of the daemon's JSON-RPC surface; front ends consume
//! the TypeScript bindings generated from these definitions.

pub mod analysis;
pub mod events;
pub mod proposal;
pub mod view;

pub use analysis::{DashboardSummary, MergerAnalysis};
pub use proposal::{ProposalDraft, ProposalRecord, RevealField};
pub use view::{BannerStatus, StatusBanner, Tab, WorkflowState};

/// Account identifier of a connected wallet (`0x`-prefixed hex).
pub type AccountId = String;

/// Name of the ledger slot holding the JSON array of proposal records.
pub const MERGERS_SLOT: &str = "mergers";

/// Chain id of a local development node.
pub const DEFAULT_CHAIN_ID: u64 = 31337;

/// Default validity window, in days, advertised in the signature message.
pub const DEFAULT_DURATION_DAYS: u32 = 30;

/// Number of random hex characters in the session public key.
pub const SESSION_KEY_HEX_LEN: usize = 2000;

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
