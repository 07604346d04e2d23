//! Event types for daemon-to-UI notification.
//!
//! Events are pushed to JSON-RPC subscribers as newline-delimited
//! notifications.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope for all daemon events.
#[derive(Clone, Debug, Serialize, Deserialize, TS)]
pub struct Event {
    pub event_type: EventType,
    #[ts(type = "number")]
    pub timestamp: u64,
    #[ts(type = "unknown")]
    pub payload: serde_json::Value,
}

/// All event types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // Workflow transitions
    LoadStateChanged,
    CreateStateChanged,
    RevealStateChanged,

    // Data
    ProposalsRefreshed,
    ProposalCreated,

    // Session
    WalletConnected,
    WalletDisconnected,
    BannerChanged,
    ViewChanged,

    // System
    DaemonStatus,
}

impl EventType {
    /// Subscription category: "workflow", "data", "session" or "system".
    pub fn category(self) -> &'static str {
        match self {
            Self::LoadStateChanged | Self::CreateStateChanged | Self::RevealStateChanged => {
                "workflow"
            }
            Self::ProposalsRefreshed | Self::ProposalCreated => "data",
            Self::WalletConnected
            | Self::WalletDisconnected
            | Self::BannerChanged
            | Self::ViewChanged => "session",
            Self::DaemonStatus => "system",
        }
    }
}
