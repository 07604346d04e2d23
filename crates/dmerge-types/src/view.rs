//! View and workflow state exposed to front ends.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::proposal::ProposalDraft;

/// Top-level navigation tabs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Dashboard,
    Proposals,
    Faq,
    Partners,
}

impl std::str::FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dashboard" => Ok(Self::Dashboard),
            "proposals" => Ok(Self::Proposals),
            "faq" => Ok(Self::Faq),
            "partners" => Ok(Self::Partners),
            other => Err(format!("unknown tab '{other}'")),
        }
    }
}

/// Status banner severity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum BannerStatus {
    #[default]
    Pending,
    Success,
    Error,
}

/// Transient status notification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct StatusBanner {
    pub visible: bool,
    pub status: BannerStatus,
    pub message: String,
}

impl StatusBanner {
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn shown(status: BannerStatus, message: impl Into<String>) -> Self {
        Self {
            visible: true,
            status,
            message: message.into(),
        }
    }
}

/// Lifecycle of one asynchronous workflow (load, create, reveal).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed(String),
}

impl WorkflowState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }
}

/// Snapshot of everything a front end needs to render the page chrome.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct ViewState {
    pub active_tab: Tab,
    pub show_create_modal: bool,
    pub draft: ProposalDraft,
    /// Id of the proposal whose detail view is open.
    #[ts(type = "number | null")]
    pub selected: Option<u64>,
    pub decrypted_treasury: Option<f64>,
    pub decrypted_activity: Option<f64>,
    pub banner: StatusBanner,
    pub refreshing: bool,
    pub creating: bool,
    pub decrypting: bool,
}

/// One FAQ entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// One partner listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Partner {
    pub name: String,
    pub logo: String,
    pub url: String,
}
