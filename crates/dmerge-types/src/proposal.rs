//! Merger proposal records as stored in the `"mergers"` slot.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::AccountId;

/// One merger proposal.
///
/// The three financial fields hold codec tokens, never raw numbers. The
/// serialized field names (`treasury`, `memberActivity`, `valuation`,
/// `timestamp`) must not change: existing slots are read back with them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TS)]
pub struct ProposalRecord {
    /// Sequence number, `count + 1` at creation time.
    #[ts(type = "number")]
    pub id: u64,
    pub name: String,
    #[serde(rename = "treasury")]
    pub treasury_encoded: String,
    #[serde(rename = "memberActivity")]
    pub activity_encoded: String,
    /// Seeded from zero at creation and never recomputed.
    #[serde(rename = "valuation")]
    pub valuation_encoded: String,
    /// Unix seconds.
    #[serde(rename = "timestamp")]
    #[ts(type = "number")]
    pub created_at: u64,
    pub creator: AccountId,
}

impl ProposalRecord {
    /// The encoded token backing a revealable field.
    pub fn encoded(&self, field: RevealField) -> &str {
        match field {
            RevealField::Treasury => &self.treasury_encoded,
            RevealField::Activity => &self.activity_encoded,
        }
    }
}

/// Fields of a record that can be revealed through a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum RevealField {
    Treasury,
    Activity,
}

impl std::str::FromStr for RevealField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "treasury" => Ok(Self::Treasury),
            "activity" | "memberActivity" => Ok(Self::Activity),
            other => Err(format!("unknown field '{other}'")),
        }
    }
}

/// Create-proposal form contents, as typed by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ProposalDraft {
    pub name: String,
    pub treasury: String,
    pub activity: String,
}

impl ProposalDraft {
    /// Submission requires all three inputs to be non-empty.
    pub fn is_submittable(&self) -> bool {
        !self.name.is_empty() && !self.treasury.is_empty() && !self.activity.is_empty()
    }
}
