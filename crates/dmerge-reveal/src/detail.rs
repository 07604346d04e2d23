//! Detail view state: the selected record and its revealed values.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dmerge_gateway::Wallet;
use dmerge_types::{ProposalRecord, RevealField};
use serde::Serialize;

use crate::{Result, Revealer};

/// Revealed values for the open detail view. Never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct DecodedCache {
    pub treasury: Option<f64>,
    pub activity: Option<f64>,
}

impl DecodedCache {
    pub fn get(&self, field: RevealField) -> Option<f64> {
        match field {
            RevealField::Treasury => self.treasury,
            RevealField::Activity => self.activity,
        }
    }

    pub fn set(&mut self, field: RevealField, value: Option<f64>) {
        match field {
            RevealField::Treasury => self.treasury = value,
            RevealField::Activity => self.activity = value,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Result of toggling a field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RevealOutcome {
    /// The field was decoded and cached.
    Revealed(f64),
    /// The field was already shown and has been hidden; no signature taken.
    Hidden,
    /// Signing or decoding failed; the cache is unchanged.
    NotRevealed,
}

impl RevealOutcome {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Revealed(v) => Some(v),
            Self::Hidden | Self::NotRevealed => None,
        }
    }
}

static NEXT_VIEW_TOKEN: AtomicU64 = AtomicU64::new(1);

/// First half of a toggle, decided without signing.
#[derive(Clone, Debug, PartialEq)]
pub enum Toggle {
    /// A shown field was hidden.
    Hidden,
    /// A hidden field needs a signature before it can be shown.
    Reveal(PendingReveal),
}

/// A reveal waiting on the wallet. Bound to the view that started it.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingReveal {
    view_token: u64,
    field: RevealField,
    encoded: String,
}

impl PendingReveal {
    pub fn field(&self) -> RevealField {
        self.field
    }

    /// Request the signature and decode. Holds no view state.
    pub async fn decode(&self, revealer: &Revealer, wallet: Option<Arc<dyn Wallet>>) -> Result<Option<f64>> {
        revealer.decode_with_signature(&self.encoded, wallet).await
    }
}

/// One open detail view.
///
/// Every call to [`DetailView::open`] gets a fresh token, so a reveal
/// started in a view that has since closed never lands in a later view of
/// the same record.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailView {
    token: u64,
    record: ProposalRecord,
    cache: DecodedCache,
}

impl DetailView {
    pub fn open(record: ProposalRecord) -> Self {
        Self {
            token: NEXT_VIEW_TOKEN.fetch_add(1, Ordering::Relaxed),
            record,
            cache: DecodedCache::default(),
        }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn record(&self) -> &ProposalRecord {
        &self.record
    }

    pub fn cache(&self) -> DecodedCache {
        self.cache
    }

    /// Hide a shown field, or reveal a hidden one through a signature.
    pub async fn toggle(
        &mut self,
        revealer: &Revealer,
        field: RevealField,
        wallet: Option<Arc<dyn Wallet>>,
    ) -> Result<RevealOutcome> {
        let pending = match self.begin_toggle(field) {
            Toggle::Hidden => return Ok(RevealOutcome::Hidden),
            Toggle::Reveal(pending) => pending,
        };
        let decoded = pending.decode(revealer, wallet).await?;
        Ok(self.finish(&pending, decoded).unwrap_or(RevealOutcome::NotRevealed))
    }

    /// Hide `field` if shown, otherwise describe the reveal to perform.
    pub fn begin_toggle(&mut self, field: RevealField) -> Toggle {
        if self.cache.get(field).is_some() {
            self.cache.set(field, None);
            return Toggle::Hidden;
        }
        Toggle::Reveal(PendingReveal {
            view_token: self.token,
            field,
            encoded: self.record.encoded(field).to_string(),
        })
    }

    /// Record a decode result. `None` if `pending` belongs to another view.
    pub fn finish(&mut self, pending: &PendingReveal, decoded: Option<f64>) -> Option<RevealOutcome> {
        if pending.view_token != self.token {
            return None;
        }
        Some(match decoded {
            Some(value) => {
                self.cache.set(pending.field, Some(value));
                RevealOutcome::Revealed(value)
            }
            None => RevealOutcome::NotRevealed,
        })
    }
}
