//! Session signature context.

use dmerge_crypto::session;
use dmerge_types::{unix_now, DEFAULT_DURATION_DAYS, SESSION_KEY_HEX_LEN};
use serde::{Deserialize, Serialize};

/// Values signed by the wallet before any reveal.
///
/// Built once at session start and shared by reference for the session's
/// lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureContext {
    pub public_key: String,
    pub contract_address: String,
    pub chain_id: u64,
    pub start_timestamp: u64,
    pub duration_days: u32,
}

impl SignatureContext {
    pub fn new(
        public_key: impl Into<String>,
        contract_address: impl Into<String>,
        chain_id: u64,
        start_timestamp: u64,
        duration_days: u32,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            contract_address: contract_address.into(),
            chain_id,
            start_timestamp,
            duration_days,
        }
    }

    /// Context for a session starting now, with a fresh random public key
    /// and the default validity window.
    pub fn for_session(contract_address: impl Into<String>, chain_id: u64) -> Self {
        Self::new(
            session::generate_public_key(SESSION_KEY_HEX_LEN),
            contract_address,
            chain_id,
            unix_now(),
            DEFAULT_DURATION_DAYS,
        )
    }

    /// The exact text the wallet signs. Verifiers elsewhere rebuild it
    /// byte for byte: five `name:value` lines, `\n`-separated, no trailing
    /// newline.
    pub fn message(&self) -> String {
        format!(
            "publickey:{}\ncontractAddresses:{}\ncontractsChainId:{}\nstartTimestamp:{}\ndurationDays:{}",
            self.public_key,
            self.contract_address,
            self.chain_id,
            self.start_timestamp,
            self.duration_days
        )
    }
}
