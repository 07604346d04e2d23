//! Connected-account abstraction.
//!
//! A [`Wallet`] owns the account key and produces message signatures. The
//! holder may refuse any signature request; that outcome is
//! [`SignError::Declined`], a normal result rather than a fault.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dmerge_crypto::ed25519::{KeyPair, Signature, VerifyingKey};
use dmerge_types::AccountId;
use tracing::debug;

/// Signature request failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    #[error("user rejected signature request")]
    Declined,
    #[error("signing failed: {0}")]
    Failed(String),
}

/// A connected account able to sign messages.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Account identifier.
    fn account(&self) -> AccountId;

    /// Public key that verifies this wallet's signatures.
    fn verifying_key(&self) -> VerifyingKey;

    /// Sign a UTF-8 message.
    async fn sign_message(&self, message: &str) -> std::result::Result<Signature, SignError>;
}

/// Wallet backed by an in-process Ed25519 keypair.
///
/// Whether requests are approved is a switch so headless sessions and tests
/// can exercise the decline path.
#[derive(Debug)]
pub struct LocalWallet {
    keypair: KeyPair,
    approve: AtomicBool,
    signatures: AtomicU64,
}

impl LocalWallet {
    pub fn new(keypair: KeyPair) -> Self {
        Self {
            keypair,
            approve: AtomicBool::new(true),
            signatures: AtomicU64::new(0),
        }
    }

    /// Wallet with a fresh random key.
    pub fn generate() -> Self {
        Self::new(KeyPair::generate())
    }

    /// Approve (`true`) or decline (`false`) subsequent requests.
    pub fn set_approve(&self, approve: bool) {
        self.approve.store(approve, Ordering::SeqCst);
    }

    /// Number of signatures produced so far.
    pub fn signature_count(&self) -> u64 {
        self.signatures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Wallet for LocalWallet {
    fn account(&self) -> AccountId {
        self.keypair.account_id()
    }

    fn verifying_key(&self) -> VerifyingKey {
        self.keypair.verifying_key.clone()
    }

    async fn sign_message(&self, message: &str) -> std::result::Result<Signature, SignError> {
        if !self.approve.load(Ordering::SeqCst) {
            debug!(account = %self.account(), "signature request declined");
            return Err(SignError::Declined);
        }
        self.signatures.fetch_add(1, Ordering::SeqCst);
        Ok(self.keypair.signing_key.sign(message.as_bytes()))
    }
}
