//! # dmerge-reveal
//!
//! Signature-gated decoding of proposal fields for display.
//!
//! Revealing a field asks the connected wallet to sign the session's
//! [`SignatureContext`] message; only a verified signature unlocks the
//! codec decode. Failures of any kind (declined signature, malformed token,
//! wallet fault) degrade to "not revealed" rather than an error. Revealing
//! an already revealed field hides it again without another signature.
//!
//! The signature authorizes display only; it does not protect the stored
//! tokens, which remain readable by anyone (see `dmerge_crypto::codec`).

pub mod context;
pub mod detail;

use std::sync::Arc;
use std::time::Duration;

use dmerge_crypto::codec;
use dmerge_gateway::Wallet;
use dmerge_store::Workflow;
use tracing::{debug, info, warn};

pub use context::SignatureContext;
pub use detail::{DecodedCache, DetailView, PendingReveal, RevealOutcome, Toggle};

/// Delay between a successful signature and the decode in interactive sessions.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(1500);

/// Reveal error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RevealError {
    /// A reveal was attempted with no wallet connected.
    #[error("Please connect wallet first")]
    Auth,
}

pub type Result<T> = std::result::Result<T, RevealError>;

/// Performs the sign-then-decode step for one session.
pub struct Revealer {
    context: Arc<SignatureContext>,
    delay: Duration,
    workflow: Workflow,
}

impl Revealer {
    pub fn new(context: Arc<SignatureContext>) -> Self {
        Self {
            context,
            delay: DEFAULT_REVEAL_DELAY,
            workflow: Workflow::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn context(&self) -> &SignatureContext {
        &self.context
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Sign the session message and decode `token`.
    ///
    /// `Err(Auth)` without a wallet; `Ok(None)` for every other failure.
    pub async fn decode_with_signature(
        &self,
        token: &str,
        wallet: Option<Arc<dyn Wallet>>,
    ) -> Result<Option<f64>> {
        let wallet = wallet.ok_or(RevealError::Auth)?;
        self.workflow.begin();

        let message = self.context.message();
        let signature = match wallet.sign_message(&message).await {
            Ok(signature) => signature,
            Err(e) => {
                info!("reveal not authorized: {e}");
                self.workflow.fail(e.to_string());
                return Ok(None);
            }
        };
        if let Err(e) = wallet.verifying_key().verify(message.as_bytes(), &signature) {
            warn!("reveal signature rejected: {e}");
            self.workflow.fail(e.to_string());
            return Ok(None);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match codec::decode(token) {
            Ok(value) => {
                debug!(account = %wallet.account(), "field revealed");
                self.workflow.succeed();
                Ok(Some(value))
            }
            Err(e) => {
                warn!("stored token could not be decoded: {e}");
                self.workflow.fail(e.to_string());
                Ok(None)
            }
        }
    }
}
