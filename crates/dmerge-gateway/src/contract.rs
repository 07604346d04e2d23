//! Read-only and signer-bound contract handles.

use std::sync::Arc;

use dmerge_types::AccountId;
use tracing::{debug, info, warn};

use crate::wallet::{SignError, Wallet};
use crate::{GatewayError, Ledger, Result, Slot, TransactionCause, WriteReceipt};

/// Entry point handing out contract handles over one ledger.
#[derive(Clone)]
pub struct ContractGateway {
    ledger: Arc<dyn Ledger>,
}

impl ContractGateway {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Contract address the slots live under.
    pub fn address(&self) -> String {
        self.ledger.address()
    }

    /// Handle usable without a wallet.
    pub fn read_only(&self) -> ReadOnlyContract {
        ReadOnlyContract {
            ledger: self.ledger.clone(),
        }
    }

    /// Handle bound to the connected wallet. Fails with
    /// [`GatewayError::Connection`] when no wallet is connected.
    pub fn with_signer(&self, wallet: Option<Arc<dyn Wallet>>) -> Result<SignedContract> {
        let wallet = wallet.ok_or(GatewayError::Connection)?;
        Ok(SignedContract {
            ledger: self.ledger.clone(),
            wallet,
        })
    }
}

/// Read access to the ledger.
#[derive(Clone)]
pub struct ReadOnlyContract {
    ledger: Arc<dyn Ledger>,
}

impl ReadOnlyContract {
    /// Liveness probe. Any failure reads as "not available".
    pub async fn check_available(&self) -> bool {
        match self.ledger.is_available().await {
            Ok(available) => available,
            Err(e) => {
                warn!("availability probe failed: {e}");
                false
            }
        }
    }

    /// Raw bytes of a slot; empty means no data yet.
    pub async fn load(&self, key: &str) -> Result<Slot> {
        let slot = self.ledger.get_data(key).await?;
        debug!(key, version = slot.version, size = slot.bytes.len(), "slot loaded");
        Ok(slot)
    }
}

/// Read/write access bound to a connected wallet.
#[derive(Clone)]
pub struct SignedContract {
    ledger: Arc<dyn Ledger>,
    wallet: Arc<dyn Wallet>,
}

impl SignedContract {
    /// Account writes are attributed to.
    pub fn account(&self) -> AccountId {
        self.wallet.account()
    }

    pub async fn load(&self, key: &str) -> Result<Slot> {
        self.ledger.get_data(key).await
    }

    /// Overwrite a slot.
    ///
    /// The wallet signs a transaction message naming the slot, the version
    /// the caller read, and the content hash; a refusal becomes
    /// [`TransactionCause::Declined`].
    pub async fn save(&self, key: &str, bytes: &[u8], expected_version: u64) -> Result<WriteReceipt> {
        let message = transaction_message(key, expected_version, bytes);

        let signature = self.wallet.sign_message(&message).await.map_err(|e| match e {
            SignError::Declined => GatewayError::Transaction(TransactionCause::Declined),
            SignError::Failed(msg) => GatewayError::Transaction(TransactionCause::Other(msg)),
        })?;
        self.wallet
            .verifying_key()
            .verify(message.as_bytes(), &signature)
            .map_err(|e| GatewayError::Transaction(TransactionCause::Other(e.to_string())))?;

        let account = self.wallet.account();
        let receipt = self
            .ledger
            .set_data(key, bytes, expected_version, &account)
            .await?;
        info!(
            key,
            version = receipt.version,
            writer = %receipt.writer,
            tx = %receipt.tx_id(),
            "slot saved"
        );
        Ok(receipt)
    }
}

/// Message signed to authorize a slot write.
pub fn transaction_message(key: &str, expected_version: u64, bytes: &[u8]) -> String {
    format!(
        "setData\nkey:{key}\nbaseVersion:{expected_version}\ncontentHash:0x{}",
        hex::encode(blake3::hash(bytes).as_bytes())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocalWallet, MemoryLedger};

    fn gateway() -> (ContractGateway, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new("0x5fbdb2315678afecb367f032d93f642f64180aa3"));
        (ContractGateway::new(ledger.clone()), ledger)
    }

    #[test]
    fn test_signer_requires_wallet() {
        let (gw, _) = gateway();
        assert!(matches!(gw.with_signer(None), Err(GatewayError::Connection)));
    }

    #[tokio::test]
    async fn test_read_only_load_empty() {
        let (gw, _) = gateway();
        let slot = gw.read_only().load("mergers").await.expect("load");
        assert!(slot.bytes.is_empty());
        assert_eq!(slot.version, 0);
        assert!(gw.read_only().check_available().await);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let (gw, _) = gateway();
        let wallet = Arc::new(LocalWallet::generate());
        let signed = gw.with_signer(Some(wallet.clone())).expect("signer");

        let receipt = signed.save("mergers", b"[]", 0).await.expect("save");
        assert_eq!(receipt.version, 1);
        assert_eq!(receipt.writer, wallet.account());
        assert_eq!(wallet.signature_count(), 1);

        let slot = gw.read_only().load("mergers").await.expect("load");
        assert_eq!(slot.bytes, b"[]");
        assert_eq!(slot.version, 1);
    }

    #[tokio::test]
    async fn test_declined_save() {
        let (gw, ledger) = gateway();
        let wallet = Arc::new(LocalWallet::generate());
        wallet.set_approve(false);
        let signed = gw.with_signer(Some(wallet)).expect("signer");

        let err = signed.save("mergers", b"[]", 0).await.expect_err("declined");
        assert!(err.is_declined());
        assert_eq!(ledger.get_data("mergers").await.expect("get").version, 0);
    }

    #[tokio::test]
    async fn test_unavailable_probe_is_false() {
        let (gw, ledger) = gateway();
        ledger.set_available(false);
        assert!(!gw.read_only().check_available().await);
    }

    #[test]
    fn test_transaction_message_shape() {
        let msg = transaction_message("mergers", 3, b"[]");
        let lines: Vec<&str> = msg.lines().collect();
        assert_eq!(lines[0], "setData");
        assert_eq!(lines[1], "key:mergers");
        assert_eq!(lines[2], "baseVersion:3");
        assert!(lines[3].starts_with("contentHash:0x"));
        assert_eq!(lines[3].len(), "contentHash:0x".len() + 64);
    }
}
