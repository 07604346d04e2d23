//! Wallet command handlers.

use std::sync::Arc;

use dmerge_crypto::ed25519::KeyPair;
use dmerge_gateway::LocalWallet;
use serde_json::{json, Value};

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Connect a local wallet.
///
/// Params (all optional): `secret_key` (hex Ed25519 secret; falls back to
/// the configured key, then to a fresh one) and `approve_signatures`
/// (default `true`; `false` makes the wallet decline every request).
pub async fn connect_wallet(state: &Arc<DaemonState>, params: &Value) -> Result {
    let secret = params
        .get("secret_key")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| Some(state.config.wallet.secret_key.clone()).filter(|s| !s.is_empty()));
    let keypair = match secret {
        Some(hex) => KeyPair::from_hex(&hex)
            .map_err(|e| RpcError::format(&format!("secret_key: {e}")))?,
        None => KeyPair::generate(),
    };

    let wallet = LocalWallet::new(keypair);
    if let Some(approve) = params.get("approve_signatures").and_then(|v| v.as_bool()) {
        wallet.set_approve(approve);
    }
    let account = state.session.connect(Arc::new(wallet)).await;
    Ok(json!({ "account": account }))
}

pub async fn disconnect_wallet(state: &Arc<DaemonState>) -> Result {
    Ok(json!({ "disconnected": state.session.disconnect().await }))
}

/// Connected account, or `null`.
pub async fn get_account(state: &Arc<DaemonState>) -> Result {
    Ok(json!({ "account": state.session.account().await }))
}
