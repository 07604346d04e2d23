//! Integration tests for the dmerge workspace.
//!
//! The tests under `tests/` exercise end-to-end flows across the library
//! crates and the daemon, in process. This library only holds shared
//! fixtures.
//!
//! ```sh
//! cargo test -p dmerge-integration-tests
//! ```

use std::sync::Arc;

use dmerge_daemon::config::DaemonConfig;
use dmerge_daemon::rpc::{dispatch_request, RpcRequest, RpcResponse};
use dmerge_daemon::DaemonState;
use dmerge_gateway::{Ledger, MemoryLedger};
use tempfile::TempDir;

/// Contract address used by every fixture.
pub const TEST_CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";

/// Daemon configuration for tests: in-memory ledger, no reveal delay.
pub fn test_config() -> DaemonConfig {
    let mut config = DaemonConfig::default();
    config.ledger.backend = "memory".to_string();
    config.ui.reveal_delay_ms = 0;
    config
}

/// Daemon state over a fresh in-memory ledger. Returns the ledger too so
/// tests can inject failures.
pub async fn test_daemon() -> (Arc<DaemonState>, Arc<MemoryLedger>) {
    test_daemon_with(test_config()).await
}

/// Like [`test_daemon`] with a custom configuration.
pub async fn test_daemon_with(config: DaemonConfig) -> (Arc<DaemonState>, Arc<MemoryLedger>) {
    let ledger = Arc::new(MemoryLedger::new(TEST_CONTRACT).with_chain_id(config.chain.chain_id));
    let state = DaemonState::start(config, ledger.clone() as Arc<dyn Ledger>, "memory").await;
    (state, ledger)
}

/// Dispatch one JSON-RPC call in process.
pub async fn call(state: &Arc<DaemonState>, method: &str, params: serde_json::Value) -> RpcResponse {
    let request = RpcRequest {
        jsonrpc: "2.0".to_string(),
        id: serde_json::json!(1),
        method: method.to_string(),
        params,
    };
    dispatch_request(Arc::clone(state), request).await
}

/// Result of a call that must succeed.
pub async fn call_ok(state: &Arc<DaemonState>, method: &str, params: serde_json::Value) -> serde_json::Value {
    let response = call(state, method, params).await;
    assert!(response.error.is_none(), "{method} failed: {:?}", response.error);
    response.result.unwrap_or_default()
}

/// Error code of a call that must fail.
pub async fn call_err(state: &Arc<DaemonState>, method: &str, params: serde_json::Value) -> i32 {
    let response = call(state, method, params).await;
    assert!(response.result.is_none(), "{method} unexpectedly succeeded: {:?}", response.result);
    response.error.expect("error object").code
}

/// Fresh temporary directory, removed with everything in it on drop.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("temp dir")
}
