//! Status and event subscription handlers.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::events::EventFilter;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Daemon and ledger status.
pub async fn get_status(state: &Arc<DaemonState>) -> Result {
    let available = state.store.gateway().read_only().check_available().await;
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "contract_address": state.store.gateway().address(),
        "chain_id": state.revealer.context().chain_id,
        "ledger_backend": state.ledger_backend,
        "available": available,
        "proposals": state.store.len().await,
        "slot_version": state.store.version().await,
        "account": state.session.account().await,
        "event_sequence": state.event_bus.sequence(),
        "uptime_secs": dmerge_types::unix_now().saturating_sub(state.started_at),
    }))
}

/// Subscribe the calling connection to daemon events.
///
/// Params: optional `filter` object, e.g. `{"categories": ["data"]}`.
/// The connection loop owns the receiver; this only validates the filter.
pub async fn subscribe_events(
    _state: &Arc<DaemonState>,
    params: &Value,
) -> std::result::Result<(Value, EventFilter), RpcError> {
    let filter = match params.get("filter") {
        Some(raw) if !raw.is_null() => serde_json::from_value::<EventFilter>(raw.clone())
            .map_err(|e| RpcError::invalid_params(&format!("filter: {e}")))?,
        _ => EventFilter::default(),
    };

    let mut sub_id = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut sub_id);

    Ok((json!({ "subscription_id": hex::encode(sub_id) }), filter))
}
