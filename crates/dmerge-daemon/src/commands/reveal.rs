//! Detail view and reveal command handlers.

use std::sync::Arc;

use dmerge_reveal::{RevealOutcome, Toggle};
use dmerge_types::{BannerStatus, RevealField};
use serde_json::{json, Value};

use super::param_u64;
use crate::rpc::RpcError;
use crate::session::Busy;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Open the detail view for a proposal.
pub async fn select_proposal(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = param_u64(params, "id")?;
    let record = state.store.get(id).await.ok_or_else(|| RpcError::not_found(id))?;
    let value = serde_json::to_value(&record).map_err(|e| RpcError::internal_error(&e.to_string()))?;
    state.session.select(record).await;
    Ok(value)
}

/// Close the detail view, discarding revealed values.
pub async fn close_proposal(state: &Arc<DaemonState>) -> Result {
    Ok(json!({ "closed": state.session.close_detail().await }))
}

/// Toggle a field of the open proposal.
///
/// A shown field is hidden without signing. A hidden field is revealed
/// after the wallet signs the session message; any signing or decoding
/// failure leaves it hidden.
pub async fn reveal_field(state: &Arc<DaemonState>, params: &Value) -> Result {
    let field: RevealField = params
        .get("field")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("field required"))?
        .parse()
        .map_err(|e: String| RpcError::invalid_params(&e))?;
    let (id, toggle) = state
        .session
        .begin_toggle(field)
        .await
        .ok_or_else(|| RpcError::invalid_params("no proposal selected"))?;
    let pending = match toggle {
        Toggle::Hidden => return Ok(outcome_json(id, field, Some(RevealOutcome::Hidden))),
        Toggle::Reveal(pending) => pending,
    };

    let wallet = state.session.wallet().await;
    if wallet.is_none() {
        state
            .session
            .show_banner(BannerStatus::Error, "Please connect wallet first")
            .await;
    }

    let _busy = state
        .session
        .try_begin(Busy::Decrypting)
        .ok_or_else(|| RpcError::busy("reveal"))?;
    let decoded = pending.decode(&state.revealer, wallet).await?;
    let outcome = state.session.finish_reveal(&pending, decoded).await;
    Ok(outcome_json(id, field, outcome))
}

fn outcome_json(id: u64, field: RevealField, outcome: Option<RevealOutcome>) -> Value {
    let name = match outcome {
        Some(RevealOutcome::Revealed(_)) => "revealed",
        Some(RevealOutcome::Hidden) => "hidden",
        Some(RevealOutcome::NotRevealed) => "not_revealed",
        // The detail view was closed or reopened while signing.
        None => "discarded",
    };
    let value = outcome.and_then(RevealOutcome::value);
    json!({
        "id": id,
        "field": field,
        "outcome": name,
        "value": value,
    })
}

/// The session's signature context and the exact message signed.
pub async fn get_signature_context(state: &Arc<DaemonState>) -> Result {
    let context = state.revealer.context();
    Ok(json!({
        "context": context,
        "message": context.message(),
    }))
}
