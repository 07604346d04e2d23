//! Proposal command handlers: load, list, create, analysis.

use std::sync::Arc;

use dmerge_analysis::BarWidths;
use dmerge_store::StoreError;
use dmerge_types::events::EventType;
use dmerge_types::{BannerStatus, ProposalDraft};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{param_text, param_u64};
use crate::rpc::RpcError;
use crate::session::Busy;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Probe the contract and reload the collection, reporting through the
/// banner. A failed load keeps the previous collection.
pub async fn load(state: &Arc<DaemonState>) -> std::result::Result<usize, StoreError> {
    let contract = state.store.gateway().read_only();
    if contract.check_available().await {
        state
            .session
            .show_banner(BannerStatus::Success, "Contract is available!")
            .await;
    }

    match state.store.refresh().await {
        Ok(count) => {
            state.event_bus.publish(
                EventType::ProposalsRefreshed,
                json!({ "count": count, "version": state.store.version().await }),
            );
            Ok(count)
        }
        Err(e) => {
            state
                .session
                .show_banner(BannerStatus::Error, "Failed to load data")
                .await;
            Err(e)
        }
    }
}

/// Reload proposals from the ledger.
pub async fn refresh_proposals(state: &Arc<DaemonState>) -> Result {
    let _busy = state
        .session
        .try_begin(Busy::Refreshing)
        .ok_or_else(|| RpcError::busy("refresh"))?;
    let count = load(state).await?;
    Ok(json!({
        "count": count,
        "version": state.store.version().await,
    }))
}

/// List cached proposals in stored order.
pub async fn list_proposals(state: &Arc<DaemonState>) -> Result {
    serde_json::to_value(state.store.records().await)
        .map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Get one proposal by id.
pub async fn get_proposal(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = param_u64(params, "id")?;
    let record = state.store.get(id).await.ok_or_else(|| RpcError::not_found(id))?;
    serde_json::to_value(record).map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Submit a new proposal.
///
/// Fields come from `params` (`name`, `treasury`, `activity`) when given,
/// otherwise from the create-modal draft.
pub async fn create_proposal(state: &Arc<DaemonState>, params: &Value) -> Result {
    let draft = match draft_from_params(params) {
        Some(draft) => draft,
        None => state.session.draft().await,
    };
    if !draft.is_submittable() {
        return Err(RpcError::invalid_params("name, treasury and activity are required"));
    }

    let Some(wallet) = state.session.wallet().await else {
        state
            .session
            .show_banner(BannerStatus::Error, "Please connect wallet first")
            .await;
        return Err(RpcError::connection("Please connect wallet first"));
    };

    let _busy = state
        .session
        .try_begin(Busy::Creating)
        .ok_or_else(|| RpcError::busy("create"))?;
    state
        .session
        .show_banner(BannerStatus::Pending, "Creating merger proposal...")
        .await;

    match state.store.create_from_draft(&draft, Some(wallet)).await {
        Ok(record) => {
            info!(id = record.id, "proposal submitted");
            state
                .session
                .show_banner(BannerStatus::Success, "Merger created successfully!")
                .await;
            state.session.finish_create().await;
            let value =
                serde_json::to_value(&record).map_err(|e| RpcError::internal_error(&e.to_string()))?;
            state.event_bus.publish(EventType::ProposalCreated, value.clone());
            Ok(value)
        }
        Err(e) => {
            warn!("proposal submission failed: {e}");
            state
                .session
                .show_banner(BannerStatus::Error, submission_failure_message(&e))
                .await;
            Err(e.into())
        }
    }
}

fn draft_from_params(params: &Value) -> Option<ProposalDraft> {
    let name = param_text(params, "name");
    let treasury = param_text(params, "treasury");
    let activity = param_text(params, "activity");
    if name.is_none() && treasury.is_none() && activity.is_none() {
        return None;
    }
    Some(ProposalDraft {
        name: name.unwrap_or_default(),
        treasury: treasury.unwrap_or_default(),
        activity: activity.unwrap_or_default(),
    })
}

fn submission_failure_message(e: &StoreError) -> String {
    match e {
        _ if e.is_declined() => "Transaction rejected by user".to_string(),
        StoreError::Transaction(cause) => format!("Submission failed: {cause}"),
        other => format!("Submission failed: {other}"),
    }
}

/// Merger scores for a proposal (default: the open one).
pub async fn get_analysis(state: &Arc<DaemonState>, params: &Value) -> Result {
    let detail = state.session.detail().await;
    let id = match params.get("id").and_then(|v| v.as_u64()) {
        Some(id) => id,
        None => detail
            .as_ref()
            .map(|d| d.record().id)
            .ok_or_else(|| RpcError::invalid_params("id required when no proposal is open"))?,
    };
    let record = state.store.get(id).await.ok_or_else(|| RpcError::not_found(id))?;
    let cache = detail
        .filter(|d| d.record().id == id)
        .map(|d| d.cache());

    let analysis = dmerge_analysis::analyze_record(&record, cache.as_ref());
    Ok(json!({
        "id": id,
        "analysis": analysis,
        "bars": BarWidths::from(analysis),
    }))
}

/// Dashboard aggregates over the collection.
pub async fn get_dashboard(state: &Arc<DaemonState>) -> Result {
    let records = state.store.records().await;
    let detail = state.session.detail().await;
    let open = detail.as_ref().map(|d| (d.record().id, d.cache()));
    let summary = dmerge_analysis::summarize(&records, open.as_ref().map(|(id, c)| (*id, c)));
    serde_json::to_value(summary).map_err(|e| RpcError::internal_error(&e.to_string()))
}
