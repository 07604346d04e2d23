//! Navigation command handlers.

use std::sync::Arc;

use dmerge_types::Tab;
use serde_json::{json, Value};

use crate::content;
use crate::rpc::RpcError;
use crate::session::DraftPatch;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

fn to_value(value: impl serde::Serialize) -> Result {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Switch the active tab.
pub async fn set_tab(state: &Arc<DaemonState>, params: &Value) -> Result {
    let tab: Tab = params
        .get("tab")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("tab required"))?
        .parse()
        .map_err(|e: String| RpcError::invalid_params(&e))?;
    state.session.set_tab(tab).await;
    Ok(json!({ "active_tab": tab }))
}

/// Current view snapshot.
pub async fn get_view(state: &Arc<DaemonState>) -> Result {
    to_value(state.session.view().await)
}

pub async fn open_create_modal(state: &Arc<DaemonState>) -> Result {
    state.session.set_create_modal(true).await;
    Ok(json!({ "show_create_modal": true }))
}

pub async fn close_create_modal(state: &Arc<DaemonState>) -> Result {
    state.session.set_create_modal(false).await;
    Ok(json!({ "show_create_modal": false }))
}

/// Update any of the draft's `name`, `treasury`, `activity` fields.
pub async fn update_draft(state: &Arc<DaemonState>, params: &Value) -> Result {
    let patch = DraftPatch {
        name: super::param_text(params, "name"),
        treasury: super::param_text(params, "treasury"),
        activity: super::param_text(params, "activity"),
    };
    let draft = state.session.update_draft(patch).await;
    Ok(json!({
        "draft": draft,
        "submittable": draft.is_submittable(),
    }))
}

pub async fn get_faq(_state: &Arc<DaemonState>) -> Result {
    to_value(content::faq())
}

pub async fn get_partners(_state: &Arc<DaemonState>) -> Result {
    to_value(content::partners())
}
