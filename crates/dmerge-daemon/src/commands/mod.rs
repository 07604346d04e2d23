//! JSON-RPC command handlers.

pub mod diagnostics;
pub mod proposals;
pub mod reveal;
pub mod view;
pub mod wallet;

use serde_json::Value;

use crate::rpc::RpcError;

/// Read a required `u64` parameter.
pub(crate) fn param_u64(params: &Value, name: &str) -> Result<u64, RpcError> {
    params
        .get(name)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))
}

/// Read an optional text parameter. Numbers are accepted and rendered as
/// text, the way form fields arrive from front ends.
pub(crate) fn param_text(params: &Value, name: &str) -> Option<String> {
    match params.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
