//! Typed client for the daemon's JSON-RPC methods.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use dmerge_types::events::Event;
use dmerge_types::view::{FaqEntry, Partner, ViewState};
use dmerge_types::{DashboardSummary, ProposalRecord, RevealField, Tab};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tracing::debug;

use crate::ipc::{self, IpcBridgeError};

/// Client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Ipc(#[from] IpcBridgeError),

    /// The daemon answered with a JSON-RPC error object.
    #[error("daemon error {code} {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// The result did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// JSON-RPC error code, if the daemon returned one.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Connects per call, like the daemon's other clients.
pub struct DaemonClient {
    socket_path: PathBuf,
    next_id: AtomicU64,
}

impl DaemonClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Client for the socket named by the environment.
    pub fn from_env() -> Self {
        Self::new(crate::resolve_socket_path())
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    fn request(&self, method: &str, params: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        })
    }

    /// Call `method` and return its raw result.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let response = ipc::send_rpc_request(&self.socket_path, &self.request(method, params)).await?;
        into_result(response)
    }

    /// Call `method` and deserialize its result.
    pub async fn call_as<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn status(&self) -> Result<Value> {
        self.call("get_status", Value::Null).await
    }

    /// Reload proposals; returns the record count.
    pub async fn refresh(&self) -> Result<usize> {
        let value = self.call("refresh_proposals", Value::Null).await?;
        field_as(&value, "count")
    }

    pub async fn list_proposals(&self) -> Result<Vec<ProposalRecord>> {
        self.call_as("list_proposals", Value::Null).await
    }

    pub async fn get_proposal(&self, id: u64) -> Result<ProposalRecord> {
        self.call_as("get_proposal", json!({ "id": id })).await
    }

    /// Submit a proposal from form text.
    pub async fn create_proposal(&self, name: &str, treasury: &str, activity: &str) -> Result<ProposalRecord> {
        self.call_as(
            "create_proposal",
            json!({ "name": name, "treasury": treasury, "activity": activity }),
        )
        .await
    }

    /// Connect a wallet; returns the account id.
    pub async fn connect_wallet(&self, secret_key: Option<&str>, approve_signatures: bool) -> Result<String> {
        let mut params = json!({ "approve_signatures": approve_signatures });
        if let Some(secret) = secret_key {
            params["secret_key"] = json!(secret);
        }
        let value = self.call("connect_wallet", params).await?;
        field_as(&value, "account")
    }

    pub async fn disconnect_wallet(&self) -> Result<bool> {
        let value = self.call("disconnect_wallet", Value::Null).await?;
        field_as(&value, "disconnected")
    }

    pub async fn select_proposal(&self, id: u64) -> Result<ProposalRecord> {
        self.call_as("select_proposal", json!({ "id": id })).await
    }

    pub async fn close_proposal(&self) -> Result<bool> {
        let value = self.call("close_proposal", Value::Null).await?;
        field_as(&value, "closed")
    }

    /// Toggle a field of the open proposal. Returns the outcome object
    /// (`outcome` is one of revealed, hidden, not_revealed, discarded).
    pub async fn reveal_field(&self, field: RevealField) -> Result<Value> {
        self.call("reveal_field", json!({ "field": field })).await
    }

    /// Toggle `field` of proposal `id`, opening it first unless it is
    /// already the open record. Reopening would drop values already shown.
    pub async fn toggle_field(&self, id: u64, field: RevealField) -> Result<Value> {
        if self.view().await?.selected != Some(id) {
            self.select_proposal(id).await?;
        }
        self.reveal_field(field).await
    }

    pub async fn analysis(&self, id: Option<u64>) -> Result<Value> {
        let params = id.map(|id| json!({ "id": id })).unwrap_or(Value::Null);
        self.call("get_analysis", params).await
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        self.call_as("get_dashboard", Value::Null).await
    }

    pub async fn view(&self) -> Result<ViewState> {
        self.call_as("get_view", Value::Null).await
    }

    pub async fn set_tab(&self, tab: Tab) -> Result<()> {
        self.call("set_tab", json!({ "tab": tab })).await.map(|_| ())
    }

    pub async fn faq(&self) -> Result<Vec<FaqEntry>> {
        self.call_as("get_faq", Value::Null).await
    }

    pub async fn partners(&self) -> Result<Vec<Partner>> {
        self.call_as("get_partners", Value::Null).await
    }

    /// Open a dedicated connection subscribed to events.
    pub async fn subscribe(&self, categories: Option<Vec<String>>) -> Result<EventStream> {
        let stream = ipc::connect(&self.socket_path).await?;
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        let params = json!({ "filter": { "categories": categories } });
        ipc::write_request(&mut writer, &self.request("subscribe_events", params)).await?;
        let line = next_line(&mut lines).await?.ok_or(IpcBridgeError::DaemonDisconnected)?;
        let result = into_result(ipc::parse_line(&line)?)?;
        let subscription_id = field_as(&result, "subscription_id")?;
        debug!(%subscription_id, "subscribed to daemon events");

        Ok(EventStream {
            subscription_id,
            lines,
            _writer: writer,
        })
    }
}

/// Events pushed on a subscribed connection.
pub struct EventStream {
    subscription_id: String,
    lines: Lines<BufReader<OwnedReadHalf>>,
    // Dropping the write half would half-close the connection.
    _writer: OwnedWriteHalf,
}

impl EventStream {
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Next event, or `None` once the daemon closes the connection.
    pub async fn next_event(&mut self) -> Result<Option<Event>> {
        while let Some(line) = next_line(&mut self.lines).await? {
            let message = ipc::parse_line(&line)?;
            if message.get("method").and_then(|m| m.as_str()) != Some("event") {
                continue;
            }
            let event = serde_json::from_value(message["params"].clone())
                .map_err(|e| ClientError::Decode(e.to_string()))?;
            return Ok(Some(event));
        }
        Ok(None)
    }
}

async fn next_line(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> Result<Option<String>> {
    lines
        .next_line()
        .await
        .map_err(|e| ClientError::Ipc(IpcBridgeError::ReadFailed(e.to_string())))
}

/// Split a JSON-RPC response into its result or error.
fn into_result(response: Value) -> Result<Value> {
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        return Err(ClientError::Rpc {
            code: error.get("code").and_then(|c| c.as_i64()).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or_default()
                .to_string(),
            data: error.get("data").cloned(),
        });
    }
    Ok(response.get("result").cloned().unwrap_or(Value::Null))
}

fn field_as<T: DeserializeOwned>(value: &Value, name: &str) -> Result<T> {
    let field = value
        .get(name)
        .cloned()
        .ok_or_else(|| ClientError::Decode(format!("missing field '{name}'")))?;
    serde_json::from_value(field).map_err(|e| ClientError::Decode(e.to_string()))
}
