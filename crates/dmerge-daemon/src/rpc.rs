//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! JSON-RPC method calls to the appropriate command handlers. A connection
//! that calls `subscribe_events` additionally receives matching events as
//! `"event"` notifications interleaved with its responses.

use std::path::PathBuf;
use std::sync::Arc;

use dmerge_gateway::TransactionCause;
use dmerge_reveal::RevealError;
use dmerge_store::StoreError;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::events::EventFilter;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    /// Error name.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    fn new(code: i32, message: &str, detail: Option<String>) -> Self {
        Self {
            code,
            message: message.to_string(),
            data: detail.map(|d| serde_json::json!({ "detail": d })),
        }
    }

    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self::new(-32700, "PARSE_ERROR", None)
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self::new(-32600, "INVALID_REQUEST", None)
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({ "method": method })),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self::new(-32602, "INVALID_PARAMS", Some(detail.to_string()))
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self::new(-32603, "INTERNAL_ERROR", Some(detail.to_string()))
    }

    // Application errors

    /// No wallet connected, or the ledger could not be reached (-32010).
    pub fn connection(detail: &str) -> Self {
        Self::new(-32010, "CONNECTION_ERROR", Some(detail.to_string()))
    }

    /// Write failed (-32020).
    pub fn transaction(detail: &str) -> Self {
        Self::new(-32020, "TRANSACTION_ERROR", Some(detail.to_string()))
    }

    /// The account holder refused to sign (-32021).
    pub fn transaction_declined() -> Self {
        Self::new(-32021, "TRANSACTION_DECLINED", Some("user rejected transaction".to_string()))
    }

    /// The slot kept moving after every retry (-32022).
    pub fn transaction_conflict(detail: &str) -> Self {
        Self::new(-32022, "TRANSACTION_CONFLICT", Some(detail.to_string()))
    }

    /// A stored value could not be decoded (-32030).
    pub fn format(detail: &str) -> Self {
        Self::new(-32030, "FORMAT_ERROR", Some(detail.to_string()))
    }

    /// A reveal was attempted without a wallet (-32040).
    pub fn auth(detail: &str) -> Self {
        Self::new(-32040, "AUTH_ERROR", Some(detail.to_string()))
    }

    /// The control is already running (-32050).
    pub fn busy(control: &str) -> Self {
        Self::new(-32050, "BUSY", Some(format!("{control} already in progress")))
    }

    /// No record with the requested id (-32060).
    pub fn not_found(id: u64) -> Self {
        Self {
            code: -32060,
            message: "NOT_FOUND".to_string(),
            data: Some(serde_json::json!({ "id": id })),
        }
    }
}

impl From<StoreError> for RpcError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Connection => Self::connection(&e.to_string()),
            StoreError::Transaction(TransactionCause::Declined) => Self::transaction_declined(),
            StoreError::Transaction(ref cause @ TransactionCause::Conflict { .. }) => {
                Self::transaction_conflict(&cause.to_string())
            }
            StoreError::Transaction(TransactionCause::Other(ref msg)) => Self::transaction(msg),
            StoreError::Load(ref msg) => Self::connection(msg),
            StoreError::Serialization(ref msg) => Self::internal_error(msg),
        }
    }
}

impl From<RevealError> for RpcError {
    fn from(e: RevealError) -> Self {
        match e {
            RevealError::Auth => Self::auth(&e.to_string()),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

struct Subscription {
    rx: broadcast::Receiver<dmerge_types::events::Event>,
    filter: EventFilter,
}

enum Incoming {
    Line(Option<String>),
    Event(Result<dmerge_types::events::Event, broadcast::error::RecvError>),
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    // `next_line` is cancel safe, so a pending read survives an event wakeup.
    let mut lines = BufReader::new(reader).lines();
    let mut subscription: Option<Subscription> = None;

    loop {
        let incoming = match subscription.as_mut() {
            Some(sub) => tokio::select! {
                line = lines.next_line() => Incoming::Line(line?),
                event = sub.rx.recv() => Incoming::Event(event),
            },
            None => Incoming::Line(lines.next_line().await?),
        };

        let line = match incoming {
            Incoming::Line(Some(line)) => line,
            Incoming::Line(None) => break, // EOF
            Incoming::Event(Ok(event)) => {
                if subscription.as_ref().is_some_and(|sub| sub.filter.matches(&event)) {
                    let note = serde_json::json!({
                        "jsonrpc": "2.0",
                        "method": "event",
                        "params": event,
                    });
                    write_line(&mut writer, &note).await?;
                }
                continue;
            }
            Incoming::Event(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                warn!(skipped, "event subscriber lagged");
                continue;
            }
            Incoming::Event(Err(broadcast::error::RecvError::Closed)) => {
                subscription = None;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) if request.jsonrpc != "2.0" => {
                RpcResponse::error(request.id, RpcError::invalid_request())
            }
            Ok(request) if request.method == "subscribe_events" => {
                match commands::diagnostics::subscribe_events(&state, &request.params).await {
                    Ok((result, filter)) => {
                        subscription = Some(Subscription {
                            rx: state.event_bus.subscribe(),
                            filter,
                        });
                        RpcResponse::success(request.id, result)
                    }
                    Err(err) => RpcResponse::error(request.id, err),
                }
            }
            Ok(request) => dispatch_request(state.clone(), request).await,
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        write_line(&mut writer, &response).await?;
    }

    Ok(())
}

async fn write_line(writer: &mut OwnedWriteHalf, message: &impl Serialize) -> anyhow::Result<()> {
    let mut json = serde_json::to_string(message)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();
    let params = &request.params;

    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        // Proposals
        "refresh_proposals" => commands::proposals::refresh_proposals(&state).await,
        "list_proposals" => commands::proposals::list_proposals(&state).await,
        "get_proposal" => commands::proposals::get_proposal(&state, params).await,
        "create_proposal" => commands::proposals::create_proposal(&state, params).await,
        "get_analysis" => commands::proposals::get_analysis(&state, params).await,
        "get_dashboard" => commands::proposals::get_dashboard(&state).await,

        // Wallet
        "connect_wallet" => commands::wallet::connect_wallet(&state, params).await,
        "disconnect_wallet" => commands::wallet::disconnect_wallet(&state).await,
        "get_account" => commands::wallet::get_account(&state).await,

        // Detail view and reveal
        "select_proposal" => commands::reveal::select_proposal(&state, params).await,
        "close_proposal" => commands::reveal::close_proposal(&state).await,
        "reveal_field" => commands::reveal::reveal_field(&state, params).await,
        "get_signature_context" => commands::reveal::get_signature_context(&state).await,

        // Navigation
        "set_tab" => commands::view::set_tab(&state, params).await,
        "get_view" => commands::view::get_view(&state).await,
        "open_create_modal" => commands::view::open_create_modal(&state).await,
        "close_create_modal" => commands::view::close_create_modal(&state).await,
        "update_draft" => commands::view::update_draft(&state, params).await,
        "get_faq" => commands::view::get_faq(&state).await,
        "get_partners" => commands::view::get_partners(&state).await,

        // Diagnostics
        "get_status" => commands::diagnostics::get_status(&state).await,
        "subscribe_events" => Err(RpcError::invalid_request()),

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}
