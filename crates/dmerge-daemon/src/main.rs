//! dmerge-daemon: the merger proposal session daemon.
//!
//! Single OS process running a Tokio async runtime. Front ends talk to it
//! via JSON-RPC over a Unix socket.

use std::path::PathBuf;
use std::sync::Arc;

use dmerge_daemon::commands;
use dmerge_daemon::config::DaemonConfig;
use dmerge_daemon::rpc::RpcServer;
use dmerge_daemon::{open_ledger, DaemonState, SOCKET_PATH_ENV};
use dmerge_types::events::EventType;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("dmerge={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("dmerge daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open ledger
    let ledger = open_ledger(&config)?;
    info!(backend = %config.ledger.backend, address = %ledger.address(), "ledger opened");

    // 3. Build daemon state
    let backend = config.ledger.backend.clone();
    let auto_connect = config.wallet.auto_connect;
    let state = DaemonState::start(config, ledger, &backend).await;

    if auto_connect {
        let connected = commands::wallet::connect_wallet(&state, &serde_json::Value::Null).await;
        if let Err(e) = connected {
            warn!("auto-connect failed: {:?}", e);
        }
    }

    // 4. Initial load; failures only show a banner
    if let Err(e) = commands::proposals::load(&state).await {
        warn!("initial load failed: {e}");
    }

    // 5. Start IPC server
    let socket_path = std::env::var(SOCKET_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state.config.socket_path());
    let rpc_server = RpcServer::new(Arc::clone(&state), socket_path.clone());

    state.event_bus.publish(
        EventType::DaemonStatus,
        serde_json::json!({
            "status": "started",
            "version": env!("CARGO_PKG_VERSION"),
        }),
    );

    // 6. Run the RPC server until shutdown
    let mut shutdown_rx = state.shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    info!("Daemon shutting down gracefully");
    let _ = std::fs::remove_file(&socket_path);
    info!("Daemon stopped");
    Ok(())
}
