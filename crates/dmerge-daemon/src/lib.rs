//! # dmerge-daemon
//!
//! Long-running session daemon. Owns the proposal store, the connected
//! wallet and the view model, and serves them over newline-delimited
//! JSON-RPC on a Unix socket.

pub mod commands;
pub mod config;
pub mod content;
pub mod events;
pub mod rpc;
pub mod session;

use std::sync::Arc;

use dmerge_gateway::{ContractGateway, Ledger, MemoryLedger, SqliteLedger};
use dmerge_reveal::{Revealer, SignatureContext};
use dmerge_store::ProposalStore;
use dmerge_types::events::EventType;
use dmerge_types::{unix_now, WorkflowState};
use tokio::sync::{broadcast, watch};
use tracing::warn;

use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::session::{BannerTiming, Session};

/// Environment variable overriding the daemon socket path.
pub const SOCKET_PATH_ENV: &str = "DMERGE_SOCKET_PATH";

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Configuration.
    pub config: DaemonConfig,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Proposal collection and its ledger gateway.
    pub store: ProposalStore,
    /// Signature-gated decoding for this session.
    pub revealer: Revealer,
    /// Wallet, view model and banner.
    pub session: Arc<Session>,
    /// Ledger backend name, for status reporting.
    pub ledger_backend: String,
    /// Unix time the daemon started.
    pub started_at: u64,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl DaemonState {
    /// Build the session around `ledger` and start forwarding workflow
    /// transitions to the event bus.
    ///
    /// The signature context takes its chain id from the ledger. If the
    /// ledger cannot report one, the configured chain id is used.
    pub async fn start(config: DaemonConfig, ledger: Arc<dyn Ledger>, ledger_backend: &str) -> Arc<Self> {
        let event_bus = EventBus::new(config.advanced.event_buffer);
        let chain_id = match ledger.chain_id().await {
            Ok(chain_id) => {
                if chain_id != config.chain.chain_id {
                    warn!(ledger = chain_id, configured = config.chain.chain_id, "chain id mismatch, using ledger's");
                }
                chain_id
            }
            Err(e) => {
                warn!("chain id unavailable, using configured: {e}");
                config.chain.chain_id
            }
        };
        let context = SignatureContext::for_session(ledger.address(), chain_id);
        let store = ProposalStore::new(ContractGateway::new(ledger))
            .with_max_write_retries(config.advanced.max_write_retries);
        let revealer = Revealer::new(Arc::new(context)).with_delay(config.ui.reveal_delay());
        let timing = BannerTiming {
            success: config.ui.success_banner(),
            error: config.ui.error_banner(),
        };
        let session = Arc::new(Session::new(event_bus.clone(), timing));
        let (shutdown_tx, _) = broadcast::channel(1);

        forward_workflow(store.load_workflow().subscribe(), &event_bus, EventType::LoadStateChanged);
        forward_workflow(store.create_workflow().subscribe(), &event_bus, EventType::CreateStateChanged);
        forward_workflow(revealer.workflow().subscribe(), &event_bus, EventType::RevealStateChanged);

        Arc::new(Self {
            config,
            event_bus,
            store,
            revealer,
            session,
            ledger_backend: ledger_backend.to_string(),
            started_at: unix_now(),
            shutdown_tx,
        })
    }
}

/// Open the ledger backend named in the configuration.
pub fn open_ledger(config: &DaemonConfig) -> anyhow::Result<Arc<dyn Ledger>> {
    let address = config.chain.contract_address.clone();
    let ledger: Arc<dyn Ledger> = match config.ledger.backend.as_str() {
        "memory" => Arc::new(MemoryLedger::new(address).with_chain_id(config.chain.chain_id)),
        "sqlite" => Arc::new(SqliteLedger::open(&config.ledger_path(), address)?),
        other => anyhow::bail!("unknown ledger backend '{other}'"),
    };
    Ok(ledger)
}

fn forward_workflow(mut rx: watch::Receiver<WorkflowState>, bus: &EventBus, event_type: EventType) {
    let bus = bus.clone();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            bus.publish(event_type, serde_json::to_value(&state).unwrap_or_default());
        }
    });
}
