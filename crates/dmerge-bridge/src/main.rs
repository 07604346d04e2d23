//! dmerge-cli: drive a running dmerge daemon from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dmerge_bridge::DaemonClient;
use dmerge_types::{RevealField, Tab};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "dmerge-cli")]
#[command(version)]
#[command(about = "Command-line client for the dmerge daemon")]
struct Cli {
    /// Daemon socket (default: $DMERGE_SOCKET_PATH, then $DMERGE_DATA_DIR/daemon.sock)
    #[arg(short, long)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show daemon and ledger status
    Status,
    /// Reload proposals from the ledger
    Refresh,
    /// List proposals
    List,
    /// Connect a wallet
    Connect {
        /// Hex-encoded Ed25519 secret key
        #[arg(long)]
        secret_key: Option<String>,
        /// Decline every signature request
        #[arg(long)]
        decline: bool,
    },
    /// Disconnect the wallet
    Disconnect,
    /// Submit a merger proposal
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        treasury: String,
        #[arg(long)]
        activity: String,
    },
    /// Open a proposal and toggle one of its fields
    Reveal {
        id: u64,
        /// treasury | activity
        field: String,
    },
    /// Show merger scores for a proposal
    Analyze { id: u64 },
    /// Show dashboard aggregates
    Dashboard,
    /// Switch the active tab
    Tab { tab: String },
    /// Stream daemon events until interrupted
    Watch {
        /// Only these categories (workflow, data, session, system)
        #[arg(long)]
        category: Vec<String>,
    },
    /// Send an arbitrary JSON-RPC call
    Call {
        method: String,
        /// JSON params
        params: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = match cli.socket {
        Some(path) => DaemonClient::new(path),
        None => DaemonClient::from_env(),
    };

    match cli.command {
        Command::Status => print(&client.status().await?)?,
        Command::Refresh => println!("{} proposals", client.refresh().await?),
        Command::List => {
            for record in client.list_proposals().await? {
                println!("#{} {} (creator {})", record.id, record.name, record.creator);
            }
        }
        Command::Connect { secret_key, decline } => {
            let account = client.connect_wallet(secret_key.as_deref(), !decline).await?;
            println!("connected {account}");
        }
        Command::Disconnect => {
            let disconnected = client.disconnect_wallet().await?;
            println!("{}", if disconnected { "disconnected" } else { "no wallet connected" });
        }
        Command::Create { name, treasury, activity } => {
            let record = client.create_proposal(&name, &treasury, &activity).await?;
            println!("created #{} {}", record.id, record.name);
        }
        Command::Reveal { id, field } => {
            let field: RevealField = field.parse().map_err(anyhow::Error::msg)?;
            print(&client.toggle_field(id, field).await?)?;
        }
        Command::Analyze { id } => print(&client.analysis(Some(id)).await?)?,
        Command::Dashboard => print(&serde_json::to_value(client.dashboard().await?)?)?,
        Command::Tab { tab } => {
            let tab: Tab = tab.parse().map_err(anyhow::Error::msg)?;
            client.set_tab(tab).await?;
        }
        Command::Watch { category } => {
            let categories = (!category.is_empty()).then_some(category);
            let mut events = client.subscribe(categories).await?;
            while let Some(event) = events.next_event().await? {
                print(&serde_json::to_value(event)?)?;
            }
        }
        Command::Call { method, params } => {
            let params: Value = match params {
                Some(text) => serde_json::from_str(&text)?,
                None => Value::Null,
            };
            print(&client.call(&method, params).await?)?;
        }
    }
    Ok(())
}

fn print(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
