//! Configuration file management.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable naming the data directory (and config location).
pub const DATA_DIR_ENV: &str = "DMERGE_DATA_DIR";

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Contract identity advertised in the signature message.
    #[serde(default)]
    pub chain: ChainConfig,
    /// Ledger backend.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Local wallet.
    #[serde(default)]
    pub wallet: WalletConfig,
    /// Presentation timings.
    #[serde(default)]
    pub ui: UiConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_contract_address")]
    pub contract_address: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

/// Ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// "sqlite" | "memory".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// SQLite file. Empty = $data_dir/ledger.db.
    #[serde(default)]
    pub path: String,
}

/// Wallet configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Hex-encoded Ed25519 secret. Empty = fresh key per connection.
    #[serde(default)]
    pub secret_key: String,
    /// Connect the wallet at startup.
    #[serde(default)]
    pub auto_connect: bool,
}

/// UI timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,
    #[serde(default = "default_success_banner_ms")]
    pub success_banner_ms: u64,
    #[serde(default = "default_error_banner_ms")]
    pub error_banner_ms: u64,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Conditional-write retries on a slot version conflict.
    #[serde(default = "default_max_write_retries")]
    pub max_write_retries: u32,
    /// Per-subscriber event buffer.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

// Default value functions

fn default_contract_address() -> String {
    "0x5fbdb2315678afecb367f032d93f642f64180aa3".to_string()
}

fn default_chain_id() -> u64 {
    dmerge_types::DEFAULT_CHAIN_ID
}

fn default_backend() -> String {
    "sqlite".to_string()
}

fn default_reveal_delay_ms() -> u64 {
    1500
}

fn default_success_banner_ms() -> u64 {
    2000
}

fn default_error_banner_ms() -> u64 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_write_retries() -> u32 {
    dmerge_store::DEFAULT_MAX_WRITE_RETRIES
}

fn default_event_buffer() -> usize {
    1000
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            contract_address: default_contract_address(),
            chain_id: default_chain_id(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: String::new(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            reveal_delay_ms: default_reveal_delay_ms(),
            success_banner_ms: default_success_banner_ms(),
            error_banner_ms: default_error_banner_ms(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            log_level: default_log_level(),
            max_write_retries: default_max_write_retries(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl UiConfig {
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn success_banner(&self) -> Duration {
        Duration::from_millis(self.success_banner_ms)
    }

    pub fn error_banner(&self) -> Duration {
        Duration::from_millis(self.error_banner_ms)
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(Self::parse(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.advanced.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.advanced.data_dir)
        }
    }

    /// Ledger database path.
    pub fn ledger_path(&self) -> PathBuf {
        if self.ledger.path.is_empty() {
            self.data_dir().join("ledger.db")
        } else {
            PathBuf::from(&self.ledger.path)
        }
    }

    pub fn socket_path(&self) -> PathBuf {
        self.data_dir().join("daemon.sock")
    }

    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/dmerge")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".dmerge")
        }
    }
}

fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/dmerge"))
}
