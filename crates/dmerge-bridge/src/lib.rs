//! # dmerge-bridge
//!
//! Client side of the daemon's JSON-RPC socket, used by front-end shells,
//! scripts and the `dmerge-cli` binary.

pub mod client;
pub mod ipc;

use std::path::PathBuf;

pub use client::{ClientError, DaemonClient, EventStream};
pub use ipc::{send_rpc_request, IpcBridgeError};

/// Environment variable overriding the socket path.
pub const SOCKET_PATH_ENV: &str = "DMERGE_SOCKET_PATH";

/// Environment variable naming the daemon's data directory.
pub const DATA_DIR_ENV: &str = "DMERGE_DATA_DIR";

/// Socket path from the environment: `DMERGE_SOCKET_PATH`, else
/// `$DMERGE_DATA_DIR/daemon.sock`, else the daemon's default data dir.
pub fn resolve_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(SOCKET_PATH_ENV) {
        return PathBuf::from(path);
    }
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir).join("daemon.sock");
    }
    let home = std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"));
    if cfg!(target_os = "macos") {
        home.join("Library/Application Support/dmerge/daemon.sock")
    } else {
        home.join(".dmerge/daemon.sock")
    }
}
