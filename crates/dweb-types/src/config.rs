//! TOML configuration for the node and the browser.
//!
//! Every key is optional; missing keys fall back to [`Default`].
//!
//! ```toml
//! [node]
//! bootstrap_peers = ["/dns4/node0.preload.ipfs.io/tcp/443/wss/p2p/Qm..."]
//! dial_timeout_ms = 5000
//! gateway_url = "http://127.0.0.1:8080"
//!
//! [browser]
//! default_reference = "ipns://docs.ipfs.tech"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DwebError, Result};

/// Bootstrap peers dialed on startup.
const DEFAULT_BOOTSTRAP_PEERS: &[&str] = &[
    "/dns4/node0.preload.ipfs.io/tcp/443/wss/p2p/QmZMxNdpMkewiVZLMRxaNxUeZpDUb34pWjodAZ8rnjqDFc",
    "/dns4/node1.preload.ipfs.io/tcp/443/wss/p2p/Qmbut9Ywz9YEDrz8ySBSgWyJk41Uvm2QJPhwDJzJyGFsD6",
    "/dns4/node2.preload.ipfs.io/tcp/443/wss/p2p/QmV7gnbW5VTcJ3oyM2Xk1rdFBJ3kTkvxc87UFGsun29STS",
    "/dns4/node3.preload.ipfs.io/tcp/443/wss/p2p/QmY7JB6MQXhxHvq7dBDh4HpbH29v4yE9JRadAVpndvzySN",
];

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwebConfig {
    pub node: NodeSettings,
    pub browser: BrowserSettings,
}

/// Peer-to-peer node settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Multiaddrs dialed once at startup, in order.
    pub bootstrap_peers: Vec<String>,
    /// Upper bound for a single bootstrap dial.
    pub dial_timeout_ms: u64,
    /// HTTP gateway used to resolve references.
    pub gateway_url: String,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            bootstrap_peers: DEFAULT_BOOTSTRAP_PEERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            dial_timeout_ms: 5000,
            gateway_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

impl NodeSettings {
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }
}

/// Navigation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Name loaded when the address bar carries no reference.
    pub default_reference: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            default_reference: "ipns://docs.ipfs.tech".to_string(),
        }
    }
}

impl DwebConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.node.dial_timeout_ms == 0 {
            return Err(DwebError::Config(
                "node.dial_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.node.gateway_url.trim().is_empty() {
            return Err(DwebError::Config("node.gateway_url is empty".to_string()));
        }
        Ok(())
    }
}
