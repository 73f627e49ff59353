//! Library configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol_constants::DEFAULT_BRIDGE_ID;
use crate::wemo::discovery::SsdpConfig;

/// Configuration for discovery and control.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    // Cache
    /// Path of the JSON device registry.
    pub cache_file: PathBuf,

    // Control
    /// Per-request HTTP timeout (milliseconds). None waits indefinitely.
    pub http_timeout_ms: Option<u64>,

    /// Id of the bridge consulted for ids not found at top level.
    pub bridge_id: String,

    // Discovery
    /// Number of M-SEARCH packets to send during discovery.
    pub ssdp_send_count: u64,

    /// Delay between M-SEARCH packet retries (milliseconds).
    pub ssdp_retry_delay_ms: u64,

    /// MX value advertised in M-SEARCH (seconds).
    pub ssdp_mx: u64,
}

impl Config {
    /// Default cache location: `wemo-devices.json` in the system temp dir.
    pub fn default_cache_file() -> PathBuf {
        std::env::temp_dir().join("wemo-devices.json")
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_ms.map(Duration::from_millis)
    }

    pub fn ssdp(&self) -> SsdpConfig {
        SsdpConfig {
            send_count: self.ssdp_send_count.max(1),
            retry_delay: Duration::from_millis(self.ssdp_retry_delay_ms),
            mx_value: self.ssdp_mx,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let ssdp = SsdpConfig::default();
        Self {
            cache_file: Self::default_cache_file(),
            http_timeout_ms: None,
            bridge_id: DEFAULT_BRIDGE_ID.to_string(),
            ssdp_send_count: ssdp.send_count,
            ssdp_retry_delay_ms: ssdp.retry_delay.as_millis() as u64,
            ssdp_mx: ssdp.mx_value,
        }
    }
}
