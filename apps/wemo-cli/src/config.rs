//! CLI configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// CLI configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CliConfig {
    /// Path of the device cache file. Defaults to the system temp dir.
    /// Override: `WEMO_CACHE_FILE`
    pub cache_file: Option<PathBuf>,

    /// Per-request HTTP timeout in milliseconds (none by default).
    /// Override: `WEMO_HTTP_TIMEOUT_MS`
    pub http_timeout_ms: Option<u64>,

    /// Id of the bridge consulted for bulb ids.
    /// Override: `WEMO_BRIDGE_ID`
    pub bridge_id: String,

    /// Number of M-SEARCH packets sent per scan.
    /// Override: `WEMO_SSDP_SEND_COUNT`
    pub ssdp_send_count: u64,

    /// MX value advertised in M-SEARCH.
    pub ssdp_mx: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        let core = wemo_core::Config::default();
        Self {
            cache_file: None,
            http_timeout_ms: core.http_timeout_ms,
            bridge_id: core.bridge_id,
            ssdp_send_count: core.ssdp_send_count,
            ssdp_mx: core.ssdp_mx,
        }
    }
}

impl CliConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies `WEMO_*` overrides read through `var`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("WEMO_CACHE_FILE") {
            self.cache_file = Some(PathBuf::from(val));
        }

        if let Some(val) = var("WEMO_HTTP_TIMEOUT_MS") {
            if let Ok(ms) = val.parse() {
                self.http_timeout_ms = Some(ms);
            }
        }

        if let Some(val) = var("WEMO_BRIDGE_ID") {
            self.bridge_id = val;
        }

        if let Some(val) = var("WEMO_SSDP_SEND_COUNT") {
            if let Ok(count) = val.parse() {
                self.ssdp_send_count = count;
            }
        }

        // Note: WEMO_LOG_LEVEL is handled by clap via #[arg(env = ...)] in main.rs
    }

    /// Converts to wemo-core's Config type.
    pub fn to_core_config(&self) -> wemo_core::Config {
        let mut config = wemo_core::Config {
            http_timeout_ms: self.http_timeout_ms,
            bridge_id: self.bridge_id.clone(),
            ssdp_send_count: self.ssdp_send_count,
            ssdp_mx: self.ssdp_mx,
            ..Default::default()
        };
        if let Some(cache_file) = &self.cache_file {
            config.cache_file = cache_file.clone();
        }
        config
    }
}
