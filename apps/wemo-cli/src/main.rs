//! Wemo CLI - discover and switch Belkin Wemo devices from the terminal.
//!
//! Resolved devices are cached, so only `discover --refresh` (or a first run
//! with an empty cache) touches the network for discovery.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use wemo_core::protocol_constants::DEFAULT_WEMO_PORT;
use wemo_core::wemo::utils::is_ip;
use wemo_core::{Device, DeviceRecord, DeviceRole, Discovery, LookupKey};

use crate::config::CliConfig;

/// Wemo - discover and control Belkin Wemo devices.
#[derive(Parser, Debug)]
#[command(name = "wemo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE", env = "WEMO_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "warn", env = "WEMO_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Device cache file (overrides config file).
    #[arg(long, value_name = "FILE")]
    cache_file: Option<PathBuf>,

    /// Treat the target as a literal IP with this role instead of resolving it.
    #[arg(long, global = true)]
    role: Option<DeviceRole>,

    /// Port used with --role.
    #[arg(long, global = true, default_value_t = DEFAULT_WEMO_PORT)]
    port: u16,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print resolved devices as JSON.
    Discover {
        /// Rescan the network even if the cache is populated.
        #[arg(long)]
        refresh: bool,
    },
    /// List resolved devices, including bulbs paired to bridges.
    List,
    /// Print the first device whose field matches exactly.
    Lookup {
        /// Field name (id, ip, friendlyName, modelName, UDN, deviceType).
        key: LookupKey,
        value: String,
    },
    /// Switch a device on.
    On { target: String },
    /// Switch a device off.
    Off { target: String },
    /// Print the current state of a device.
    State { target: String },
    /// Print the Insight power report.
    Params { target: String },
    /// Set bulb brightness (0-100).
    Dim {
        target: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
}

fn print_devices(devices: &[DeviceRecord]) {
    for device in devices {
        println!(
            "{:<24} {:<15} {}:{:<6} {}",
            device.id, device.role, device.ip, device.port, device.friendly_name
        );
        for paired in device.paired_devices.iter().flatten() {
            println!(
                "  {:<22} {:<15} {:<22} {}",
                paired.id,
                DeviceRole::Bulb,
                paired.device_id,
                paired.friendly_name
            );
        }
    }
}

async fn resolve(discovery: &Discovery, args: &Args, target: &str) -> Result<Device> {
    match args.role {
        Some(role) => {
            if !is_ip(target) {
                bail!("--role requires an IPv4 address, got '{}'", target);
            }
            discovery
                .device_at(target, args.port, role)
                .with_context(|| format!("Failed to build {} handle for {}", role, target))
        }
        None => discovery
            .get_device_by_id(target)
            .await
            .with_context(|| format!("Failed to resolve '{}'", target)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    // Load configuration
    let mut config =
        CliConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(cache_file) = args.cache_file.clone() {
        config.cache_file = Some(cache_file);
    }

    let core_config = config.to_core_config();
    log::debug!(
        "Configuration: cache_file={}, bridge_id={}, http_timeout_ms={:?}",
        core_config.cache_file.display(),
        core_config.bridge_id,
        core_config.http_timeout_ms
    );
    let discovery = Discovery::new(&core_config);

    match &args.command {
        Command::Discover { refresh } => {
            let devices = discovery
                .find(*refresh)
                .await
                .context("Discovery failed")?;
            println!("{}", serde_json::to_string_pretty(&devices)?);
        }
        Command::List => {
            let devices = discovery.find(false).await.context("Discovery failed")?;
            print_devices(&devices);
        }
        Command::Lookup { key, value } => {
            match discovery
                .lookup_device(*key, value)
                .await
                .context("Discovery failed")?
            {
                Some(device) => println!("{}", serde_json::to_string_pretty(&device)?),
                None => bail!("No device with {:?} = '{}'", key, value),
            }
        }
        Command::On { target } => {
            resolve(&discovery, &args, target).await?.on().await?;
            println!("{} on", target);
        }
        Command::Off { target } => {
            resolve(&discovery, &args, target).await?.off().await?;
            println!("{} off", target);
        }
        Command::State { target } => {
            let state = resolve(&discovery, &args, target).await?.state().await?;
            println!("{} {}", state, if state.is_on() { "(on)" } else { "(off)" });
        }
        Command::Params { target } => {
            let params = resolve(&discovery, &args, target).await?.params().await?;
            println!("{}", params.raw());
            match params.current_power_mw() {
                Some(mw) => println!("current power: {:.1} W", mw as f64 / 1000.0),
                None => println!("current power: unavailable"),
            }
        }
        Command::Dim { target, percent } => {
            resolve(&discovery, &args, target).await?.dim(*percent).await?;
            println!("{} dimmed to {}%", target, percent);
        }
    }

    Ok(())
}
