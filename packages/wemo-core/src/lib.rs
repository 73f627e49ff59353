//! Wemo Core - discovery and control of Belkin Wemo devices.
//!
//! Devices are found with an SSDP search, resolved through their `setup.xml`
//! descriptors, classified by model name and persisted in a JSON cache so
//! later invocations skip the network scan. Resolved devices are controlled
//! through their UPnP/SOAP services.
//!
//! # Architecture
//!
//! - [`wemo`]: Discovery coordinator, device handles and the SOAP protocol
//! - [`cache`]: File-backed device registry and last-known state
//! - [`config`]: Library configuration
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! The network is reached only through traits, so the coordinator and the
//! handles can be driven by mocks:
//!
//! - [`ScanTransport`](wemo::ScanTransport): SSDP search
//! - [`DeviceClient`](wemo::DeviceClient): descriptor fetch and SOAP requests
//! - [`Connector`](wemo::Connector): builds clients for resolved addresses
//!
//! Each trait has a default implementation ([`SsdpScanner`](wemo::SsdpScanner),
//! [`HttpDeviceClient`](wemo::HttpDeviceClient), [`HttpConnector`](wemo::HttpConnector)).

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod error;
pub mod protocol_constants;
pub mod wemo;

// Re-export commonly used types at the crate root
pub use cache::{CacheError, CacheStore, DeviceCache};
pub use config::Config;
pub use error::{DiscoveryResult, ErrorCode, SoapResult, WemoError, WemoResult};

// Re-export Wemo types
pub use wemo::{
    Capability, Device, DeviceRecord, DeviceRole, Discovery, InsightParams, LookupKey,
    PairedDevice, StateValue,
};
