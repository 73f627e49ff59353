//! Wemo device discovery and control.
//!
//! This module discovers Belkin Wemo devices on the local network via SSDP
//! and controls them through their UPnP/SOAP services.
//!
//! # Module Structure
//!
//! - `types` - Domain types for device records, roles and state
//! - `services` - UPnP service definitions (URNs, paths)
//! - `traits` - Trait abstractions for the scan and HTTP transports
//! - `client` - `reqwest`-backed transport implementations
//! - `descriptor` - `setup.xml` and bridge document parsing
//! - `classify` - Model-name to role classification
//! - `discovery` - Scan, enrichment and resolution coordinator
//! - `control` - Binary state and Insight commands with local fallback
//! - `bridge` - Wemo Link paired bulb enumeration and control
//! - `device` - Role-tagged device handles and the constructor registry
//! - `soap` - Low-level SOAP protocol implementation
//! - `utils` - Shared utility functions

pub mod bridge;
pub mod classify;
pub mod client;
pub mod control;
pub mod descriptor;
pub mod device;
pub mod discovery;
pub mod services;
pub mod soap;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export domain types
pub use services::WemoService;
pub use types::{Capability, DeviceRecord, DeviceRole, InsightParams, PairedDevice, StateValue};

// Re-export trait abstractions
pub use traits::{Connector, DeviceClient, ScanTransport};

// Re-export concrete implementations
pub use client::{HttpConnector, HttpDeviceClient};
pub use discovery::{Discovery, LookupKey, SsdpConfig, SsdpScanner};

// Re-export handles
pub use bridge::Bridge;
pub use classify::{Classifier, ModelClassifier};
pub use device::{Device, HandleConstructor, HandleParts, HandleRegistry};
