//! Centralized error types for the Wemo core library.
//!
//! Each layer defines its own `thiserror` enum next to the code that raises
//! it; [`WemoError`] flattens them for the public discovery and handle APIs.

use thiserror::Error;

use crate::cache::CacheError;
use crate::wemo::discovery::DiscoveryError;
use crate::wemo::soap::SoapError;
use crate::wemo::types::{Capability, DeviceRole};

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a stable, machine-readable error code.
    fn code(&self) -> &'static str;
}

impl ErrorCode for DiscoveryError {
    fn code(&self) -> &'static str {
        match self {
            Self::SocketBind(_) => "socket_bind_failed",
            Self::SendSearch(_) => "ssdp_send_failed",
            Self::Receive(_) => "ssdp_receive_failed",
        }
    }
}

impl ErrorCode for SoapError {
    fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_request_failed",
            Self::HttpStatus(_, _) => "http_error_status",
            Self::Fault { .. } => "protocol_fault",
            Self::Unwrap { .. } => "unwrap_failure",
            Self::Descriptor(_) => "invalid_descriptor",
        }
    }
}

impl ErrorCode for CacheError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "cache_io_failed",
            Self::Json { .. } => "cache_parse_failed",
        }
    }
}

/// Error type for discovery and device-handle operations.
#[derive(Debug, Error)]
pub enum WemoError {
    /// Network scan failed.
    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// No device matched the id or address.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Talking to the device failed (transport, fault or unwrap).
    #[error(transparent)]
    Soap(#[from] SoapError),

    /// The handle's role does not offer the capability.
    #[error("{role} device '{id}' does not support {capability}")]
    Unsupported {
        id: String,
        role: DeviceRole,
        capability: Capability,
    },

    /// No handle constructor is registered for the role.
    #[error("no handle available for {role} device '{id}'")]
    NoHandle { id: String, role: DeviceRole },
}

impl WemoError {
    /// Returns true if the device answered with a fault marker.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Soap(SoapError::Fault { .. }))
    }

    /// Returns true if the device answered with something other than an envelope.
    pub fn is_unwrap_failure(&self) -> bool {
        matches!(self, Self::Soap(SoapError::Unwrap { .. }))
    }
}

impl ErrorCode for WemoError {
    fn code(&self) -> &'static str {
        match self {
            Self::Discovery(e) => e.code(),
            Self::DeviceNotFound(_) => "device_not_found",
            Self::Soap(e) => e.code(),
            Self::Unsupported { .. } => "unsupported",
            Self::NoHandle { .. } => "no_handle",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Type Aliases
// ─────────────────────────────────────────────────────────────────────────────

// Re-export Result type aliases from their defining modules
pub use crate::wemo::discovery::DiscoveryResult;
pub use crate::wemo::soap::SoapResult;

/// Convenient Result alias for discovery and handle operations.
pub type WemoResult<T> = Result<T, WemoError>;
