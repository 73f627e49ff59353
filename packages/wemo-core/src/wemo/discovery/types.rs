//! Shared types for Wemo device discovery.

use std::net::SocketAddr;

use thiserror::Error;

/// A raw SSDP response as received from the network.
///
/// Ephemeral: only used to derive the device address before enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// Address the response was sent from.
    pub sender: SocketAddr,
    /// Full response text, headers included.
    pub payload: String,
}

impl Advertisement {
    /// IP address of the advertising device.
    pub fn ip(&self) -> String {
        self.sender.ip().to_string()
    }
}

/// Errors that can occur during a network scan.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Failed to create or bind the UDP socket.
    #[error("failed to bind UDP socket: {0}")]
    SocketBind(#[source] std::io::Error),

    /// Failed to send the M-SEARCH query.
    #[error("failed to send SSDP search: {0}")]
    SendSearch(#[source] std::io::Error),

    /// Socket error while collecting responses.
    #[error("failed to receive SSDP response: {0}")]
    Receive(#[source] std::io::Error),
}

/// Convenient Result alias for scan operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
