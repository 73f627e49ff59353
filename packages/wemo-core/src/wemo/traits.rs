//! Trait abstractions for the network collaborators.
//!
//! The discovery coordinator and the device handles depend on these traits
//! rather than on sockets and HTTP clients, so both can be driven by mocks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DiscoveryResult, SoapResult};
use crate::wemo::discovery::Advertisement;
use crate::wemo::services::WemoService;

/// HTTP/XML transport bound to a single device address.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// IP address this client talks to.
    fn ip(&self) -> &str;

    /// Port this client talks to.
    fn port(&self) -> u16;

    /// Fetches a descriptor resource (e.g. `setup.xml`) and returns its body.
    async fn info(&self, resource: &str) -> SoapResult<String>;

    /// Issues a control envelope and returns the raw response body.
    ///
    /// An empty body means no live device answered; callers decide whether
    /// that is an error or a cue to use local state.
    async fn request(
        &self,
        service: WemoService,
        action: &str,
        args: &[(&str, &str)],
    ) -> SoapResult<String>;
}

/// Builds [`DeviceClient`]s for resolved device addresses.
pub trait Connector: Send + Sync {
    /// Returns a client bound to `ip:port`.
    fn connect(&self, ip: &str, port: u16) -> Arc<dyn DeviceClient>;
}

/// SSDP-capable scan transport.
#[async_trait]
pub trait ScanTransport: Send + Sync {
    /// Searches for `search_target` and returns every advertisement received
    /// before `window` elapses, in arrival order, without de-duplication.
    async fn search(
        &self,
        search_target: &str,
        window: Duration,
    ) -> DiscoveryResult<Vec<Advertisement>>;
}
