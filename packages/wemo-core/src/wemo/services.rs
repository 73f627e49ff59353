//! Wemo UPnP service definitions.
//!
//! Single source of truth for the service URNs and control paths used by
//! the control protocol. Each device role owns exactly one of these.

use serde::Serialize;

/// Wemo UPnP services used for control.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WemoService {
    /// Binary state control shared by sockets and light switches.
    BasicEvent,
    /// Insight switches: binary state plus power telemetry.
    Insight,
    /// Wemo Link bridge: paired bulb enumeration and control.
    Bridge,
}

impl WemoService {
    /// Returns the UPnP service URN for SOAP requests.
    #[must_use]
    pub fn urn(&self) -> &'static str {
        match self {
            Self::BasicEvent => "urn:Belkin:service:basicevent:1",
            Self::Insight => "urn:Belkin:service:insight:1",
            Self::Bridge => "urn:Belkin:service:bridge:1",
        }
    }

    /// Returns the UPnP control endpoint path for SOAP requests.
    #[must_use]
    pub fn control_path(&self) -> &'static str {
        match self {
            Self::BasicEvent => "/upnp/control/basicevent1",
            Self::Insight => "/upnp/control/insight1",
            Self::Bridge => "/upnp/control/bridge1",
        }
    }

    /// Returns a human-readable name for this service.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BasicEvent => "basicevent1",
            Self::Insight => "insight1",
            Self::Bridge => "bridge1",
        }
    }
}
