//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by the Wemo firmware and the SSDP/UPnP
//! specifications, and changing them would break device compatibility.

// ─────────────────────────────────────────────────────────────────────────────
// SSDP
// ─────────────────────────────────────────────────────────────────────────────

/// SSDP search target answered by every Wemo device exposing `basicevent`.
pub const WEMO_SEARCH_TARGET: &str = "urn:Belkin:service:basicevent:1";

/// Length of the discovery window (seconds).
///
/// Every advertisement received inside this window is kept.
pub const SCAN_WINDOW_SECS: u64 = 2;

/// Standard SSDP multicast address and port (protocol specification).
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

// ─────────────────────────────────────────────────────────────────────────────
// Device description
// ─────────────────────────────────────────────────────────────────────────────

/// Resource path of the Wemo device descriptor.
pub const SETUP_XML: &str = "setup.xml";

/// Port Wemo firmware listens on when an advertisement carries no LOCATION.
pub const DEFAULT_WEMO_PORT: u16 = 49153;

/// Device type published by third-party Wemo emulators (fauxmo and friends).
///
/// These answer the Belkin search target but do not implement the real
/// control services, so they are dropped during enrichment.
pub const EMULATED_DEVICE_TYPE: &str = "urn:MakerMusings:device:controllee:1";

/// Well-known id of the Wemo Link bridge (derived from its default
/// friendly name "Wemo Link").
pub const DEFAULT_BRIDGE_ID: &str = "wemo_link";

// ─────────────────────────────────────────────────────────────────────────────
// Bridge capabilities
// ─────────────────────────────────────────────────────────────────────────────

/// Bridge capability id for on/off.
pub const CAPABILITY_ON_OFF: &str = "10006";

/// Bridge capability id for brightness (`level:transition`).
pub const CAPABILITY_LEVEL: &str = "10008";

/// Maximum brightness level accepted by bridge bulbs.
pub const MAX_BULB_LEVEL: u8 = 255;
