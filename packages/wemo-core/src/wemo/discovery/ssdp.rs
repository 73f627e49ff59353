//! SSDP scan transport.
//!
//! Sends M-SEARCH queries to 239.255.255.250:1900 from a single unbound
//! (0.0.0.0) socket and collects every unicast reply until the window
//! elapses. The same socket is used for send AND receive since devices reply
//! back to the sending socket/port.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::timeout;

use super::types::{Advertisement, DiscoveryError, DiscoveryResult};
use crate::protocol_constants::SSDP_MULTICAST_ADDR;
use crate::wemo::traits::ScanTransport;

// ─────────────────────────────────────────────────────────────────────────────
// ASCII Case-Insensitive Helpers
// ─────────────────────────────────────────────────────────────────────────────
//
// HTTP headers are ASCII, so byte-level comparison is safe and avoids
// allocating lower-cased copies of every response.

/// Checks if `s` starts with `prefix` (ASCII case-insensitive, no allocation).
#[inline]
fn starts_with_ignore_ascii_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Finds the byte index of `needle` in `haystack` (ASCII case-insensitive).
#[inline]
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

// ─────────────────────────────────────────────────────────────────────────────

/// Extracts the value of the `LOCATION` header, if present.
pub fn extract_location(payload: &str) -> Option<&str> {
    payload
        .lines()
        .find(|l| starts_with_ignore_ascii_case(l, "location:"))
        .and_then(|l| l.find(':').map(|idx| l[idx + 1..].trim()))
        .filter(|l| !l.is_empty())
}

/// Extracts the port from an advertisement's `LOCATION` URL.
///
/// Reads the authority component between the scheme and the first `/` and
/// returns the digits after its last `:`. Returns None if there is no
/// `LOCATION` header or it carries no explicit port.
pub fn extract_location_port(payload: &str) -> Option<u16> {
    let location = extract_location(payload)?;
    let rest = match find_ignore_ascii_case(location, "://") {
        Some(idx) => &location[idx + 3..],
        None => location,
    };
    let authority = rest.split('/').next().unwrap_or(rest);
    let (_, port) = authority.rsplit_once(':')?;
    port.trim().parse().ok()
}

/// Build the M-SEARCH message.
fn build_msearch_message(search_target: &str, mx: u64) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\
         ST: {}\r\n\r\n",
        SSDP_MULTICAST_ADDR, mx, search_target
    )
}

/// Creates the scan socket bound to an ephemeral port on all interfaces.
///
/// Sets up socket options for SSDP discovery:
/// - SO_REUSEADDR for rapid restarts
/// - Multicast TTL of 4 per UPnP spec
fn create_socket() -> DiscoveryResult<UdpSocket> {
    let bind_addr = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0);

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(DiscoveryError::SocketBind)?;

    if let Err(e) = socket.set_reuse_address(true) {
        log::warn!("[SSDP] Failed to set SO_REUSEADDR: {}", e);
    }

    // UPnP 1.0 spec recommends TTL of 4 for SSDP multicast
    if let Err(e) = socket.set_multicast_ttl_v4(4) {
        log::warn!("[SSDP] Failed to set multicast TTL: {}", e);
    }

    socket
        .set_nonblocking(true)
        .map_err(DiscoveryError::SocketBind)?;
    socket
        .bind(&bind_addr.into())
        .map_err(DiscoveryError::SocketBind)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket).map_err(DiscoveryError::SocketBind)
}

/// Receives replies on `socket` until `window` has elapsed since `start`.
///
/// Every datagram is kept, in arrival order.
async fn collect_advertisements(
    socket: &UdpSocket,
    start: Instant,
    window: Duration,
) -> DiscoveryResult<Vec<Advertisement>> {
    let mut advertisements = Vec::new();
    let mut buf = [0u8; 2048];

    while start.elapsed() < window {
        let remaining = window.saturating_sub(start.elapsed());
        match timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok((amt, sender))) => {
                let payload = String::from_utf8_lossy(&buf[..amt]).into_owned();
                log::trace!("[SSDP] Response from {}", sender);
                advertisements.push(Advertisement { sender, payload });
            }
            Ok(Err(e)) => return Err(DiscoveryError::Receive(e)),
            Err(_) => break, // Timeout
        }
    }

    Ok(advertisements)
}

/// Configuration for SSDP discovery.
#[derive(Debug, Clone)]
pub struct SsdpConfig {
    /// Number of M-SEARCH packets to send.
    pub send_count: u64,
    /// Delay between M-SEARCH retries.
    pub retry_delay: Duration,
    /// MX value (max response delay in seconds).
    pub mx_value: u64,
}

impl Default for SsdpConfig {
    fn default() -> Self {
        Self {
            send_count: 1,
            retry_delay: Duration::from_millis(500),
            mx_value: 1,
        }
    }
}

/// Default [`ScanTransport`] using UDP multicast.
#[derive(Debug, Clone, Default)]
pub struct SsdpScanner {
    config: SsdpConfig,
}

impl SsdpScanner {
    pub fn new(config: SsdpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SsdpConfig {
        &self.config
    }
}

#[async_trait]
impl ScanTransport for SsdpScanner {
    async fn search(
        &self,
        search_target: &str,
        window: Duration,
    ) -> DiscoveryResult<Vec<Advertisement>> {
        let socket = create_socket()?;
        let msg = build_msearch_message(search_target, self.config.mx_value);

        log::debug!(
            "[SSDP] Searching for {} ({} sends, {}ms window)",
            search_target,
            self.config.send_count.max(1),
            window.as_millis()
        );

        socket
            .send_to(msg.as_bytes(), SSDP_MULTICAST_ADDR)
            .await
            .map_err(DiscoveryError::SendSearch)?;
        log::trace!("[SSDP] Sent M-SEARCH to {}", SSDP_MULTICAST_ADDR);

        let start = Instant::now();

        let resend = async {
            for attempt in 1..self.config.send_count {
                tokio::time::sleep(self.config.retry_delay).await;
                if start.elapsed() >= window {
                    break;
                }
                if let Err(e) = socket.send_to(msg.as_bytes(), SSDP_MULTICAST_ADDR).await {
                    log::warn!(
                        "[SSDP] Failed to send M-SEARCH (attempt {}): {}",
                        attempt + 1,
                        e
                    );
                }
            }
        };

        let ((), advertisements) =
            tokio::join!(resend, collect_advertisements(&socket, start, window));
        let advertisements = advertisements?;

        log::debug!(
            "[SSDP] Search complete: {} response(s) in {}ms",
            advertisements.len(),
            start.elapsed().as_millis()
        );

        Ok(advertisements)
    }
}
