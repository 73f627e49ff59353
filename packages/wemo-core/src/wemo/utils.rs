//! Shared helpers for device identity, addressing, and XML text handling.

use std::net::Ipv4Addr;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

// ─────────────────────────────────────────────────────────────────────────────
// Device Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Derives the external lookup id from a friendly name.
///
/// Lower-cases the name and replaces every space with an underscore. Cached
/// records, paired bridge devices and lookups all go through this function,
/// so the exact transformation must not change.
///
/// # Example
/// ```ignore
/// assert_eq!(derive_id("Living Room Switch"), "living_room_switch");
/// ```
pub fn derive_id(friendly_name: &str) -> String {
    friendly_name.to_lowercase().replace(' ', "_")
}

/// Returns true if `value` is a literal dotted-quad IPv4 address.
///
/// Handles accept either an address or a device id, and this decides which.
pub fn is_ip(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// XML Parsing Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Extracts text content from the first occurrence of an XML element.
///
/// Searches for an element by its local name (ignoring namespace prefixes)
/// and returns its decoded text content.
///
/// # Example
/// ```ignore
/// let xml = r#"<u:BinaryState>1</u:BinaryState>"#;
/// assert_eq!(extract_xml_text(xml, "BinaryState"), Some("1".to_string()));
/// ```
pub fn extract_xml_text(xml: &str, element_name: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let target_bytes = element_name.as_bytes();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == target_bytes => {
                if let Ok(text) = reader.read_text(e.name()) {
                    let decoded = html_escape::decode_html_entities(&text);
                    return Some(decoded.trim().to_string());
                }
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == target_bytes => {
                return Some(String::new());
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// XML Encoding
// ─────────────────────────────────────────────────────────────────────────────

/// Escapes XML special characters for embedding in XML content.
///
/// Used for SOAP arguments, including the nested `DeviceStatus` documents
/// the bridge expects as escaped text.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ─────────────────────────────────────────────────────────────────────────────
// URL Building
// ─────────────────────────────────────────────────────────────────────────────

/// Builds a device URL for the given address and path.
///
/// Accepts paths with or without a leading slash (`setup.xml` and
/// `/upnp/control/basicevent1` are both valid).
pub fn build_device_url(ip: &str, port: u16, path: &str) -> String {
    format!("http://{}:{}/{}", ip, port, path.trim_start_matches('/'))
}
