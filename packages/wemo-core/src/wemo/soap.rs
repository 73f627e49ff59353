//! Low-level SOAP protocol implementation for Wemo communication.
//!
//! Builds envelopes, sends them over HTTP, and unwraps response envelopes
//! into a [`SoapBody`]. For role-level commands, see `control.rs`.

use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Client;
use thiserror::Error;

use super::services::WemoService;
use super::traits::DeviceClient;
use super::utils::{escape_xml, extract_xml_text};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur while talking to a Wemo device.
#[derive(Debug, Error)]
pub enum SoapError {
    /// HTTP request to the device failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Device returned a non-success HTTP status without a SOAP fault.
    #[error("HTTP error {0}: {1}")]
    HttpStatus(u16, String),

    /// Response body carried a fault marker.
    #[error("SOAP fault: {fault}")]
    Fault {
        /// Fault string plus UPnP error detail when present.
        fault: String,
        /// The raw response, for diagnosis.
        raw: String,
    },

    /// Response lacked the expected envelope/body structure.
    #[error("failed to unwrap response ({reason}); response: {raw}")]
    Unwrap {
        /// What was missing.
        reason: String,
        /// The raw response, for diagnosis.
        raw: String,
    },

    /// Device descriptor could not be interpreted.
    #[error("invalid device descriptor: {0}")]
    Descriptor(String),
}

/// Convenient Result alias for SOAP operations.
pub type SoapResult<T> = Result<T, SoapError>;

impl SoapError {
    fn unwrap_failure(reason: impl Into<String>, raw: &str) -> Self {
        Self::Unwrap {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Builds a SOAP 1.1 envelope for `action` on `service`.
///
/// The envelope must be a single line with no leading whitespace; Wemo
/// firmware rejects XML with whitespace before the root element.
pub fn build_envelope(service: &str, action: &str, args: &[(&str, &str)]) -> String {
    let mut body = format!(
        r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{} xmlns:u="{}">"#,
        action, service
    );

    for (k, v) in args {
        body.push_str(&format!("<{k}>{}</{k}>", escape_xml(v)));
    }

    body.push_str(&format!(r#"</u:{}></s:Body></s:Envelope>"#, action));
    body
}

/// Posts a SOAP envelope to `url` and returns the raw response body.
///
/// The body is returned as-is, including empty bodies and bodies carrying a
/// fault; interpreting it is left to [`unwrap_response`]. A non-success
/// status without a fault in the body is a transport error.
pub async fn send_soap_request(
    client: &Client,
    url: &str,
    service: &str,
    action: &str,
    args: &[(&str, &str)],
    timeout: Option<Duration>,
) -> SoapResult<String> {
    let body = build_envelope(service, action, args);

    log::info!("[SOAP] {} -> {} (body: {} bytes)", action, url, body.len());
    log::debug!("[SOAP] Request body: {}", body);

    let start = std::time::Instant::now();
    let mut request = client
        .post(url)
        .header("Content-Type", "text/xml; charset=\"utf-8\"")
        .header("SOAPAction", format!("\"{}#{}\"", service, action))
        .body(body);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }
    let res = request.send().await;

    log::info!(
        "[SOAP] {} completed in {:?}: {:?}",
        action,
        start.elapsed(),
        res.as_ref().map(|r| r.status())
    );

    let res = res?;
    let status = res.status();
    let response_text = res.text().await?;

    // Faults usually arrive with a 500 status; hand them to the unwrapper
    if !status.is_success() && !contains_fault(&response_text) {
        return Err(SoapError::HttpStatus(status.as_u16(), response_text));
    }

    Ok(response_text)
}

fn contains_fault(xml: &str) -> bool {
    xml.contains(":Fault>") || xml.contains("<Fault>")
}

// ─────────────────────────────────────────────────────────────────────────────
// Response Unwrapping
// ─────────────────────────────────────────────────────────────────────────────

/// The unwrapped body of a SOAP response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapBody {
    /// Local name of the first element inside `Body`
    /// (e.g. `GetBinaryStateResponse` or `Fault`).
    pub element: String,
    /// Direct children of that element, in document order, entity-decoded.
    pub fields: Vec<(String, String)>,
    raw: String,
}

impl SoapBody {
    /// Returns true if the body carries the fault marker.
    pub fn is_fault(&self) -> bool {
        self.element == "Fault"
    }

    /// Returns the decoded text of a direct child of the body element.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the raw response this body was unwrapped from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Converts a fault body into [`SoapError::Fault`], passing others through.
    pub fn check_fault(self) -> SoapResult<Self> {
        if !self.is_fault() {
            return Ok(self);
        }

        let mut fault = self
            .field("faultstring")
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown SOAP fault")
            .to_string();
        if let Some(code) = extract_xml_text(&self.raw, "errorCode") {
            fault.push_str(&format!(" (UPnP error {}", code));
            if let Some(desc) = extract_xml_text(&self.raw, "errorDescription") {
                fault.push_str(&format!(": {}", desc));
            }
            fault.push(')');
        }

        Err(SoapError::Fault {
            fault,
            raw: self.raw,
        })
    }

    /// Checks the body is the `<action>Response` element (after fault detection).
    pub fn expect_response(self, action: &str) -> SoapResult<Self> {
        let body = self.check_fault()?;
        let expected = format!("{}Response", action);
        if body.element != expected {
            return Err(SoapError::unwrap_failure(
                format!("expected {} but found {}", expected, body.element),
                &body.raw,
            ));
        }
        Ok(body)
    }

    /// Returns a required field, or an unwrap failure when it is missing.
    pub fn require(&self, name: &str) -> SoapResult<String> {
        self.field(name).map(str::to_string).ok_or_else(|| {
            SoapError::unwrap_failure(format!("{} missing from {}", name, self.element), &self.raw)
        })
    }
}

/// Descends into `Envelope/Body` and returns its first element.
///
/// # Errors
/// Returns [`SoapError::Unwrap`] carrying the raw response when the
/// envelope, the body, or the body's element is missing.
pub fn unwrap_response(raw: &str) -> SoapResult<SoapBody> {
    let mut reader = Reader::from_str(raw);
    let mut buf = Vec::new();

    // Local names of currently open elements
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut element: Option<String> = None;
    let mut fields = Vec::new();
    let mut saw_envelope = false;
    let mut saw_body = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = e.local_name().as_ref().to_vec();
                if stack.len() == 3 && in_body(&stack) {
                    // Field: consume its content, including escaped documents
                    let name = String::from_utf8_lossy(&local).to_string();
                    let text = reader
                        .read_text(e.name())
                        .map(|t| html_escape::decode_html_entities(&t).trim().to_string())
                        .unwrap_or_default();
                    fields.push((name, text));
                } else {
                    match stack.len() {
                        0 if local == b"Envelope" => saw_envelope = true,
                        1 if local == b"Body" && saw_envelope => saw_body = true,
                        2 if in_body(&stack) && element.is_none() => {
                            element = Some(String::from_utf8_lossy(&local).to_string());
                        }
                        _ => {}
                    }
                    stack.push(local);
                }
            }
            Ok(Event::Empty(ref e)) => {
                let local = e.local_name().as_ref().to_vec();
                let name = String::from_utf8_lossy(&local).to_string();
                match stack.len() {
                    2 if in_body(&stack) && element.is_none() => element = Some(name),
                    3 if in_body(&stack) => fields.push((name, String::new())),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
                // Only the first body element is of interest
                if element.is_some() && stack.len() < 3 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::debug!("[SOAP] XML parse error while unwrapping: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_envelope {
        return Err(SoapError::unwrap_failure("missing Envelope", raw));
    }
    if !saw_body {
        return Err(SoapError::unwrap_failure("missing Body", raw));
    }
    let Some(element) = element else {
        return Err(SoapError::unwrap_failure("empty Body", raw));
    };

    Ok(SoapBody {
        element,
        fields,
        raw: raw.to_string(),
    })
}

fn in_body(stack: &[Vec<u8>]) -> bool {
    stack.len() >= 2 && stack[0] == b"Envelope" && stack[1] == b"Body"
}

// ─────────────────────────────────────────────────────────────────────────────
// SOAP Request Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for constructing and sending SOAP requests through a [`DeviceClient`].
///
/// # Example
/// ```ignore
/// let raw = SoapRequestBuilder::new(client.as_ref())
///     .service(WemoService::BasicEvent)
///     .action("SetBinaryState")
///     .arg("BinaryState", "1")
///     .send()
///     .await?;
/// ```
pub struct SoapRequestBuilder<'a> {
    client: &'a dyn DeviceClient,
    service: Option<WemoService>,
    action: Option<&'a str>,
    args: Vec<(&'a str, String)>,
}

impl<'a> SoapRequestBuilder<'a> {
    /// Creates a new SOAP request builder.
    #[must_use]
    pub fn new(client: &'a dyn DeviceClient) -> Self {
        Self {
            client,
            service: None,
            action: None,
            args: Vec::new(),
        }
    }

    /// Sets the Wemo service for this request.
    #[must_use]
    pub fn service(mut self, service: WemoService) -> Self {
        self.service = Some(service);
        self
    }

    /// Sets the SOAP action name.
    #[must_use]
    pub fn action(mut self, action: &'a str) -> Self {
        self.action = Some(action);
        self
    }

    /// Adds an argument to the SOAP request.
    ///
    /// Arguments are included in the SOAP body in the order they are added.
    #[must_use]
    pub fn arg(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.args.push((key, value.into()));
        self
    }

    /// Sends the request and returns the raw (possibly empty) response body.
    ///
    /// # Errors
    /// Returns `SoapError` if the service or action is not set, or if the
    /// transport fails.
    pub async fn send(self) -> SoapResult<String> {
        let service = self
            .service
            .ok_or_else(|| SoapError::unwrap_failure("SoapRequestBuilder: service not set", ""))?;
        let action = self
            .action
            .ok_or_else(|| SoapError::unwrap_failure("SoapRequestBuilder: action not set", ""))?;

        let args: Vec<(&str, &str)> = self.args.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.client.request(service, action, &args).await
    }

    /// Sends the request and unwraps a `<action>Response` body.
    ///
    /// Unlike [`send`](Self::send) an empty response is an unwrap failure.
    pub async fn call(self) -> SoapResult<SoapBody> {
        let action = self.action.unwrap_or_default();
        let raw = self.send().await?;
        unwrap_response(&raw)?.expect_response(action)
    }

    /// Returns the request parts without sending (for testing).
    #[cfg(test)]
    pub fn into_parts(self) -> Option<(WemoService, &'a str, Vec<(&'a str, String)>)> {
        let service = self.service?;
        let action = self.action?;
        Some((service, action, self.args))
    }
}
