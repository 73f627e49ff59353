//! `reqwest`-backed implementations of [`DeviceClient`] and [`Connector`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::SoapResult;
use crate::wemo::services::WemoService;
use crate::wemo::soap::{send_soap_request, SoapError};
use crate::wemo::traits::{Connector, DeviceClient};
use crate::wemo::utils::build_device_url;

/// HTTP client bound to one Wemo device.
#[derive(Debug, Clone)]
pub struct HttpDeviceClient {
    http: Client,
    ip: String,
    port: u16,
    timeout: Option<Duration>,
}

impl HttpDeviceClient {
    /// Creates a client for `ip:port` sharing the given HTTP client.
    pub fn new(http: Client, ip: impl Into<String>, port: u16) -> Self {
        Self {
            http,
            ip: ip.into(),
            port,
            timeout: None,
        }
    }

    /// Applies a per-request timeout (none by default).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl DeviceClient for HttpDeviceClient {
    fn ip(&self) -> &str {
        &self.ip
    }

    fn port(&self) -> u16 {
        self.port
    }

    async fn info(&self, resource: &str) -> SoapResult<String> {
        let url = build_device_url(&self.ip, self.port, resource);
        log::debug!("[Wemo] GET {}", url);

        let mut request = self.http.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SoapError::HttpStatus(status.as_u16(), body));
        }
        Ok(body)
    }

    async fn request(
        &self,
        service: WemoService,
        action: &str,
        args: &[(&str, &str)],
    ) -> SoapResult<String> {
        let url = build_device_url(&self.ip, self.port, service.control_path());
        send_soap_request(&self.http, &url, service.urn(), action, args, self.timeout).await
    }
}

/// Connector handing out [`HttpDeviceClient`]s over one shared connection pool.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    http: Client,
    timeout: Option<Duration>,
}

impl HttpConnector {
    /// Creates a connector with an optional per-request timeout.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            http: Client::new(),
            timeout,
        }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, ip: &str, port: u16) -> Arc<dyn DeviceClient> {
        Arc::new(HttpDeviceClient::new(self.http.clone(), ip, port).with_timeout(self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_binds_address() {
        let connector = HttpConnector::new(None);
        let client = connector.connect("192.168.1.40", 49154);
        assert_eq!(client.ip(), "192.168.1.40");
        assert_eq!(client.port(), 49154);
    }
}
