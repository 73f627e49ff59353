//! Wemo device discovery and resolution.
//!
//! [`Discovery`] runs one SSDP search, fetches each responder's `setup.xml`,
//! drops emulated devices, classifies the rest by model name, expands bridge
//! pairings and persists the list. Later lookups and handle construction are
//! served from that list without rescanning.
//!
//! # Module Structure
//!
//! - `types` - Advertisement and error types
//! - `ssdp` - Default UDP scan transport

mod ssdp;
mod types;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub use ssdp::{extract_location, extract_location_port, SsdpConfig, SsdpScanner};
pub use types::{Advertisement, DiscoveryError, DiscoveryResult};

use crate::cache::DeviceCache;
use crate::config::Config;
use crate::error::{WemoError, WemoResult};
use crate::protocol_constants::{
    DEFAULT_WEMO_PORT, EMULATED_DEVICE_TYPE, SCAN_WINDOW_SECS, SETUP_XML, WEMO_SEARCH_TARGET,
};
use crate::wemo::bridge::{fetch_paired_devices, Bridge};
use crate::wemo::classify::Classifier;
use crate::wemo::client::HttpConnector;
use crate::wemo::descriptor::parse_device_descriptor;
use crate::wemo::device::{Device, HandleParts, HandleRegistry};
use crate::wemo::traits::{Connector, ScanTransport};
use crate::wemo::types::{DeviceRecord, DeviceRole};
use crate::wemo::utils::{derive_id, is_ip};

/// Record field used by [`Discovery::lookup_device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey {
    Id,
    Ip,
    FriendlyName,
    ModelName,
    Udn,
    DeviceType,
}

impl LookupKey {
    fn value<'a>(&self, record: &'a DeviceRecord) -> &'a str {
        match self {
            Self::Id => &record.id,
            Self::Ip => &record.ip,
            Self::FriendlyName => &record.friendly_name,
            Self::ModelName => &record.model_name,
            Self::Udn => &record.udn,
            Self::DeviceType => &record.device_type,
        }
    }

    /// Returns true if the record's field equals `value` exactly.
    pub fn matches(&self, record: &DeviceRecord, value: &str) -> bool {
        self.value(record) == value
    }
}

impl FromStr for LookupKey {
    type Err = String;

    /// Accepts the cached field names (`friendlyName`, `UDN`, ...) and their
    /// snake_case forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "ip" => Ok(Self::Ip),
            "friendlyName" | "friendly_name" => Ok(Self::FriendlyName),
            "modelName" | "model_name" => Ok(Self::ModelName),
            "UDN" | "udn" => Ok(Self::Udn),
            "deviceType" | "device_type" => Ok(Self::DeviceType),
            other => Err(format!("unknown lookup key '{}'", other)),
        }
    }
}

/// Discovery coordinator.
pub struct Discovery {
    scanner: Arc<dyn ScanTransport>,
    connector: Arc<dyn Connector>,
    cache: DeviceCache,
    classifier: Classifier,
    registry: HandleRegistry,
    bridge_id: String,
}

impl Discovery {
    /// Creates a coordinator using the default SSDP and HTTP transports.
    pub fn new(config: &Config) -> Self {
        Self::with_transports(
            Arc::new(SsdpScanner::new(config.ssdp())),
            Arc::new(HttpConnector::new(config.http_timeout())),
            DeviceCache::new(config.cache_file.clone()),
        )
        .with_bridge_id(config.bridge_id.clone())
    }

    /// Creates a coordinator over explicit transports.
    pub fn with_transports(
        scanner: Arc<dyn ScanTransport>,
        connector: Arc<dyn Connector>,
        cache: DeviceCache,
    ) -> Self {
        Self {
            scanner,
            connector,
            cache,
            classifier: Classifier::default(),
            registry: HandleRegistry::default(),
            bridge_id: crate::protocol_constants::DEFAULT_BRIDGE_ID.to_string(),
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: HandleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the id of the bridge consulted for ids not found at top level.
    #[must_use]
    pub fn with_bridge_id(mut self, bridge_id: impl Into<String>) -> Self {
        self.bridge_id = bridge_id.into();
        self
    }

    pub fn cache(&self) -> &DeviceCache {
        &self.cache
    }

    /// Returns the resolved device list.
    ///
    /// Without `refresh` a non-empty cached list is returned as-is; otherwise
    /// (or if the cache is empty) the network is scanned and the result
    /// replaces the cached list.
    pub async fn find(&self, refresh: bool) -> WemoResult<Vec<DeviceRecord>> {
        if !refresh {
            let cached = self.cache.read_devices();
            if !cached.is_empty() {
                log::debug!("[Discovery] Using {} cached device(s)", cached.len());
                return Ok(cached);
            }
        }

        let devices = self.scan().await?;
        self.cache.write_devices(&devices);
        Ok(devices)
    }

    /// Scans the network and enriches every advertisement, in order.
    ///
    /// Duplicate advertisements are kept. A descriptor failure aborts the scan.
    async fn scan(&self) -> WemoResult<Vec<DeviceRecord>> {
        let advertisements = self
            .scanner
            .search(WEMO_SEARCH_TARGET, Duration::from_secs(SCAN_WINDOW_SECS))
            .await?;
        log::info!(
            "[Discovery] {} advertisement(s) received",
            advertisements.len()
        );

        let mut devices = Vec::with_capacity(advertisements.len());
        for advertisement in &advertisements {
            if let Some(record) = self.enrich(advertisement).await? {
                devices.push(record);
            }
        }

        log::info!("[Discovery] Resolved {} device(s)", devices.len());
        Ok(devices)
    }

    /// Resolves one advertisement into a record.
    ///
    /// Returns None for emulated devices.
    async fn enrich(&self, advertisement: &Advertisement) -> WemoResult<Option<DeviceRecord>> {
        let ip = advertisement.ip();
        let port = extract_location_port(&advertisement.payload).unwrap_or(DEFAULT_WEMO_PORT);
        let client = self.connector.connect(&ip, port);

        let xml = client.info(SETUP_XML).await?;
        let descriptor = parse_device_descriptor(&xml)?;

        if descriptor.device_type == EMULATED_DEVICE_TYPE {
            log::debug!(
                "[Discovery] Skipping emulated device '{}' at {}",
                descriptor.friendly_name,
                ip
            );
            return Ok(None);
        }

        let role = self.classifier.classify(&descriptor.model_name);
        let paired_devices = if role == DeviceRole::Bridge {
            Some(fetch_paired_devices(client.as_ref(), &descriptor.udn).await?)
        } else {
            None
        };

        log::debug!(
            "[Discovery] {} ({}) at {}:{} -> {}",
            descriptor.friendly_name,
            descriptor.model_name,
            ip,
            port,
            role
        );

        Ok(Some(DeviceRecord {
            id: derive_id(&descriptor.friendly_name),
            ip,
            port,
            device_type: descriptor.device_type,
            friendly_name: descriptor.friendly_name,
            model_name: descriptor.model_name,
            udn: descriptor.udn,
            role,
            paired_devices,
        }))
    }

    /// Returns the first resolved record whose `key` field equals `value`.
    pub async fn lookup_device(
        &self,
        key: LookupKey,
        value: &str,
    ) -> WemoResult<Option<DeviceRecord>> {
        Ok(self
            .find(false)
            .await?
            .into_iter()
            .find(|record| key.matches(record, value)))
    }

    fn build(&self, id: String, record: DeviceRecord) -> WemoResult<Device> {
        let client = self.connector.connect(&record.ip, record.port);
        self.registry.build(HandleParts {
            id,
            role: record.role,
            client,
            cache: self.cache.clone(),
            record: Some(record),
        })
    }

    /// Builds the handle for a device id (or a literal IP of a resolved device).
    ///
    /// Ids not resolved at top level are looked up among the devices paired
    /// to the configured bridge.
    ///
    /// # Errors
    /// Returns [`WemoError::DeviceNotFound`] if neither matches.
    pub async fn get_device_by_id(&self, id: &str) -> WemoResult<Device> {
        let key = if is_ip(id) { LookupKey::Ip } else { LookupKey::Id };
        let devices = self.find(false).await?;

        if let Some(record) = devices
            .iter()
            .find(|r| key.matches(r, id) && self.registry.supports(r.role))
        {
            return self.build(id.to_string(), record.clone());
        }

        let Some(bridge_record) = devices
            .iter()
            .find(|r| r.id == self.bridge_id && r.role == DeviceRole::Bridge)
        else {
            return Err(WemoError::DeviceNotFound(id.to_string()));
        };

        let client = self.connector.connect(&bridge_record.ip, bridge_record.port);
        let bridge = Bridge::from_record(bridge_record, client);
        match bridge.device_id_by_custom_id(id).await? {
            Some(device_id) => {
                log::debug!(
                    "[Discovery] {} resolved via {} as {}",
                    id,
                    self.bridge_id,
                    device_id
                );
                Ok(Device::bulb(id, bridge, device_id))
            }
            None => Err(WemoError::DeviceNotFound(id.to_string())),
        }
    }

    /// Builds the handle for a friendly name.
    pub async fn get_device_by_name(&self, friendly_name: &str) -> WemoResult<Device> {
        self.get_device_by_id(&derive_id(friendly_name)).await
    }

    /// Builds a handle for a literal address without consulting the cache
    /// for resolution. The address doubles as the id.
    pub fn device_at(&self, ip: &str, port: u16, role: DeviceRole) -> WemoResult<Device> {
        self.registry.build(HandleParts {
            id: ip.to_string(),
            role,
            client: self.connector.connect(ip, port),
            cache: self.cache.clone(),
            record: None,
        })
    }
}

impl std::fmt::Debug for Discovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discovery")
            .field("cache", &self.cache)
            .field("classifier", &self.classifier)
            .field("registry", &self.registry)
            .field("bridge_id", &self.bridge_id)
            .finish()
    }
}
