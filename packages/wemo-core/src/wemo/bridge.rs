//! Wemo Link bridge: paired bulb enumeration and bulb control.
//!
//! The bridge exchanges XML documents embedded as escaped text inside the
//! SOAP arguments and responses (`DeviceLists`, `DeviceStatusList`,
//! `DeviceStatus`).

use std::sync::Arc;

use crate::error::SoapResult;
use crate::protocol_constants::{CAPABILITY_LEVEL, CAPABILITY_ON_OFF, MAX_BULB_LEVEL, SETUP_XML};
use crate::wemo::descriptor::{parse_device_descriptor, parse_device_status, parse_paired_devices};
use crate::wemo::services::WemoService;
use crate::wemo::soap::{SoapError, SoapRequestBuilder};
use crate::wemo::traits::DeviceClient;
use crate::wemo::types::{DeviceRecord, PairedDevice, StateValue};
use crate::wemo::utils::{derive_id, escape_xml};

/// Enumerates the devices paired to the bridge at `udn`.
pub async fn fetch_paired_devices(
    client: &dyn DeviceClient,
    udn: &str,
) -> SoapResult<Vec<PairedDevice>> {
    let body = SoapRequestBuilder::new(client)
        .service(WemoService::Bridge)
        .action("GetEndDevices")
        .arg("DevUDN", udn)
        .arg("ReqListType", "PAIRED_LIST")
        .call()
        .await?;

    let devices = parse_paired_devices(&body.require("DeviceLists")?);
    log::debug!(
        "[Bridge] {} reports {} paired device(s)",
        udn,
        devices.len()
    );
    Ok(devices)
}

/// Builds the `DeviceStatus` document for a single capability change.
fn device_status_document(device_id: &str, capability: &str, value: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "<DeviceStatus>",
            "<IsGroupAction>NO</IsGroupAction>",
            r#"<DeviceID available="YES">{}</DeviceID>"#,
            "<CapabilityID>{}</CapabilityID>",
            "<CapabilityValue>{}</CapabilityValue>",
            "</DeviceStatus>"
        ),
        escape_xml(device_id),
        capability,
        escape_xml(value)
    )
}

/// Converts a brightness percentage (clamped to 100) to a bulb level.
pub fn percent_to_level(percent: u8) -> u8 {
    let percent = u32::from(percent.min(100));
    let level = (percent * u32::from(MAX_BULB_LEVEL) + 50) / 100;
    level as u8
}

/// Handle to a Wemo Link bridge.
#[derive(Clone)]
pub struct Bridge {
    id: String,
    client: Arc<dyn DeviceClient>,
    udn: Option<String>,
    paired: Option<Vec<PairedDevice>>,
}

impl Bridge {
    /// Creates a bridge handle without cached details.
    ///
    /// The UDN is read from the bridge's descriptor on first use.
    pub fn new(id: impl Into<String>, client: Arc<dyn DeviceClient>) -> Self {
        Self {
            id: id.into(),
            client,
            udn: None,
            paired: None,
        }
    }

    /// Creates a bridge handle from its resolved record.
    pub fn from_record(record: &DeviceRecord, client: Arc<dyn DeviceClient>) -> Self {
        Self {
            id: record.id.clone(),
            client,
            udn: Some(record.udn.clone()).filter(|u| !u.is_empty()),
            paired: record.paired_devices.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn client(&self) -> &Arc<dyn DeviceClient> {
        &self.client
    }

    /// Returns the bridge UDN, fetching the descriptor if it isn't known.
    pub async fn udn(&self) -> SoapResult<String> {
        if let Some(udn) = &self.udn {
            return Ok(udn.clone());
        }
        let xml = self.client.info(SETUP_XML).await?;
        Ok(parse_device_descriptor(&xml)?.udn)
    }

    /// Returns the paired devices.
    ///
    /// Uses the list resolved at discovery time unless `refresh` is set or
    /// none was resolved, in which case the bridge is asked.
    pub async fn get_paired_devices(&self, refresh: bool) -> SoapResult<Vec<PairedDevice>> {
        if !refresh {
            if let Some(paired) = &self.paired {
                return Ok(paired.clone());
            }
        }
        let udn = self.udn().await?;
        fetch_paired_devices(self.client.as_ref(), &udn).await
    }

    /// Maps an id derived from a friendly name, or a raw `DeviceID`, to the
    /// bridge's `DeviceID`.
    pub async fn device_id_by_custom_id(&self, id: &str) -> SoapResult<Option<String>> {
        Ok(self.paired_device(id).await?.map(|p| p.device_id))
    }

    /// Returns the paired device with the given id or `DeviceID`.
    pub async fn paired_device(&self, id: &str) -> SoapResult<Option<PairedDevice>> {
        let derived = derive_id(id);
        Ok(self
            .get_paired_devices(false)
            .await?
            .into_iter()
            .find(|p| p.id == derived || p.device_id == id))
    }

    async fn set_device_status(
        &self,
        device_id: &str,
        capability: &str,
        value: &str,
    ) -> SoapResult<()> {
        let document = device_status_document(device_id, capability, value);
        let body = SoapRequestBuilder::new(self.client.as_ref())
            .service(WemoService::Bridge)
            .action("SetDeviceStatus")
            .arg("DeviceStatusList", document)
            .call()
            .await?;

        match body.field("ErrorDeviceIDs").filter(|ids| !ids.is_empty()) {
            Some(ids) => Err(SoapError::Fault {
                fault: format!("bridge rejected device(s) {}", ids),
                raw: body.raw().to_string(),
            }),
            None => Ok(()),
        }
    }

    pub async fn bulb_on(&self, device_id: &str) -> SoapResult<()> {
        log::info!("[Bridge] {} on", device_id);
        self.set_device_status(device_id, CAPABILITY_ON_OFF, "1")
            .await
    }

    pub async fn bulb_off(&self, device_id: &str) -> SoapResult<()> {
        log::info!("[Bridge] {} off", device_id);
        self.set_device_status(device_id, CAPABILITY_ON_OFF, "0")
            .await
    }

    /// Returns the raw `CapabilityValue` list of a bulb.
    pub async fn bulb_status(&self, device_id: &str) -> SoapResult<Vec<String>> {
        let body = SoapRequestBuilder::new(self.client.as_ref())
            .service(WemoService::Bridge)
            .action("GetDeviceStatus")
            .arg("DeviceIDs", device_id)
            .call()
            .await?;

        let statuses = parse_device_status(&body.require("DeviceStatusList")?);
        match statuses.into_iter().find(|(id, _)| id == device_id) {
            Some((_, value)) => Ok(value.split(',').map(str::to_string).collect()),
            None => Err(SoapError::Unwrap {
                reason: format!("no status for device {}", device_id),
                raw: body.raw().to_string(),
            }),
        }
    }

    /// Returns the on/off state of a bulb (first capability value).
    pub async fn bulb_state(&self, device_id: &str) -> SoapResult<StateValue> {
        let status = self.bulb_status(device_id).await?;
        Ok(status
            .first()
            .map(|s| StateValue::parse(s))
            .unwrap_or_default())
    }

    /// Sets the brightness level (0–255) of a bulb with no transition.
    pub async fn set_bulb_level(&self, device_id: &str, level: u8) -> SoapResult<()> {
        log::info!("[Bridge] {} level {}", device_id, level);
        self.set_device_status(device_id, CAPABILITY_LEVEL, &format!("{}:0", level))
            .await
    }

    /// Sets the brightness of a bulb as a percentage.
    pub async fn dim(&self, device_id: &str, percent: u8) -> SoapResult<()> {
        self.set_bulb_level(device_id, percent_to_level(percent))
            .await
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("id", &self.id)
            .field("udn", &self.udn)
            .field("paired", &self.paired.as_ref().map(Vec::len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wemo::test_fixtures::{
        MockDeviceClient, BRIDGE_SETUP_XML, GET_DEVICE_STATUS_RESPONSE, GET_END_DEVICES_RESPONSE,
        SET_DEVICE_STATUS_ERROR_RESPONSE, SET_DEVICE_STATUS_RESPONSE,
    };

    fn bridge(client: MockDeviceClient) -> (Bridge, Arc<MockDeviceClient>) {
        let client = Arc::new(client.with_descriptor(BRIDGE_SETUP_XML));
        (Bridge::new("wemo_link", client.clone()), client)
    }

    fn arg<'a>(args: &'a [(String, String)], name: &str) -> &'a str {
        args.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn percent_to_level_scales_and_clamps() {
        assert_eq!(percent_to_level(0), 0);
        assert_eq!(percent_to_level(50), 128);
        assert_eq!(percent_to_level(100), 255);
        assert_eq!(percent_to_level(250), 255);
    }

    #[test]
    fn device_status_document_layout() {
        let doc = device_status_document("94103EA2B27803ED", CAPABILITY_LEVEL, "128:0");
        assert!(doc.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><DeviceStatus>"#));
        assert!(doc.contains(r#"<DeviceID available="YES">94103EA2B27803ED</DeviceID>"#));
        assert!(doc.contains("<CapabilityID>10008</CapabilityID>"));
        assert!(doc.contains("<CapabilityValue>128:0</CapabilityValue>"));
    }

    #[tokio::test]
    async fn paired_devices_are_fetched_with_bridge_udn() {
        let (bridge, client) = bridge(
            MockDeviceClient::empty().with_response("GetEndDevices", GET_END_DEVICES_RESPONSE),
        );

        let devices = bridge.get_paired_devices(false).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "lounge_lamp");

        let request = client.last_request().unwrap();
        assert_eq!(request.service, WemoService::Bridge);
        assert_eq!(arg(&request.args, "DevUDN"), "uuid:Bridge-1_0-231445B0100500");
        assert_eq!(arg(&request.args, "ReqListType"), "PAIRED_LIST");
    }

    #[tokio::test]
    async fn cached_paired_devices_skip_the_network_unless_refreshed() {
        let client = Arc::new(
            MockDeviceClient::empty().with_response("GetEndDevices", GET_END_DEVICES_RESPONSE),
        );
        let record = DeviceRecord {
            id: "wemo_link".into(),
            ip: "127.0.0.1".into(),
            port: 49153,
            device_type: "urn:Belkin:device:bridge:1".into(),
            friendly_name: "Wemo Link".into(),
            model_name: "Bridge".into(),
            udn: "uuid:Bridge-1_0-231445B0100500".into(),
            role: crate::wemo::types::DeviceRole::Bridge,
            paired_devices: Some(Vec::new()),
        };
        let bridge = Bridge::from_record(&record, client.clone());

        assert!(bridge.get_paired_devices(false).await.unwrap().is_empty());
        assert_eq!(client.request_count(), 0);

        assert_eq!(bridge.get_paired_devices(true).await.unwrap().len(), 1);
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn custom_id_maps_to_device_id() {
        let (bridge, _) = bridge(
            MockDeviceClient::empty().with_response("GetEndDevices", GET_END_DEVICES_RESPONSE),
        );

        assert_eq!(
            bridge.device_id_by_custom_id("lounge_lamp").await.unwrap().as_deref(),
            Some("94103EA2B27803ED")
        );
        assert_eq!(
            bridge.device_id_by_custom_id("Lounge Lamp").await.unwrap().as_deref(),
            Some("94103EA2B27803ED")
        );
        assert_eq!(
            bridge.device_id_by_custom_id("94103EA2B27803ED").await.unwrap().as_deref(),
            Some("94103EA2B27803ED")
        );
        assert_eq!(bridge.device_id_by_custom_id("attic").await.unwrap(), None);
    }

    #[tokio::test]
    async fn paired_device_returns_full_entry() {
        let (bridge, _) = bridge(
            MockDeviceClient::empty().with_response("GetEndDevices", GET_END_DEVICES_RESPONSE),
        );

        let lamp = bridge.paired_device("Lounge Lamp").await.unwrap().unwrap();
        assert_eq!(lamp.id, "lounge_lamp");
        assert_eq!(lamp.product_name.as_deref(), Some("Lighting"));
        assert!(bridge.paired_device("attic").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bulb_on_sends_on_off_capability() {
        let (bridge, client) = bridge(
            MockDeviceClient::empty().with_response("SetDeviceStatus", SET_DEVICE_STATUS_RESPONSE),
        );

        bridge.bulb_on("94103EA2B27803ED").await.unwrap();

        let request = client.last_request().unwrap();
        assert_eq!(request.action, "SetDeviceStatus");
        let doc = arg(&request.args, "DeviceStatusList");
        assert!(doc.contains("<CapabilityID>10006</CapabilityID>"));
        assert!(doc.contains("<CapabilityValue>1</CapabilityValue>"));
    }

    #[tokio::test]
    async fn dim_sends_level_capability() {
        let (bridge, client) = bridge(
            MockDeviceClient::empty().with_response("SetDeviceStatus", SET_DEVICE_STATUS_RESPONSE),
        );

        bridge.dim("94103EA2B27803ED", 50).await.unwrap();

        let doc = arg(&client.last_request().unwrap().args, "DeviceStatusList").to_string();
        assert!(doc.contains("<CapabilityID>10008</CapabilityID>"));
        assert!(doc.contains("<CapabilityValue>128:0</CapabilityValue>"));
    }

    #[tokio::test]
    async fn error_device_ids_are_protocol_faults() {
        let (bridge, _) = bridge(
            MockDeviceClient::empty()
                .with_response("SetDeviceStatus", SET_DEVICE_STATUS_ERROR_RESPONSE),
        );

        assert!(matches!(
            bridge.bulb_off("94103EA2B27803ED").await,
            Err(SoapError::Fault { .. })
        ));
    }

    #[tokio::test]
    async fn bulb_state_is_first_capability_value() {
        let (bridge, _) = bridge(
            MockDeviceClient::empty().with_response("GetDeviceStatus", GET_DEVICE_STATUS_RESPONSE),
        );

        assert_eq!(
            bridge.bulb_status("94103EA2B27803ED").await.unwrap()[..2],
            ["1".to_string(), "128:0".to_string()]
        );
        assert_eq!(
            bridge.bulb_state("94103EA2B27803ED").await.unwrap(),
            StateValue::ON
        );
    }

    #[tokio::test]
    async fn bulb_calls_without_response_fail() {
        let (bridge, _) = bridge(MockDeviceClient::empty());
        assert!(matches!(
            bridge.bulb_state("94103EA2B27803ED").await,
            Err(SoapError::Unwrap { .. })
        ));
    }
}
