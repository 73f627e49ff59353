//! Shared test fixtures: device payloads and mock transports.
//!
//! These are used by multiple test modules to avoid duplication.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{DiscoveryResult, SoapResult};
use crate::wemo::discovery::{Advertisement, DiscoveryError};
use crate::wemo::services::WemoService;
use crate::wemo::soap::SoapError;
use crate::wemo::traits::{Connector, DeviceClient, ScanTransport};

// ─────────────────────────────────────────────────────────────────────────────
// Payloads
// ─────────────────────────────────────────────────────────────────────────────

/// `setup.xml` of a Wemo smart plug.
pub const SOCKET_SETUP_XML: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:Belkin:device-1-0">
  <specVersion>
    <major>1</major>
    <minor>0</minor>
  </specVersion>
  <device>
    <deviceType>urn:Belkin:device:controllee:1</deviceType>
    <friendlyName>Living Room Switch</friendlyName>
    <manufacturer>Belkin International Inc.</manufacturer>
    <modelName>Socket</modelName>
    <modelNumber>1.0</modelNumber>
    <serialNumber>221517K0101769</serialNumber>
    <UDN>uuid:Socket-1_0-221517K0101769</UDN>
    <firmwareVersion>WeMo_WW_2.00.10966.PVT-OWRT-SNS</firmwareVersion>
    <serviceList>
      <service>
        <serviceType>urn:Belkin:service:basicevent:1</serviceType>
        <controlURL>/upnp/control/basicevent1</controlURL>
      </service>
    </serviceList>
  </device>
</root>"#;

/// `setup.xml` of an Insight switch.
pub const INSIGHT_SETUP_XML: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:Belkin:device-1-0">
  <device>
    <deviceType>urn:Belkin:device:insight:1</deviceType>
    <friendlyName>Insight</friendlyName>
    <modelName>Insight</modelName>
    <UDN>uuid:Insight-1_0-231550K1200F9D</UDN>
  </device>
</root>"#;

/// `setup.xml` of a Wemo Link bridge, including its own nested device list.
pub const BRIDGE_SETUP_XML: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:Belkin:device-1-0">
  <device>
    <deviceType>urn:Belkin:device:bridge:1</deviceType>
    <friendlyName>Wemo Link</friendlyName>
    <modelName>Bridge</modelName>
    <UDN>uuid:Bridge-1_0-231445B0100500</UDN>
    <deviceList>
      <device>
        <deviceType>urn:Belkin:device:light:1</deviceType>
        <friendlyName>Nested Light</friendlyName>
        <UDN>uuid:Nested</UDN>
      </device>
    </deviceList>
  </device>
</root>"#;

/// `setup.xml` published by a fauxmo-style emulator.
pub const EMULATED_SETUP_XML: &str = r#"<?xml version="1.0"?>
<root>
  <device>
    <deviceType>urn:MakerMusings:device:controllee:1</deviceType>
    <friendlyName>Fake Plug</friendlyName>
    <manufacturer>Belkin International Inc.</manufacturer>
    <modelName>Emulated Socket</modelName>
    <modelNumber>3.1415</modelNumber>
    <UDN>uuid:Socket-1_0-38323636-4558-4dda-9188-cda0e6cc3dc0</UDN>
  </device>
</root>"#;

/// `setup.xml` of a model no classifier recognises.
pub const COFFEE_SETUP_XML: &str = r#"<?xml version="1.0"?>
<root>
  <device>
    <deviceType>urn:Belkin:device:CoffeeMaker:1</deviceType>
    <friendlyName>Coffee Maker</friendlyName>
    <modelName>CoffeeMaker</modelName>
    <UDN>uuid:CoffeeMaker-1_0-231313K1200ABC</UDN>
  </device>
</root>"#;

/// Successful `GetBinaryState` response.
pub const GET_BINARY_STATE_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body>
<u:GetBinaryStateResponse xmlns:u="urn:Belkin:service:basicevent:1">
<BinaryState>1</BinaryState>
</u:GetBinaryStateResponse>
</s:Body> </s:Envelope>"#;

/// Successful `SetBinaryState` response.
pub const SET_BINARY_STATE_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body>
<u:SetBinaryStateResponse xmlns:u="urn:Belkin:service:basicevent:1">
<BinaryState>0</BinaryState>
</u:SetBinaryStateResponse>
</s:Body> </s:Envelope>"#;

/// Raw Insight parameter string.
pub const INSIGHT_PARAMS: &str = "8|1455733157|0|0|0|1209600|0|8280|47054|487999.000000|8000";

/// Successful `GetInsightParams` response.
pub const GET_INSIGHT_PARAMS_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body>
<u:GetInsightParamsResponse xmlns:u="urn:Belkin:service:insight:1">
<InsightParams>8|1455733157|0|0|0|1209600|0|8280|47054|487999.000000|8000</InsightParams>
</u:GetInsightParamsResponse>
</s:Body> </s:Envelope>"#;

/// UPnP fault response.
pub const FAULT_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>501</errorCode><errorDescription>Action Failed</errorDescription></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;

/// A non-empty response that is not a SOAP envelope.
pub const NOT_AN_ENVELOPE: &str = "<html><body>Not Found</body></html>";

/// Decoded `DeviceLists` document returned by a bridge.
pub const DEVICE_LISTS: &str = r#"<?xml version="1.0" encoding="utf-8"?><DeviceLists><DeviceList><DeviceListType>Paired</DeviceListType><DeviceInfos><DeviceInfo><DeviceIndex>0</DeviceIndex><DeviceID>94103EA2B27803ED</DeviceID><FriendlyName>Lounge Lamp</FriendlyName><IconVersion>1</IconVersion><FirmwareVersion>83</FirmwareVersion><CapabilityIDs>10006,10008,30008,30009,3000A</CapabilityIDs><CurrentState>0,255:0,,,</CurrentState><Manufacturer>MRVL</Manufacturer><ModelCode>MZ100</ModelCode><productName>Lighting</productName><WeMoCertified>YES</WeMoCertified></DeviceInfo><DeviceInfo><DeviceIndex>1</DeviceIndex><DeviceID>94103EA2B2782FD1</DeviceID><FriendlyName>Porch Light</FriendlyName><CapabilityIDs>10006,10008</CapabilityIDs><CurrentState>1,128:0</CurrentState><productName>Lighting</productName></DeviceInfo></DeviceInfos></DeviceList></DeviceLists>"#;

/// `GetEndDevices` response wrapping [`DEVICE_LISTS`] as escaped text.
pub const GET_END_DEVICES_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body>
<u:GetEndDevicesResponse xmlns:u="urn:Belkin:service:bridge:1">
<DeviceLists>&lt;?xml version=&quot;1.0&quot; encoding=&quot;utf-8&quot;?&gt;&lt;DeviceLists&gt;&lt;DeviceList&gt;&lt;DeviceListType&gt;Paired&lt;/DeviceListType&gt;&lt;DeviceInfos&gt;&lt;DeviceInfo&gt;&lt;DeviceIndex&gt;0&lt;/DeviceIndex&gt;&lt;DeviceID&gt;94103EA2B27803ED&lt;/DeviceID&gt;&lt;FriendlyName&gt;Lounge Lamp&lt;/FriendlyName&gt;&lt;CapabilityIDs&gt;10006,10008,30008,30009,3000A&lt;/CapabilityIDs&gt;&lt;CurrentState&gt;0,255:0,,,&lt;/CurrentState&gt;&lt;productName&gt;Lighting&lt;/productName&gt;&lt;/DeviceInfo&gt;&lt;/DeviceInfos&gt;&lt;/DeviceList&gt;&lt;/DeviceLists&gt;</DeviceLists>
</u:GetEndDevicesResponse>
</s:Body> </s:Envelope>"#;

/// Decoded `DeviceStatusList` document.
pub const DEVICE_STATUS_LIST: &str = r#"<?xml version="1.0" encoding="utf-8"?><DeviceStatusList><DeviceStatus><IsGroupAction>NO</IsGroupAction><DeviceID available="YES">94103EA2B27803ED</DeviceID><CapabilityID>10006,10008,30008,30009,3000A</CapabilityID><CapabilityValue>1,128:0,,,</CapabilityValue><LastEventTimeStamp>0</LastEventTimeStamp></DeviceStatus></DeviceStatusList>"#;

/// `GetDeviceStatus` response wrapping [`DEVICE_STATUS_LIST`].
pub const GET_DEVICE_STATUS_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body>
<u:GetDeviceStatusResponse xmlns:u="urn:Belkin:service:bridge:1">
<DeviceStatusList>&lt;?xml version=&quot;1.0&quot; encoding=&quot;utf-8&quot;?&gt;&lt;DeviceStatusList&gt;&lt;DeviceStatus&gt;&lt;IsGroupAction&gt;NO&lt;/IsGroupAction&gt;&lt;DeviceID available=&quot;YES&quot;&gt;94103EA2B27803ED&lt;/DeviceID&gt;&lt;CapabilityID&gt;10006,10008,30008,30009,3000A&lt;/CapabilityID&gt;&lt;CapabilityValue&gt;1,128:0,,,&lt;/CapabilityValue&gt;&lt;/DeviceStatus&gt;&lt;/DeviceStatusList&gt;</DeviceStatusList>
</u:GetDeviceStatusResponse>
</s:Body> </s:Envelope>"#;

/// Successful `SetDeviceStatus` response.
pub const SET_DEVICE_STATUS_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body>
<u:SetDeviceStatusResponse xmlns:u="urn:Belkin:service:bridge:1">
<ErrorDeviceIDs></ErrorDeviceIDs>
</u:SetDeviceStatusResponse>
</s:Body> </s:Envelope>"#;

/// `SetDeviceStatus` response reporting a failed device.
pub const SET_DEVICE_STATUS_ERROR_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:SetDeviceStatusResponse xmlns:u="urn:Belkin:service:bridge:1"><ErrorDeviceIDs>94103EA2B27803ED</ErrorDeviceIDs></u:SetDeviceStatusResponse></s:Body></s:Envelope>"#;

/// Builds an SSDP response advertising `location`.
pub fn ssdp_response(location: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         CACHE-CONTROL: max-age=86400\r\n\
         EXT:\r\n\
         LOCATION: {}\r\n\
         OPT: \"http://schemas.upnp.org/upnp/1/0/\"; ns=01\r\n\
         SERVER: Unspecified, UPnP/1.0, Unspecified\r\n\
         ST: urn:Belkin:service:basicevent:1\r\n\
         USN: uuid:Socket-1_0-221517K0101769::urn:Belkin:service:basicevent:1\r\n\r\n",
        location
    )
}

/// Builds an advertisement from `ip` on port 1900 pointing at `ip:port`.
pub fn advertisement(ip: &str, port: u16) -> Advertisement {
    let sender: SocketAddr = format!("{}:1900", ip).parse().expect("valid test address");
    Advertisement {
        sender,
        payload: ssdp_response(&format!("http://{}:{}/setup.xml", ip, port)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock Transports
// ─────────────────────────────────────────────────────────────────────────────

/// A recorded control request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub service: WemoService,
    pub action: String,
    pub args: Vec<(String, String)>,
}

/// Mock device answering from canned payloads.
///
/// Actions without a canned response answer with an empty body, which is
/// what a device in local/simulated mode does.
pub struct MockDeviceClient {
    ip: String,
    port: u16,
    descriptor: Option<String>,
    responses: Mutex<HashMap<String, String>>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl MockDeviceClient {
    pub fn new(ip: &str, port: u16) -> Self {
        Self {
            ip: ip.to_string(),
            port,
            descriptor: None,
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A device that answers every control request with an empty body.
    pub fn empty() -> Self {
        Self::new("127.0.0.1", 49153)
    }

    pub fn with_descriptor(mut self, xml: &str) -> Self {
        self.descriptor = Some(xml.to_string());
        self
    }

    pub fn with_response(self, action: &str, body: &str) -> Self {
        self.responses
            .lock()
            .insert(action.to_string(), body.to_string());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl DeviceClient for MockDeviceClient {
    fn ip(&self) -> &str {
        &self.ip
    }

    fn port(&self) -> u16 {
        self.port
    }

    async fn info(&self, _resource: &str) -> SoapResult<String> {
        self.descriptor
            .clone()
            .ok_or_else(|| SoapError::HttpStatus(404, "no descriptor".to_string()))
    }

    async fn request(
        &self,
        service: WemoService,
        action: &str,
        args: &[(&str, &str)],
    ) -> SoapResult<String> {
        self.requests.lock().push(RecordedRequest {
            service,
            action: action.to_string(),
            args: args
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        Ok(self
            .responses
            .lock()
            .get(action)
            .cloned()
            .unwrap_or_default())
    }
}

/// Connector handing out pre-registered mock clients by IP.
#[derive(Default)]
pub struct MockConnector {
    clients: Mutex<HashMap<String, Arc<MockDeviceClient>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(self, client: MockDeviceClient) -> Self {
        self.clients
            .lock()
            .insert(client.ip.clone(), Arc::new(client));
        self
    }

    pub fn client(&self, ip: &str) -> Option<Arc<MockDeviceClient>> {
        self.clients.lock().get(ip).cloned()
    }
}

impl Connector for MockConnector {
    fn connect(&self, ip: &str, port: u16) -> Arc<dyn DeviceClient> {
        match self.client(ip) {
            Some(client) => client,
            None => Arc::new(MockDeviceClient::new(ip, port)),
        }
    }
}

/// Scanner returning a fixed set of advertisements and counting searches.
pub struct MockScanner {
    advertisements: Vec<Advertisement>,
    fail: bool,
    pub searches: AtomicUsize,
}

impl MockScanner {
    pub fn new(advertisements: Vec<Advertisement>) -> Self {
        Self {
            advertisements,
            fail: false,
            searches: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScanTransport for MockScanner {
    async fn search(
        &self,
        _search_target: &str,
        _window: Duration,
    ) -> DiscoveryResult<Vec<Advertisement>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DiscoveryError::SocketBind(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "mock scan failure",
            )));
        }
        Ok(self.advertisements.clone())
    }
}
