//! Parsing of `setup.xml` descriptors and the documents the bridge embeds
//! (escaped) inside its SOAP responses.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::SoapResult;
use crate::wemo::soap::SoapError;
use crate::wemo::types::PairedDevice;
use crate::wemo::utils::derive_id;

/// Identity fields read from a device's `setup.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub device_type: String,
    pub friendly_name: String,
    pub model_name: String,
    pub udn: String,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
}

/// Parses a device descriptor.
///
/// Only the top-level `root/device` element is read; embedded device lists
/// are ignored. `friendlyName` and `UDN` are required.
pub fn parse_device_descriptor(xml: &str) -> SoapResult<DeviceDescriptor> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut depth_in_device: Option<usize> = None;
    let mut depth = 0usize;
    let mut device_type = None;
    let mut friendly_name = None;
    let mut model_name = None;
    let mut udn = None;
    let mut serial_number = None;
    let mut firmware_version = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local_name = e.local_name();
                let name = local_name.as_ref();

                match depth_in_device {
                    None if name == b"device" => {
                        depth_in_device = Some(depth);
                        depth += 1;
                    }
                    Some(device_depth) if depth == device_depth + 1 => {
                        let slot = match name {
                            b"deviceType" => Some(&mut device_type),
                            b"friendlyName" => Some(&mut friendly_name),
                            b"modelName" => Some(&mut model_name),
                            b"UDN" => Some(&mut udn),
                            b"serialNumber" => Some(&mut serial_number),
                            b"firmwareVersion" => Some(&mut firmware_version),
                            _ => None,
                        };
                        match slot {
                            Some(slot) => {
                                *slot = reader
                                    .read_text(e.name())
                                    .ok()
                                    .map(|t| html_escape::decode_html_entities(&t).trim().to_string());
                            }
                            None => depth += 1,
                        }
                    }
                    _ => depth += 1,
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                if depth_in_device == Some(depth) {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::trace!("[Wemo] Error parsing device descriptor: {:?}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    let friendly_name = friendly_name
        .ok_or_else(|| SoapError::Descriptor("friendlyName missing".to_string()))?;
    let udn = udn.ok_or_else(|| SoapError::Descriptor("UDN missing".to_string()))?;

    Ok(DeviceDescriptor {
        device_type: device_type.unwrap_or_default(),
        friendly_name,
        model_name: model_name.unwrap_or_default(),
        udn,
        serial_number,
        firmware_version,
    })
}

/// Parses the `DeviceLists` document returned by `GetEndDevices`.
///
/// Every `DeviceInfo` becomes a [`PairedDevice`] with its id derived from
/// `FriendlyName`. Group entries (`GroupInfo`) are skipped.
pub fn parse_paired_devices(xml: &str) -> Vec<PairedDevice> {
    let mut devices = Vec::new();
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut in_info = false;
    let mut device_id = None;
    let mut friendly_name = None;
    let mut product_name = None;
    let mut capability_ids = None;
    let mut current_state = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"DeviceInfo" => {
                    in_info = true;
                    device_id = None;
                    friendly_name = None;
                    product_name = None;
                    capability_ids = None;
                    current_state = None;
                }
                name if in_info => {
                    let slot = match name {
                        b"DeviceID" => Some(&mut device_id),
                        b"FriendlyName" => Some(&mut friendly_name),
                        b"productName" => Some(&mut product_name),
                        b"CapabilityIDs" => Some(&mut capability_ids),
                        b"CurrentState" => Some(&mut current_state),
                        _ => None,
                    };
                    if let Some(slot) = slot {
                        *slot = reader
                            .read_text(e.name())
                            .ok()
                            .map(|t| html_escape::decode_html_entities(&t).trim().to_string());
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"DeviceInfo" => {
                in_info = false;
                match (device_id.take(), friendly_name.take()) {
                    (Some(device_id), Some(friendly_name)) => devices.push(PairedDevice {
                        id: derive_id(&friendly_name),
                        device_id,
                        friendly_name,
                        product_name: product_name.take(),
                        capability_ids: capability_ids.take(),
                        current_state: current_state.take().filter(|s| !s.is_empty()),
                    }),
                    _ => log::debug!("[Bridge] Skipping DeviceInfo without DeviceID/FriendlyName"),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("[Bridge] XML parse error in device list: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    devices
}

/// Parses a `DeviceStatusList` document into `(DeviceID, CapabilityValue)` pairs.
pub fn parse_device_status(xml: &str) -> Vec<(String, String)> {
    let mut statuses = Vec::new();
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut device_id: Option<String> = None;
    let mut value: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"DeviceStatus" => {
                    device_id = None;
                    value = None;
                }
                b"DeviceID" => {
                    device_id = reader.read_text(e.name()).ok().map(|t| t.trim().to_string());
                }
                b"CapabilityValue" => {
                    value = reader.read_text(e.name()).ok().map(|t| t.trim().to_string());
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"DeviceStatus" => {
                if let Some(id) = device_id.take() {
                    statuses.push((id, value.take().unwrap_or_default()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("[Bridge] XML parse error in device status: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    statuses
}
