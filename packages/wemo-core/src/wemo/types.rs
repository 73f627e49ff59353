//! Domain types for discovered Wemo devices and their state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Control behaviour assigned to a device record at classification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    /// Wemo smart plug (also used for emulated sockets).
    Switch,
    /// In-wall light switch.
    LightSwitch,
    /// Smart plug with power telemetry.
    InsightSwitch,
    /// Wemo Link bridge managing paired bulbs.
    Bridge,
    /// Dimmable bulb paired to a bridge (never produced by classification).
    Bulb,
    /// Model not recognised; no handle can be built.
    #[serde(other)]
    Unknown,
}

impl DeviceRole {
    /// Returns true if a device handle can be constructed for this role.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Switch => "switch",
            Self::LightSwitch => "light_switch",
            Self::InsightSwitch => "insight_switch",
            Self::Bridge => "bridge",
            Self::Bulb => "bulb",
            Self::Unknown => "unknown",
        };
        f.pad(name)
    }
}

impl std::str::FromStr for DeviceRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "switch" => Ok(Self::Switch),
            "light_switch" => Ok(Self::LightSwitch),
            "insight_switch" => Ok(Self::InsightSwitch),
            "bridge" => Ok(Self::Bridge),
            "bulb" => Ok(Self::Bulb),
            other => Err(format!("unknown device role '{}'", other)),
        }
    }
}

/// Operations a device handle may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// `on`, `off`, `state`.
    Switchable,
    /// `params` (Insight power telemetry).
    ParamsReporting,
    /// `dim`.
    Dimmable,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switchable => write!(f, "switching"),
            Self::ParamsReporting => write!(f, "params reporting"),
            Self::Dimmable => write!(f, "dimming"),
        }
    }
}

/// A resolved Wemo device as stored in the cache.
///
/// Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    /// Lookup key derived from `friendly_name`.
    pub id: String,
    pub ip: String,
    pub port: u16,
    pub device_type: String,
    pub friendly_name: String,
    pub model_name: String,
    #[serde(rename = "UDN")]
    pub udn: String,
    pub role: DeviceRole,
    /// Sub-devices, only present on bridge records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_devices: Option<Vec<PairedDevice>>,
}

/// A bulb (or other end device) paired to a Wemo Link bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairedDevice {
    /// Lookup key derived from `friendly_name`, same rule as top-level ids.
    pub id: String,
    /// Bridge-assigned device id (`DeviceID`), used for routing commands.
    pub device_id: String,
    pub friendly_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability_ids: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<String>,
}

/// Last-known state of a device: binary 0/1, or whatever raw value the
/// device reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Number(i64),
    Text(String),
}

impl StateValue {
    /// The "off" state, also the default for devices with no recorded state.
    pub const OFF: StateValue = StateValue::Number(0);

    /// The "on" state.
    pub const ON: StateValue = StateValue::Number(1);

    /// Interprets a textual state reported by a device.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        raw.parse::<i64>()
            .map(Self::Number)
            .unwrap_or_else(|_| Self::Text(raw.to_string()))
    }

    /// Returns true unless the state is zero.
    ///
    /// Insight switches report `8` for standby and pipe-suffixed values on
    /// some firmware; only the leading field is considered.
    pub fn is_on(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0,
            Self::Text(s) => s
                .split('|')
                .next()
                .and_then(|first| first.trim().parse::<i64>().ok())
                .is_some_and(|n| n != 0),
        }
    }
}

impl Default for StateValue {
    fn default() -> Self {
        Self::OFF
    }
}

impl From<bool> for StateValue {
    fn from(on: bool) -> Self {
        if on {
            Self::ON
        } else {
            Self::OFF
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Parsed `GetInsightParams` report.
///
/// The device answers with a pipe-delimited string; field meaning is by
/// position. The raw string is kept because firmware revisions append fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightParams {
    raw: String,
    fields: Vec<String>,
}

impl InsightParams {
    /// Splits a raw parameter string.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let fields = raw.split('|').map(|f| f.trim().to_string()).collect();
        Self { raw, fields }
    }

    /// The string exactly as the device reported it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Field at `index`, if present.
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    fn numeric(&self, index: usize) -> Option<u64> {
        self.field(index).and_then(|f| f.parse().ok())
    }

    /// Binary state (0 off, 1 on, 8 standby).
    pub fn state(&self) -> Option<StateValue> {
        self.field(0).map(StateValue::parse)
    }

    /// Unix timestamp of the last state change.
    pub fn last_change(&self) -> Option<u64> {
        self.numeric(1)
    }

    /// Seconds the device has been on in the current session.
    pub fn on_for_secs(&self) -> Option<u64> {
        self.numeric(2)
    }

    /// Seconds on today.
    pub fn on_today_secs(&self) -> Option<u64> {
        self.numeric(3)
    }

    /// Seconds on over the reporting period.
    pub fn on_total_secs(&self) -> Option<u64> {
        self.numeric(4)
    }

    /// Length of the reporting period in seconds.
    pub fn time_period_secs(&self) -> Option<u64> {
        self.numeric(5)
    }

    /// Current power draw in milliwatts.
    pub fn current_power_mw(&self) -> Option<u64> {
        self.numeric(7)
    }

    /// Energy used today in milliwatt-minutes.
    pub fn today_mw_minutes(&self) -> Option<u64> {
        self.numeric(8)
    }

    /// Energy used over the reporting period in milliwatt-minutes.
    pub fn total_mw_minutes(&self) -> Option<f64> {
        self.field(9).and_then(|f| f.parse().ok())
    }

    /// Power draw above which the device reports "on" rather than standby.
    pub fn power_threshold_mw(&self) -> Option<u64> {
        self.numeric(10)
    }
}
