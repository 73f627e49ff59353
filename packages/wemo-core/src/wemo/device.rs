//! Device handles.
//!
//! A [`Device`] binds an id and a resolved address to the control protocol
//! of its role. Every handle exposes the same operations; the ones its role
//! lacks fail with [`WemoError::Unsupported`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::DeviceCache;
use crate::error::{WemoError, WemoResult};
use crate::wemo::bridge::Bridge;
use crate::wemo::control::Controller;
use crate::wemo::services::WemoService;
use crate::wemo::traits::DeviceClient;
use crate::wemo::types::{Capability, DeviceRecord, DeviceRole, InsightParams, StateValue};

/// Returns the capabilities offered by handles of `role`.
pub fn role_capabilities(role: DeviceRole) -> &'static [Capability] {
    match role {
        DeviceRole::Switch | DeviceRole::LightSwitch => &[Capability::Switchable],
        DeviceRole::InsightSwitch => &[Capability::Switchable, Capability::ParamsReporting],
        DeviceRole::Bulb => &[Capability::Switchable, Capability::Dimmable],
        DeviceRole::Bridge | DeviceRole::Unknown => &[],
    }
}

enum DeviceKind {
    Switch(Controller),
    Bridge(Bridge),
    Bulb { bridge: Bridge, device_id: String },
}

/// Handle to a controllable device.
pub struct Device {
    id: String,
    role: DeviceRole,
    kind: DeviceKind,
}

impl Device {
    /// Creates a switch-like handle (switch, light switch, insight switch).
    pub fn switch(id: impl Into<String>, role: DeviceRole, controller: Controller) -> Self {
        Self {
            id: id.into(),
            role,
            kind: DeviceKind::Switch(controller),
        }
    }

    /// Creates a bridge handle.
    pub fn bridge(bridge: Bridge) -> Self {
        Self {
            id: bridge.id().to_string(),
            role: DeviceRole::Bridge,
            kind: DeviceKind::Bridge(bridge),
        }
    }

    /// Creates a bulb handle routed through `bridge`.
    pub fn bulb(id: impl Into<String>, bridge: Bridge, device_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: DeviceRole::Bulb,
            kind: DeviceKind::Bulb {
                bridge,
                device_id: device_id.into(),
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> DeviceRole {
        self.role
    }

    fn client(&self) -> &Arc<dyn DeviceClient> {
        match &self.kind {
            DeviceKind::Switch(ctl) => ctl.client(),
            DeviceKind::Bridge(bridge) | DeviceKind::Bulb { bridge, .. } => bridge.client(),
        }
    }

    /// IP address the handle talks to (the bridge's, for bulbs).
    pub fn ip(&self) -> &str {
        self.client().ip()
    }

    pub fn port(&self) -> u16 {
        self.client().port()
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        role_capabilities(self.role)
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn is_dimmable(&self) -> bool {
        self.has_capability(Capability::Dimmable)
    }

    /// The bridge behind a bridge or bulb handle.
    pub fn as_bridge(&self) -> Option<&Bridge> {
        match &self.kind {
            DeviceKind::Bridge(bridge) | DeviceKind::Bulb { bridge, .. } => Some(bridge),
            DeviceKind::Switch(_) => None,
        }
    }

    /// The bridge-assigned `DeviceID` of a bulb handle.
    pub fn bulb_device_id(&self) -> Option<&str> {
        match &self.kind {
            DeviceKind::Bulb { device_id, .. } => Some(device_id),
            _ => None,
        }
    }

    fn unsupported(&self, capability: Capability) -> WemoError {
        WemoError::Unsupported {
            id: self.id.clone(),
            role: self.role,
            capability,
        }
    }

    async fn set_on(&self, on: bool) -> WemoResult<()> {
        match &self.kind {
            DeviceKind::Switch(ctl) => Ok(ctl.set_binary_state(&StateValue::from(on)).await?),
            DeviceKind::Bulb { bridge, device_id } if on => Ok(bridge.bulb_on(device_id).await?),
            DeviceKind::Bulb { bridge, device_id } => Ok(bridge.bulb_off(device_id).await?),
            DeviceKind::Bridge(_) => Err(self.unsupported(Capability::Switchable)),
        }
    }

    pub async fn on(&self) -> WemoResult<()> {
        self.set_on(true).await
    }

    pub async fn off(&self) -> WemoResult<()> {
        self.set_on(false).await
    }

    /// Current state: the reported binary state, or the first capability
    /// value for bulbs.
    pub async fn state(&self) -> WemoResult<StateValue> {
        match &self.kind {
            DeviceKind::Switch(ctl) => Ok(ctl.get_binary_state().await?),
            DeviceKind::Bulb { bridge, device_id } => Ok(bridge.bulb_state(device_id).await?),
            DeviceKind::Bridge(_) => Err(self.unsupported(Capability::Switchable)),
        }
    }

    /// Insight power report.
    pub async fn params(&self) -> WemoResult<InsightParams> {
        match &self.kind {
            DeviceKind::Switch(ctl) if self.has_capability(Capability::ParamsReporting) => {
                Ok(ctl.get_insight_params().await?)
            }
            _ => Err(self.unsupported(Capability::ParamsReporting)),
        }
    }

    /// Sets brightness as a percentage (values above 100 are clamped).
    pub async fn dim(&self, percent: u8) -> WemoResult<()> {
        match &self.kind {
            DeviceKind::Bulb { bridge, device_id } => Ok(bridge.dim(device_id, percent).await?),
            _ => Err(self.unsupported(Capability::Dimmable)),
        }
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("ip", &self.ip())
            .field("port", &self.port())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Constructor Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a constructor needs to build a top-level handle.
pub struct HandleParts {
    /// Id the handle answers to (also the state key for the cache fallback).
    pub id: String,
    pub role: DeviceRole,
    pub client: Arc<dyn DeviceClient>,
    pub cache: DeviceCache,
    /// Resolved record, absent for handles built from a literal address.
    pub record: Option<DeviceRecord>,
}

/// Builds a handle for one role.
pub type HandleConstructor = fn(HandleParts) -> Device;

fn service_for(role: DeviceRole) -> WemoService {
    match role {
        DeviceRole::InsightSwitch => WemoService::Insight,
        DeviceRole::Bridge | DeviceRole::Bulb => WemoService::Bridge,
        _ => WemoService::BasicEvent,
    }
}

fn build_switch(parts: HandleParts) -> Device {
    let controller = Controller::new(
        parts.id.clone(),
        service_for(parts.role),
        parts.client,
        parts.cache,
    );
    Device::switch(parts.id, parts.role, controller)
}

fn build_bridge(parts: HandleParts) -> Device {
    let bridge = match &parts.record {
        Some(record) => Bridge::from_record(record, parts.client),
        None => Bridge::new(parts.id, parts.client),
    };
    Device::bridge(bridge)
}

/// Role to constructor table.
///
/// Bulbs are not in the default table: they are built from their bridge.
#[derive(Clone)]
pub struct HandleRegistry {
    constructors: HashMap<DeviceRole, HandleConstructor>,
}

impl HandleRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registers (or replaces) the constructor for `role`.
    pub fn register(&mut self, role: DeviceRole, constructor: HandleConstructor) {
        self.constructors.insert(role, constructor);
    }

    pub fn supports(&self, role: DeviceRole) -> bool {
        self.constructors.contains_key(&role)
    }

    /// Builds a handle for `parts.role`.
    ///
    /// # Errors
    /// Returns [`WemoError::NoHandle`] if no constructor is registered.
    pub fn build(&self, parts: HandleParts) -> WemoResult<Device> {
        match self.constructors.get(&parts.role) {
            Some(constructor) => Ok(constructor(parts)),
            None => Err(WemoError::NoHandle {
                id: parts.id,
                role: parts.role,
            }),
        }
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(DeviceRole::Switch, build_switch);
        registry.register(DeviceRole::LightSwitch, build_switch);
        registry.register(DeviceRole::InsightSwitch, build_switch);
        registry.register(DeviceRole::Bridge, build_bridge);
        registry
    }
}

impl std::fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}
