//! Binary state and Insight parameter commands.
//!
//! A [`Controller`] binds one device id and address to the service its role
//! owns. When a device answers a state command with an empty body (local or
//! simulated mode), the state is kept in the cache instead so `set` followed
//! by `get` still round-trips.

use std::sync::Arc;

use crate::cache::DeviceCache;
use crate::error::SoapResult;
use crate::wemo::services::WemoService;
use crate::wemo::soap::{unwrap_response, SoapRequestBuilder};
use crate::wemo::traits::DeviceClient;
use crate::wemo::types::{InsightParams, StateValue};

/// Control protocol bound to a single device.
#[derive(Clone)]
pub struct Controller {
    id: String,
    service: WemoService,
    client: Arc<dyn DeviceClient>,
    cache: DeviceCache,
}

impl Controller {
    pub fn new(
        id: impl Into<String>,
        service: WemoService,
        client: Arc<dyn DeviceClient>,
        cache: DeviceCache,
    ) -> Self {
        Self {
            id: id.into(),
            service,
            client,
            cache,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn client(&self) -> &Arc<dyn DeviceClient> {
        &self.client
    }

    /// Sets the binary state.
    ///
    /// # Errors
    /// Returns [`SoapError::Fault`](crate::wemo::soap::SoapError::Fault) if the
    /// device rejects the command.
    pub async fn set_binary_state(&self, value: &StateValue) -> SoapResult<()> {
        let raw = SoapRequestBuilder::new(self.client.as_ref())
            .service(self.service)
            .action("SetBinaryState")
            .arg("BinaryState", value.to_string())
            .send()
            .await?;

        if raw.trim().is_empty() {
            log::debug!(
                "[Wemo] {} gave no response to SetBinaryState, recording {} locally",
                self.id,
                value
            );
            self.cache.write_state(&self.id, value.clone());
            return Ok(());
        }

        unwrap_response(&raw)?.expect_response("SetBinaryState")?;
        log::info!("[Wemo] {} set to {}", self.id, value);
        Ok(())
    }

    /// Reads the binary state, falling back to the cached state (default off)
    /// when the device gives an empty response.
    pub async fn get_binary_state(&self) -> SoapResult<StateValue> {
        let raw = SoapRequestBuilder::new(self.client.as_ref())
            .service(self.service)
            .action("GetBinaryState")
            .send()
            .await?;

        if raw.trim().is_empty() {
            log::debug!("[Wemo] {} gave no response to GetBinaryState, using cache", self.id);
            return Ok(self.cache.read_state(&self.id));
        }

        let body = unwrap_response(&raw)?.expect_response("GetBinaryState")?;
        Ok(StateValue::parse(&body.require("BinaryState")?))
    }

    /// Reads the Insight power report. There is no local fallback.
    pub async fn get_insight_params(&self) -> SoapResult<InsightParams> {
        let body = SoapRequestBuilder::new(self.client.as_ref())
            .service(self.service)
            .action("GetInsightParams")
            .call()
            .await?;

        Ok(InsightParams::parse(&body.require("InsightParams")?))
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.id)
            .field("service", &self.service)
            .field("address", &format_args!("{}:{}", self.client.ip(), self.client.port()))
            .finish()
    }
}
