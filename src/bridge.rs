//! Authenticated access to a bridge's light endpoints.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::Timeouts;
use crate::errors::Error;
use crate::pairing::Credential;
use crate::payload::StatePayload;
use crate::response::{check_write, parse_resource};
use crate::status::{BridgeLight, LightReading};
use crate::transport::Transport;
use crate::types::LightId;

type Result<T> = std::result::Result<T, Error>;

/// IP address or hostname of a bridge on the local network.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BridgeAddress(String);

impl BridgeAddress {
    pub fn new(host: impl Into<String>) -> Self {
        BridgeAddress(host.into())
    }

    pub fn host(&self) -> &str {
        &self.0
    }

    /// `http://<host>/api`
    pub fn api_root(&self) -> String {
        format!("http://{}/api", self.0)
    }

    /// `http://<host>/api/config`, readable without a credential.
    pub fn config_url(&self) -> String {
        format!("http://{}/api/config", self.0)
    }

    pub fn description_url(&self) -> String {
        format!("http://{}/description.xml", self.0)
    }
}

impl fmt::Display for BridgeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client for one bridge and one credential.
///
/// # Example
///
/// ```
/// use hue_lights_rs::{BridgeAddress, BridgeClient, Credential, HttpTransport, Timeouts};
///
/// let client = BridgeClient::new(
///     HttpTransport::new(),
///     BridgeAddress::new("192.168.1.101"),
///     Credential::new("abc123"),
///     Timeouts::default(),
/// );
/// assert_eq!(client.address().host(), "192.168.1.101");
/// ```
#[derive(Debug, Clone)]
pub struct BridgeClient<T> {
    transport: T,
    address: BridgeAddress,
    credential: Credential,
    timeouts: Timeouts,
}

impl<T: Transport> BridgeClient<T> {
    pub fn new(
        transport: T,
        address: BridgeAddress,
        credential: Credential,
        timeouts: Timeouts,
    ) -> Self {
        BridgeClient {
            transport,
            address,
            credential,
            timeouts,
        }
    }

    pub fn address(&self) -> &BridgeAddress {
        &self.address
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    fn lights_url(&self) -> String {
        format!("{}/{}/lights", self.address.api_root(), self.credential.username())
    }

    fn light_url(&self, id: LightId) -> String {
        format!("{}/{}", self.lights_url(), id)
    }

    /// Fetch one light with an explicit timeout.
    pub async fn light_with_timeout(&self, id: LightId, timeout: Duration) -> Result<BridgeLight> {
        let resp = self.transport.get(&self.light_url(id), timeout).await?;
        parse_resource(resp)
    }

    /// Fetch one light using the read timeout.
    pub async fn light(&self, id: LightId) -> Result<BridgeLight> {
        self.light_with_timeout(id, self.timeouts.read).await
    }

    /// Current power and brightness of one light.
    pub async fn reading(&self, id: LightId) -> Result<LightReading> {
        self.light(id).await?.reading()
    }

    /// Fetch the whole light collection.
    ///
    /// Keys that are not positive integers are skipped.
    pub async fn lights(&self) -> Result<BTreeMap<LightId, BridgeLight>> {
        let resp = self.transport.get(&self.lights_url(), self.timeouts.read).await?;
        let raw: BTreeMap<String, BridgeLight> = parse_resource(resp)?;

        let mut lights = BTreeMap::new();
        for (key, light) in raw {
            match key.parse::<LightId>() {
                Ok(id) => {
                    lights.insert(id, light);
                }
                Err(e) => warn!("skipping light entry: {e}"),
            }
        }
        Ok(lights)
    }

    /// Apply a state change to one light.
    pub async fn set_state(&self, id: LightId, payload: &StatePayload) -> Result<()> {
        if !payload.is_valid() {
            return Err(Error::NoAttribute);
        }

        let body = serde_json::to_value(payload).map_err(Error::JsonDump)?;
        let url = format!("{}/state", self.light_url(id));
        debug!("PUT {url} {body}");
        let resp = self.transport.put_json(&url, &body, self.timeouts.write).await?;
        check_write(resp)
    }
}
