//! Controller configuration.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::errors::Error;
use crate::types::LightId;

type Result<T> = std::result::Result<T, Error>;

/// Per-request timeouts.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Timeouts {
    /// `GET /api/config` against the fixed candidate
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub fixed_probe: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub cloud_lookup: Duration,
    /// Per host during the subnet scan
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub scan_probe: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub pairing: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub read: Duration,
    /// Single-light probe that validates the known-lights cache
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub validate: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            fixed_probe: Duration::from_secs(2),
            cloud_lookup: Duration::from_secs(3),
            scan_probe: Duration::from_millis(500),
            pairing: Duration::from_secs(5),
            read: Duration::from_secs(3),
            validate: Duration::from_secs(1),
            write: Duration::from_secs(3),
        }
    }
}

/// Everything the controller needs to find and talk to the bridge.
///
/// Every field has a default, so an empty JSON object is a valid file.
///
/// # Example
///
/// ```
/// use hue_lights_rs::ControllerConfig;
///
/// let json = r#"{"fixedIp": "10.0.0.2", "pollIntervalMs": 2000}"#;
/// let config = ControllerConfig::from_json(json).unwrap();
/// assert_eq!(config.fixed_ip.as_deref(), Some("10.0.0.2"));
/// assert_eq!(config.poll_interval.as_secs(), 2);
/// assert_eq!(config.device_type, "huecontroller#desktop");
/// ```
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerConfig {
    /// Candidate bridge address tried before any discovery
    pub fixed_ip: Option<String>,
    pub discovery_url: String,
    /// Any address inside the /24 to scan; detected from local interfaces when unset
    pub scan_subnet: Option<Ipv4Addr>,
    /// Case-insensitive marker expected in a bridge's `description.xml`
    pub bridge_marker: String,
    pub scan_concurrency: usize,
    /// Sent as `devicetype` when pairing
    pub device_type: String,
    pub credential_path: PathBuf,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "pollIntervalMs")]
    pub poll_interval: Duration,
    /// Seeds the known-lights cache
    pub known_lights: BTreeMap<LightId, String>,
    pub timeouts: Timeouts,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            fixed_ip: Some(Self::DEFAULT_FIXED_IP.to_string()),
            discovery_url: Self::DEFAULT_DISCOVERY_URL.to_string(),
            scan_subnet: None,
            bridge_marker: "hue bridge".to_string(),
            scan_concurrency: 32,
            device_type: "huecontroller#desktop".to_string(),
            credential_path: PathBuf::from(Self::DEFAULT_CREDENTIAL_FILE),
            poll_interval: Duration::from_secs(5),
            known_lights: BTreeMap::new(),
            timeouts: Timeouts::default(),
        }
    }
}

impl ControllerConfig {
    pub const DEFAULT_FIXED_IP: &'static str = "192.168.1.101";
    pub const DEFAULT_DISCOVERY_URL: &'static str = "https://discovery.meethue.com/";
    pub const DEFAULT_CREDENTIAL_FILE: &'static str = "hue_user.json";
    pub const DEFAULT_CONFIG_FILE: &'static str = "hue_config.json";

    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::JsonLoad)
    }

    /// Load from a JSON file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::io("read config", e)),
        }
    }
}
