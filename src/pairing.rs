//! Pairing with the bridge and persisting the issued credential.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::bridge::BridgeAddress;
use crate::errors::Error;
use crate::response::{self, ApiEntry};
use crate::transport::Transport;

type Result<T> = std::result::Result<T, Error>;

/// API username issued by the bridge after a link-button press.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Credential {
    username: String,
}

impl Credential {
    pub fn new(username: impl Into<String>) -> Self {
        Credential {
            username: username.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Keeps the token out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("username", &"<redacted>").finish()
    }
}

/// Register a new API user on the bridge.
///
/// The user must press the bridge's link button shortly before this call.
/// Any answer other than a `success` entry carrying a `username` is
/// reported as [`Error::PairingRejected`] so the caller can prompt for
/// another attempt.
pub async fn pair<T: Transport>(
    transport: &T,
    address: &BridgeAddress,
    device_type: &str,
    timeout: Duration,
) -> Result<Credential> {
    let body = json!({ "devicetype": device_type });
    let resp = transport.post_json(&address.api_root(), &body, timeout).await?;
    debug!("pairing response from {address}: {}", resp.body);

    match response::first_entry(&resp).unwrap_or_default() {
        Some(ApiEntry::Success(success)) => {
            match success.get("username").and_then(|u| u.as_str()) {
                Some(username) => {
                    info!("paired with bridge at {address}");
                    Ok(Credential::new(username))
                }
                None => Err(Error::PairingRejected(
                    "response carried no username".to_string(),
                )),
            }
        }
        Some(ApiEntry::Error(err)) => {
            warn!("bridge refused pairing: {} ({})", err.description, err.kind);
            Err(Error::PairingRejected(err.description))
        }
        None => Err(Error::PairingRejected("unexpected response".to_string())),
    }
}

/// Credential file holding `{"username": "<token>"}`.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CredentialStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored credential; a missing file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<Credential>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io("read credential", e)),
        };
        let credential: Credential = serde_json::from_str(&json).map_err(Error::JsonLoad)?;
        Ok(Some(credential))
    }

    pub fn save(&self, credential: &Credential) -> Result<()> {
        let json = serde_json::to_string(credential).map_err(Error::JsonDump)?;
        std::fs::write(&self.path, json).map_err(|e| Error::io("write credential", e))
    }
}
