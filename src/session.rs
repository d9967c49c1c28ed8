//! Startup flow: find the bridge, load or obtain a credential, discover lights.

use log::{info, warn};

use crate::bridge::{BridgeAddress, BridgeClient};
use crate::cache::{KnownLights, discover_lights};
use crate::config::ControllerConfig;
use crate::controller::Controller;
use crate::discovery::{BridgeLocator, DiscoveredBridge};
use crate::errors::Error;
use crate::pairing::{Credential, CredentialStore, pair};
use crate::transport::Transport;

type Result<T> = std::result::Result<T, Error>;

/// Where the startup flow stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No bridge was found; light functionality is disabled
    NoBridge,
    /// A bridge was found but there is no credential yet
    Unpaired,
    Paired,
}

/// Application state assembled at startup.
///
/// # Example
///
/// ```no_run
/// use hue_lights_rs::{ControllerConfig, HttpTransport, Session, SessionState};
///
/// # async fn run() -> Result<(), hue_lights_rs::Error> {
/// let config = ControllerConfig::load(ControllerConfig::DEFAULT_CONFIG_FILE)?;
/// let mut session = Session::start(config, HttpTransport::new()).await;
/// if session.state() == SessionState::Unpaired {
///     // Ask the user to press the link button first.
///     session.pair().await?;
/// }
/// let mut known = session.known_lights();
/// let mut controller = session.controller(&mut known).await;
/// controller.poll().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session<T> {
    config: ControllerConfig,
    transport: T,
    bridge: Option<DiscoveredBridge>,
    credential: Option<Credential>,
    store: CredentialStore,
}

impl<T: Transport> Session<T> {
    /// Locate the bridge and load the stored credential.
    pub async fn start(config: ControllerConfig, transport: T) -> Self {
        let bridge = BridgeLocator::new(transport.clone(), config.clone()).locate().await;
        Self::with_bridge(config, transport, bridge)
    }

    /// Build a session for an already resolved bridge (or none).
    pub fn with_bridge(
        config: ControllerConfig,
        transport: T,
        bridge: Option<DiscoveredBridge>,
    ) -> Self {
        let store = CredentialStore::new(&config.credential_path);
        let credential = match store.load() {
            Ok(credential) => credential,
            Err(e) => {
                warn!("ignoring unreadable credential file {}: {e}", store.path().display());
                None
            }
        };

        Session {
            config,
            transport,
            bridge,
            credential,
            store,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        match (&self.bridge, &self.credential) {
            (None, _) => SessionState::NoBridge,
            (Some(_), None) => SessionState::Unpaired,
            (Some(_), Some(_)) => SessionState::Paired,
        }
    }

    pub fn bridge(&self) -> Option<&DiscoveredBridge> {
        self.bridge.as_ref()
    }

    pub fn address(&self) -> Option<&BridgeAddress> {
        self.bridge.as_ref().map(|b| &b.address)
    }

    /// Pair with the bridge and persist the credential.
    ///
    /// Failures are not fatal; call again after the user pressed the link
    /// button. A credential that cannot be written is still used for this
    /// run.
    pub async fn pair(&mut self) -> Result<&Credential> {
        let address = self.address().ok_or(Error::NoBridge)?.clone();
        let credential = pair(
            &self.transport,
            &address,
            &self.config.device_type,
            self.config.timeouts.pairing,
        )
        .await?;

        match self.store.save(&credential) {
            Ok(()) => info!("credential saved to {}", self.store.path().display()),
            Err(e) => warn!("could not save credential: {e}"),
        }
        Ok(self.credential.insert(credential))
    }

    /// A client for the paired bridge.
    pub fn client(&self) -> Result<BridgeClient<T>> {
        let address = self.address().ok_or(Error::NoBridge)?;
        let credential = self.credential.as_ref().ok_or(Error::NotPaired)?;
        Ok(BridgeClient::new(
            self.transport.clone(),
            address.clone(),
            credential.clone(),
            self.config.timeouts.clone(),
        ))
    }

    /// The known-lights cache seeded from the configuration.
    pub fn known_lights(&self) -> KnownLights {
        KnownLights::new(self.config.known_lights.clone())
    }

    /// Discover lights and build a controller.
    ///
    /// Without a bridge or credential the controller is offline with no
    /// lights.
    pub async fn controller(&self, known: &mut KnownLights) -> Controller<T> {
        match self.client() {
            Ok(client) => {
                let lights = discover_lights(&client, known).await;
                info!("{} lights available", lights.len());
                Controller::new(client, &lights, self.config.poll_interval)
            }
            Err(e) => {
                warn!("light control disabled: {e}");
                Controller::offline(self.config.poll_interval)
            }
        }
    }
}
