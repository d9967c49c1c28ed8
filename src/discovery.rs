//! Bridge discovery.
//!
//! The locator walks a fixed chain of strategies and stops at the first one
//! that yields an address:
//!
//! 1. [`Strategy::FixedIp`]: `GET /api/config` on the configured candidate,
//!    accepted on HTTP 200.
//! 2. [`Strategy::Cloud`]: the Hue cloud discovery service, accepted when the
//!    first entry carries an `internalipaddress`.
//! 3. [`Strategy::LanScan`]: `GET /description.xml` on every host of the
//!    local /24, accepting the first body containing the bridge marker.
//!
//! Each step has its own timeout, so a hanging step cannot stall startup
//! for longer than that step's budget.

use std::net::Ipv4Addr;

use futures::stream::{self, StreamExt};
use if_addrs::{IfAddr, get_if_addrs};
use log::{debug, info, warn};
use serde::Deserialize;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::bridge::BridgeAddress;
use crate::config::ControllerConfig;
use crate::errors::Error;
use crate::transport::Transport;

type Result<T> = std::result::Result<T, Error>;

/// Discovery strategies, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum Strategy {
    FixedIp,
    Cloud,
    LanScan,
}

/// A bridge found by one of the strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredBridge {
    pub address: BridgeAddress,
    pub strategy: Strategy,
}

/// One entry of the cloud discovery response.
#[derive(Debug, Deserialize, Clone)]
struct CloudEntry {
    #[serde(default)]
    internalipaddress: Option<String>,
}

/// Resolves the bridge address using the configured strategy chain.
#[derive(Debug, Clone)]
pub struct BridgeLocator<T> {
    transport: T,
    config: ControllerConfig,
}

impl<T: Transport> BridgeLocator<T> {
    pub fn new(transport: T, config: ControllerConfig) -> Self {
        BridgeLocator { transport, config }
    }

    /// Try every strategy in order; `None` when none finds a bridge.
    pub async fn locate(&self) -> Option<DiscoveredBridge> {
        for strategy in Strategy::iter() {
            match self.try_strategy(strategy).await {
                Ok(Some(address)) => {
                    info!("bridge found at {address} via {strategy}");
                    return Some(DiscoveredBridge { address, strategy });
                }
                Ok(None) => debug!("{strategy} found no bridge"),
                Err(e) => warn!("{strategy} discovery failed: {e}"),
            }
        }
        warn!("no hue bridge found");
        None
    }

    /// Run a single strategy.
    pub async fn try_strategy(&self, strategy: Strategy) -> Result<Option<BridgeAddress>> {
        match strategy {
            Strategy::FixedIp => self.probe_fixed().await,
            Strategy::Cloud => self.query_cloud().await,
            Strategy::LanScan => self.scan_subnet().await,
        }
    }

    async fn probe_fixed(&self) -> Result<Option<BridgeAddress>> {
        let Some(host) = &self.config.fixed_ip else {
            return Ok(None);
        };
        let address = BridgeAddress::new(host.as_str());
        let resp = self
            .transport
            .get(&address.config_url(), self.config.timeouts.fixed_probe)
            .await?;
        Ok((resp.status == 200).then_some(address))
    }

    async fn query_cloud(&self) -> Result<Option<BridgeAddress>> {
        let resp = self
            .transport
            .get(&self.config.discovery_url, self.config.timeouts.cloud_lookup)
            .await?
            .error_for_status()?;
        let entries: Vec<CloudEntry> = resp.json()?;
        Ok(entries
            .into_iter()
            .next()
            .and_then(|entry| entry.internalipaddress)
            .filter(|ip| !ip.is_empty())
            .map(BridgeAddress::new))
    }

    async fn scan_subnet(&self) -> Result<Option<BridgeAddress>> {
        let Some(local) = self.config.scan_subnet.or_else(local_ipv4) else {
            debug!("no local ipv4 interface to scan from");
            return Ok(None);
        };
        let hosts = subnet_hosts(local);
        debug!("scanning {} hosts around {local}", hosts.len());

        let marker = self.config.bridge_marker.to_lowercase();
        let concurrency = self.config.scan_concurrency.max(1);
        let mut probes = stream::iter(hosts)
            .map(|host| {
                let marker = marker.as_str();
                async move { self.probe_description(host, marker).await }
            })
            .buffered(concurrency);

        while let Some(found) = probes.next().await {
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    async fn probe_description(&self, host: Ipv4Addr, marker: &str) -> Option<BridgeAddress> {
        let address = BridgeAddress::new(host.to_string());
        let resp = self
            .transport
            .get(&address.description_url(), self.config.timeouts.scan_probe)
            .await
            .ok()?;
        (resp.status == 200 && resp.body.to_lowercase().contains(marker)).then_some(address)
    }
}

/// Every host address of the /24 containing `local`, except `local` itself.
pub fn subnet_hosts(local: Ipv4Addr) -> Vec<Ipv4Addr> {
    let [a, b, c, _] = local.octets();
    (1..=254u8)
        .map(|d| Ipv4Addr::new(a, b, c, d))
        .filter(|host| *host != local)
        .collect()
}

/// First non-loopback IPv4 address of this machine.
fn local_ipv4() -> Option<Ipv4Addr> {
    get_if_addrs()
        .ok()?
        .into_iter()
        .filter(|interface| !interface.is_loopback())
        .find_map(|interface| match interface.addr {
            IfAddr::V4(v4) => Some(v4.ip),
            IfAddr::V6(_) => None,
        })
}
