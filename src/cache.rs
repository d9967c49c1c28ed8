//! Light discovery with a known-configuration cache.
//!
//! A previously known ID→name mapping is trusted after a single cheap probe
//! instead of fetching the whole light collection every time.
//!
//! | freshness     | action                                                  |
//! |---------------|---------------------------------------------------------|
//! | `Unvalidated` | probe the lowest cached ID; match → `Validated`, return |
//! |               | cache; mismatch → `Stale`, full discovery; probe error  |
//! |               | → return cache unchanged                                |
//! | `Validated`   | return cache without any request                        |
//! | `Stale`       | full discovery                                          |
//!
//! A successful full discovery replaces the cache and marks it `Validated`.
//! A failed one returns the cache as it was.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::bridge::BridgeClient;
use crate::errors::Error;
use crate::status::BridgeLight;
use crate::transport::Transport;
use crate::types::LightId;

type Result<T> = std::result::Result<T, Error>;

/// How far the cached mapping can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Not checked against the bridge yet
    #[default]
    Unvalidated,
    /// Confirmed by a probe or by full discovery
    Validated,
    /// Known to differ from the bridge
    Stale,
}

/// Cached mapping from light ID to display name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownLights {
    lights: BTreeMap<LightId, String>,
    freshness: Freshness,
}

impl KnownLights {
    pub fn new(lights: BTreeMap<LightId, String>) -> Self {
        KnownLights {
            lights,
            freshness: Freshness::Unvalidated,
        }
    }

    pub fn lights(&self) -> &BTreeMap<LightId, String> {
        &self.lights
    }

    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    /// Force a full discovery next time.
    pub fn invalidate(&mut self) {
        self.freshness = Freshness::Stale;
    }

    /// Lowest cached ID and its expected name.
    fn sentinel(&self) -> Option<(LightId, String)> {
        self.lights
            .iter()
            .next()
            .map(|(id, name)| (*id, name.clone()))
    }
}

/// Name a light is shown with when the bridge sends none.
pub fn default_name(id: LightId) -> String {
    format!("Light {id}")
}

/// Reachable lights of a collection response, with display names.
///
/// Lights without a `reachable` flag are kept.
pub fn reachable_lights(collection: &BTreeMap<LightId, BridgeLight>) -> BTreeMap<LightId, String> {
    collection
        .iter()
        .filter(|(_, light)| light.is_reachable())
        .map(|(id, light)| (*id, light.name.clone().unwrap_or_else(|| default_name(*id))))
        .collect()
}

/// Fetch the full light collection and keep the reachable lights.
pub async fn full_discovery<T: Transport>(
    client: &BridgeClient<T>,
) -> Result<BTreeMap<LightId, String>> {
    let collection = client.lights().await?;
    let lights = reachable_lights(&collection);
    debug!(
        "full discovery: {} lights, {} reachable",
        collection.len(),
        lights.len()
    );
    Ok(lights)
}

/// Resolve the current light set, consulting and updating `known`.
pub async fn discover_lights<T: Transport>(
    client: &BridgeClient<T>,
    known: &mut KnownLights,
) -> BTreeMap<LightId, String> {
    if known.freshness == Freshness::Unvalidated {
        match known.sentinel() {
            None => known.freshness = Freshness::Stale,
            Some((id, expected)) => {
                let checked = client
                    .light_with_timeout(id, client.timeouts().validate)
                    .await;
                match checked {
                    Ok(light)
                        if light.name.as_deref() == Some(expected.as_str())
                            && light.is_reachable() =>
                    {
                        info!("known lights configuration validated");
                        known.freshness = Freshness::Validated;
                    }
                    Ok(_) => {
                        info!("light {id} changed, running full discovery");
                        known.freshness = Freshness::Stale;
                    }
                    Err(e) => {
                        warn!("could not validate lights, assuming known configuration: {e}");
                        return known.lights.clone();
                    }
                }
            }
        }
    }

    if known.freshness == Freshness::Validated {
        return known.lights.clone();
    }

    match full_discovery(client).await {
        Ok(lights) => {
            known.lights = lights;
            known.freshness = Freshness::Validated;
            known.lights.clone()
        }
        Err(e) => {
            warn!("full light discovery failed: {e}");
            known.lights.clone()
        }
    }
}
