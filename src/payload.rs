//! Write payload for `PUT /lights/<id>/state`.

use serde::{Deserialize, Serialize};

use crate::types::{Brightness, PowerMode};

/// A state change to send to a light.
///
/// Unset fields are omitted from the request body, so the bridge leaves
/// them untouched.
///
/// ```
/// use hue_lights_rs::{Brightness, StatePayload};
///
/// let payload = StatePayload::from(&Brightness::create(50).unwrap());
/// assert_eq!(serde_json::to_string(&payload).unwrap(), r#"{"on":true,"bri":127}"#);
/// ```
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StatePayload {
    pub(crate) on: Option<bool>,
    pub(crate) bri: Option<u8>,
}

impl StatePayload {
    /// Create a new empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if this payload changes anything.
    pub fn is_valid(&self) -> bool {
        self.on.is_some() || self.bri.is_some()
    }

    pub fn power(&mut self, power: PowerMode) -> &mut Self {
        self.on = Some(power.is_on());
        self
    }

    /// Set brightness; converted to the bridge's 0-254 scale.
    pub fn brightness(&mut self, brightness: &Brightness) -> &mut Self {
        self.bri = Some(brightness.to_bridge());
        self
    }

    pub fn on(&self) -> Option<bool> {
        self.on
    }

    pub fn bri(&self) -> Option<u8> {
        self.bri
    }
}

impl From<PowerMode> for StatePayload {
    fn from(power: PowerMode) -> Self {
        let mut payload = StatePayload::new();
        payload.power(power);
        payload
    }
}

/// Setting brightness always switches the light on as well.
impl From<&Brightness> for StatePayload {
    fn from(brightness: &Brightness) -> Self {
        let mut payload = StatePayload::new();
        payload.power(PowerMode::On).brightness(brightness);
        payload
    }
}
