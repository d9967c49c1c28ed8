//! Light state as the bridge reports it.

use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::types::{Brightness, PowerMode};

/// A light object from `GET /lights/<id>` or one entry of `GET /lights`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BridgeLight {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: BridgeLightState,
}

/// The `state` object of a bridge light.
///
/// Everything is optional because plugs and older bulbs omit fields.
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BridgeLightState {
    pub on: Option<bool>,
    /// Brightness on the bridge's 0-254 scale
    pub bri: Option<u8>,
    pub reachable: Option<bool>,
}

impl BridgeLight {
    /// A light without a `reachable` flag counts as reachable.
    pub fn is_reachable(&self) -> bool {
        self.state.reachable.unwrap_or(true)
    }

    /// Power and brightness in percent.
    ///
    /// A light object without `state.on` is not a usable reading and
    /// yields [`Error::MissingPowerState`].
    pub fn reading(&self) -> Result<LightReading, Error> {
        let on = self.state.on.ok_or(Error::MissingPowerState)?;
        Ok(LightReading {
            power: PowerMode::from(on),
            brightness: self.state.bri.map(Brightness::from_bridge),
        })
    }
}

/// One poll result for a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightReading {
    pub power: PowerMode,
    /// None for lights without dimming
    pub brightness: Option<Brightness>,
}

/// Power and brightness shown for a light.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightState {
    pub on: bool,
    pub brightness: Brightness,
}

impl LightState {
    pub fn power(&self) -> PowerMode {
        PowerMode::from(self.on)
    }

    /// Overwrite with a poll reading; brightness is kept when the reading has none.
    pub fn update_from_reading(&mut self, reading: &LightReading) {
        self.on = reading.power.is_on();
        if let Some(brightness) = reading.brightness {
            self.brightness = brightness;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_light() {
        let light: BridgeLight = serde_json::from_str(
            r#"{"name": "Sotto", "type": "Dimmable light",
                "state": {"on": true, "bri": 127, "alert": "none", "reachable": true}}"#,
        )
        .unwrap();

        assert_eq!(light.name.as_deref(), Some("Sotto"));
        assert!(light.is_reachable());
        let reading = light.reading().unwrap();
        assert_eq!(reading.power, PowerMode::On);
        assert_eq!(reading.brightness.map(|b| b.value()), Some(50));
    }

    #[test]
    fn test_missing_reachable_counts_as_reachable() {
        let light: BridgeLight =
            serde_json::from_str(r#"{"name": "Plug", "state": {"on": false}}"#).unwrap();
        assert!(light.is_reachable());
        assert_eq!(light.reading().unwrap().brightness, None);

        let light: BridgeLight =
            serde_json::from_str(r#"{"state": {"reachable": false}}"#).unwrap();
        assert!(!light.is_reachable());
    }

    #[test]
    fn test_reading_requires_power_state() {
        for body in [r#"{"name": "Sotto"}"#, "{}", r#"{"state": {"bri": 100}}"#] {
            let light: BridgeLight = serde_json::from_str(body).unwrap();
            assert_eq!(light.reading(), Err(Error::MissingPowerState), "{body}");
        }
    }

    #[test]
    fn test_update_keeps_brightness_without_reading() {
        let mut state = LightState {
            on: false,
            brightness: Brightness::create(80).unwrap(),
        };
        state.update_from_reading(&LightReading {
            power: PowerMode::On,
            brightness: None,
        });
        assert!(state.on);
        assert_eq!(state.brightness.value(), 80);
    }
}
