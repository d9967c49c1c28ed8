//! Power mode for light control.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Power state for a light.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
pub enum PowerMode {
    /// Turn the light on
    On,
    /// Turn the light off
    Off,
}

impl PowerMode {
    pub fn is_on(&self) -> bool {
        matches!(self, PowerMode::On)
    }

    /// The opposite mode.
    pub fn toggled(&self) -> Self {
        match self {
            PowerMode::On => PowerMode::Off,
            PowerMode::Off => PowerMode::On,
        }
    }
}

impl From<bool> for PowerMode {
    fn from(on: bool) -> Self {
        if on { PowerMode::On } else { PowerMode::Off }
    }
}

impl From<PowerMode> for bool {
    fn from(power: PowerMode) -> Self {
        power.is_on()
    }
}
