//! Bridge-assigned light identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier the bridge assigns to a light (`/lights/<id>`).
///
/// ```
/// use hue_lights_rs::LightId;
///
/// let id: LightId = "3".parse().unwrap();
/// assert_eq!(id.value(), 3);
/// assert!("0".parse::<LightId>().is_err());
/// assert!("abc".parse::<LightId>().is_err());
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct LightId(u16);

impl LightId {
    /// Returns None for 0, which the bridge never assigns.
    pub fn new(value: u16) -> Option<Self> {
        (value > 0).then_some(LightId(value))
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for LightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned for keys that are not positive integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLightId(pub String);

impl fmt::Display for InvalidLightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid light id {:?}", self.0)
    }
}

impl std::error::Error for InvalidLightId {}

impl FromStr for LightId {
    type Err = InvalidLightId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u16>()
            .ok()
            .and_then(LightId::new)
            .ok_or_else(|| InvalidLightId(s.to_string()))
    }
}
