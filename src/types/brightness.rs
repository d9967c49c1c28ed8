//! Brightness in percent and its bridge-scale conversion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Brightness level from 0 to 100 percent.
///
/// The bridge stores brightness on a 0-254 scale. Both directions of the
/// conversion round to the nearest integer, so a value that went to the
/// bridge and back settles after one round-trip.
///
/// # Examples
///
/// ```
/// use hue_lights_rs::Brightness;
///
/// let half = Brightness::create(50).unwrap();
/// assert_eq!(half.to_bridge(), 127);
/// assert_eq!(Brightness::from_bridge(127).value(), 50);
/// assert_eq!(half.to_string(), "50%");
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Default for Brightness {
    fn default() -> Self {
        Self::new()
    }
}

impl Brightness {
    const MAX: u8 = 100;
    const DEFAULT: u8 = 50;
    /// Upper bound of the bridge's brightness scale.
    pub const BRIDGE_MAX: u8 = 254;

    /// Create a new Brightness at 50%.
    pub fn new() -> Self {
        Brightness {
            value: Self::DEFAULT,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is above 100.
    pub fn create(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Brightness { value })
        } else {
            None
        }
    }

    /// Clamp any integer into 0-100.
    ///
    /// ```
    /// use hue_lights_rs::Brightness;
    ///
    /// assert_eq!(Brightness::clamped(-5).value(), 0);
    /// assert_eq!(Brightness::clamped(150).value(), 100);
    /// assert_eq!(Brightness::clamped(42).value(), 42);
    /// ```
    pub fn clamped(value: i64) -> Self {
        Brightness {
            value: value.clamp(0, Self::MAX as i64) as u8,
        }
    }

    /// Convert to the bridge's 0-254 scale.
    pub fn to_bridge(&self) -> u8 {
        (f64::from(self.value) * f64::from(Self::BRIDGE_MAX) / 100.0).round() as u8
    }

    /// Convert from the bridge's 0-254 scale. Values above 254 count as 254.
    pub fn from_bridge(raw: u8) -> Self {
        let raw = raw.min(Self::BRIDGE_MAX);
        Brightness {
            value: (f64::from(raw) * 100.0 / f64::from(Self::BRIDGE_MAX)).round() as u8,
        }
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.value)
    }
}

/// Parses a typed entry such as `"75"`, `"75%"` or `"42.9"`.
///
/// Fractions are truncated and the result is clamped into 0-100.
///
/// ```
/// use hue_lights_rs::Brightness;
///
/// assert_eq!("75%".parse::<Brightness>().unwrap().value(), 75);
/// assert_eq!(" 42.9 ".parse::<Brightness>().unwrap().value(), 42);
/// assert_eq!("150".parse::<Brightness>().unwrap().value(), 100);
/// assert!("abc%".parse::<Brightness>().is_err());
/// ```
impl FromStr for Brightness {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        let parsed: f64 = number
            .parse()
            .map_err(|_| Error::InvalidBrightness(s.to_string()))?;
        if !parsed.is_finite() {
            return Err(Error::InvalidBrightness(s.to_string()));
        }
        Ok(Self::clamped(parsed.trunc() as i64))
    }
}
