//! Locally held state of a single light.

use serde::Serialize;
use strum_macros::Display;

use crate::payload::StatePayload;
use crate::status::{LightReading, LightState};
use crate::types::{Brightness, LightId, PowerMode};

/// Status shown next to a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum Indicator {
    On,
    Off,
    /// The last poll or write for this light failed
    Error,
}

/// A light as the controller presents it.
///
/// `displayed` is what the user sees, including optimistic changes that
/// the bridge has not acknowledged yet. `confirmed` is the last state the
/// bridge reported or acknowledged, and is what a failed write reverts to.
///
/// # Example
///
/// ```
/// use hue_lights_rs::{Indicator, Light, LightId};
///
/// let light = Light::new(LightId::new(1).unwrap(), "Sotto");
/// assert_eq!(light.name(), "Sotto");
/// assert_eq!(light.indicator(), Indicator::Off);
/// assert_eq!(light.entry_text(), "50%");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Light {
    id: LightId,
    name: String,
    displayed: LightState,
    confirmed: Option<LightState>,
    error: bool,
    entry: String,
}

impl Light {
    pub fn new(id: LightId, name: &str) -> Self {
        let displayed = LightState::default();
        Light {
            id,
            name: name.to_string(),
            entry: displayed.brightness.to_string(),
            displayed,
            confirmed: None,
            error: false,
        }
    }

    pub fn id(&self) -> LightId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &LightState {
        &self.displayed
    }

    pub fn confirmed(&self) -> Option<&LightState> {
        self.confirmed.as_ref()
    }

    pub fn is_on(&self) -> bool {
        self.displayed.on
    }

    pub fn power(&self) -> PowerMode {
        self.displayed.power()
    }

    pub fn brightness(&self) -> Brightness {
        self.displayed.brightness
    }

    pub fn indicator(&self) -> Indicator {
        match (self.error, self.displayed.on) {
            (true, _) => Indicator::Error,
            (false, true) => Indicator::On,
            (false, false) => Indicator::Off,
        }
    }

    /// Text of the editable brightness entry.
    pub fn entry_text(&self) -> &str {
        &self.entry
    }

    pub(crate) fn set_entry_text(&mut self, text: &str) {
        self.entry = text.to_string();
    }

    /// Put the entry back to the displayed brightness.
    pub(crate) fn restore_entry(&mut self) {
        self.entry = self.displayed.brightness.to_string();
    }

    /// Optimistically show a change; returns the state it replaced.
    pub(crate) fn apply_local(&mut self, payload: &StatePayload) -> LightState {
        let previous = self.displayed;
        apply_payload(&mut self.displayed, payload);
        self.restore_entry();
        previous
    }

    /// The bridge acknowledged `payload`.
    pub(crate) fn confirm(&mut self, payload: &StatePayload) {
        let mut confirmed = self.confirmed.unwrap_or(self.displayed);
        apply_payload(&mut confirmed, payload);
        self.confirmed = Some(confirmed);
        self.error = false;
    }

    /// A write failed: go back to the last confirmed state, or to
    /// `previous` when the bridge never reported one.
    pub(crate) fn revert(&mut self, previous: LightState) {
        self.displayed = self.confirmed.unwrap_or(previous);
        self.error = true;
        self.restore_entry();
    }

    pub(crate) fn apply_reading(&mut self, reading: &LightReading) {
        self.displayed.update_from_reading(reading);
        self.confirmed = Some(self.displayed);
        self.error = false;
        self.restore_entry();
    }

    pub(crate) fn mark_error(&mut self) {
        self.error = true;
    }
}

fn apply_payload(state: &mut LightState, payload: &StatePayload) {
    if let Some(on) = payload.on() {
        state.on = on;
    }
    if let Some(bri) = payload.bri() {
        state.brightness = Brightness::from_bridge(bri);
    }
}
