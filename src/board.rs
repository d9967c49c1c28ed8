//! The set of known lights and every state transition applied to them.
//!
//! [`LightBoard`] is the single owner of light state. User intents go
//! through `begin_*`, which show the change immediately and hand back a
//! [`Command`] to send. When the write completes, [`LightBoard::finish`]
//! either confirms it or reverts the light to its last confirmed state.
//! Poll results are applied with [`LightBoard::apply_poll`].

use std::collections::BTreeMap;
use std::time::Instant;

use log::{debug, warn};

use crate::errors::Error;
use crate::light::{Indicator, Light};
use crate::payload::StatePayload;
use crate::status::{LightReading, LightState};
use crate::types::{Brightness, LightId, PowerMode};

type Result<T> = std::result::Result<T, Error>;

/// What a command changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Power(PowerMode),
    /// Also switches the light on
    Brightness(Brightness),
}

/// A write to send to the bridge, created by a `begin_*` transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub id: LightId,
    pub kind: CommandKind,
    pub(crate) previous: LightState,
}

impl Command {
    pub fn payload(&self) -> StatePayload {
        match &self.kind {
            CommandKind::Power(power) => StatePayload::from(*power),
            CommandKind::Brightness(brightness) => StatePayload::from(brightness),
        }
    }
}

/// A finished write.
#[derive(Debug)]
pub struct CommandOutcome {
    pub command: Command,
    pub result: Result<()>,
}

/// The result of polling every known light once.
#[derive(Debug)]
pub struct PollReport {
    pub readings: Vec<(LightId, Result<LightReading>)>,
    pub completed_at: Instant,
}

impl PollReport {
    pub fn new(readings: Vec<(LightId, Result<LightReading>)>) -> Self {
        PollReport {
            readings,
            completed_at: Instant::now(),
        }
    }

    pub fn failures(&self) -> usize {
        self.readings.iter().filter(|(_, r)| r.is_err()).count()
    }
}

/// All known lights, keyed by bridge ID.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use hue_lights_rs::{LightBoard, LightId};
///
/// let one = LightId::new(1).unwrap();
/// let mut board = LightBoard::new(&BTreeMap::from([(one, "Sotto".to_string())]));
///
/// // A malformed entry is rejected and the entry shows the last valid value.
/// board.set_entry_text(one, "abc%").unwrap();
/// assert!(board.submit_entry(one, "abc%").is_err());
/// assert_eq!(board.get(one).unwrap().entry_text(), "50%");
/// ```
#[derive(Debug, Clone, Default)]
pub struct LightBoard {
    lights: BTreeMap<LightId, Light>,
}

impl LightBoard {
    pub fn new(names: &BTreeMap<LightId, String>) -> Self {
        LightBoard {
            lights: names
                .iter()
                .map(|(id, name)| (*id, Light::new(*id, name)))
                .collect(),
        }
    }

    /// A board with no lights, used when no bridge is available.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn ids(&self) -> Vec<LightId> {
        self.lights.keys().copied().collect()
    }

    pub fn get(&self, id: LightId) -> Option<&Light> {
        self.lights.get(&id)
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.lights.values()
    }

    pub fn indicator(&self, id: LightId) -> Option<Indicator> {
        self.get(id).map(Light::indicator)
    }

    fn light_mut(&mut self, id: LightId) -> Result<&mut Light> {
        self.lights.get_mut(&id).ok_or(Error::LightNotFound(id))
    }

    fn begin(&mut self, id: LightId, kind: CommandKind) -> Result<Command> {
        let light = self.light_mut(id)?;
        let command = Command {
            id,
            kind,
            previous: *light.state(),
        };
        light.apply_local(&command.payload());
        debug!("light {id}: {kind:?} applied locally");
        Ok(command)
    }

    /// Switch a light to `power`.
    pub fn begin_power(&mut self, id: LightId, power: PowerMode) -> Result<Command> {
        self.begin(id, CommandKind::Power(power))
    }

    /// Flip a light's displayed power state.
    pub fn begin_toggle(&mut self, id: LightId) -> Result<Command> {
        let power = self.light_mut(id)?.power().toggled();
        self.begin_power(id, power)
    }

    /// Set brightness from a slider or a numeric value.
    pub fn begin_brightness(&mut self, id: LightId, brightness: Brightness) -> Result<Command> {
        self.begin(id, CommandKind::Brightness(brightness))
    }

    /// Record what the user typed into a light's brightness entry.
    pub fn set_entry_text(&mut self, id: LightId, text: &str) -> Result<()> {
        self.light_mut(id)?.set_entry_text(text);
        Ok(())
    }

    /// Parse a typed brightness entry.
    ///
    /// Malformed text restores the entry to the last valid value and
    /// returns [`Error::InvalidBrightness`] without producing a command.
    pub fn submit_entry(&mut self, id: LightId, text: &str) -> Result<Command> {
        match text.parse::<Brightness>() {
            Ok(brightness) => self.begin_brightness(id, brightness),
            Err(e) => {
                self.light_mut(id)?.restore_entry();
                Err(e)
            }
        }
    }

    /// Reconcile a finished write.
    ///
    /// On success the light's confirmed state is updated. A power-on
    /// returns a follow-up command that re-sends the light's brightness so
    /// it comes back at its previous level. On failure the light reverts.
    pub fn finish(&mut self, command: &Command, result: &Result<()>) -> Option<Command> {
        let light = match self.light_mut(command.id) {
            Ok(light) => light,
            Err(_) => return None,
        };

        match result {
            Ok(()) => {
                light.confirm(&command.payload());
                match command.kind {
                    CommandKind::Power(PowerMode::On) => {
                        let brightness = light.brightness();
                        self.begin_brightness(command.id, brightness).ok()
                    }
                    _ => None,
                }
            }
            Err(e) => {
                warn!("light {}: {:?} failed: {e}", command.id, command.kind);
                light.revert(command.previous);
                None
            }
        }
    }

    /// Apply one poll; each light's result is handled independently.
    pub fn apply_poll(&mut self, report: &PollReport) {
        for (id, reading) in &report.readings {
            let Some(light) = self.lights.get_mut(id) else {
                continue;
            };
            match reading {
                Ok(reading) => light.apply_reading(reading),
                Err(e) => {
                    warn!("light {id}: status update failed: {e}");
                    light.mark_error();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: u16) -> LightId {
        LightId::new(value).unwrap()
    }

    fn board() -> LightBoard {
        LightBoard::new(&BTreeMap::from([
            (id(1), "Sotto".to_string()),
            (id(2), "Sopra".to_string()),
        ]))
    }

    fn reading(on: bool, percent: u8) -> Result<LightReading> {
        Ok(LightReading {
            power: PowerMode::from(on),
            brightness: Brightness::create(percent),
        })
    }

    #[test]
    fn test_toggle_rollback() {
        let mut board = board();
        board.apply_poll(&PollReport::new(vec![(id(1), reading(false, 40))]));

        let command = board.begin_toggle(id(1)).unwrap();
        assert_eq!(command.kind, CommandKind::Power(PowerMode::On));
        assert!(board.get(id(1)).unwrap().is_on());

        let follow_up = board.finish(&command, &Err(Error::timed_out("http://bridge")));
        assert_eq!(follow_up, None);
        assert!(!board.get(id(1)).unwrap().is_on());
        assert_eq!(board.indicator(id(1)), Some(Indicator::Error));
    }

    #[test]
    fn test_power_on_reissues_brightness() {
        let mut board = board();
        board.apply_poll(&PollReport::new(vec![(id(1), reading(false, 40))]));

        let command = board.begin_power(id(1), PowerMode::On).unwrap();
        let follow_up = board.finish(&command, &Ok(())).unwrap();

        assert_eq!(follow_up.kind, CommandKind::Brightness(Brightness::create(40).unwrap()));
        assert_eq!(follow_up.payload().bri(), Some(102));
        assert_eq!(board.indicator(id(1)), Some(Indicator::On));
    }

    #[test]
    fn test_power_off_has_no_follow_up() {
        let mut board = board();
        let command = board.begin_power(id(2), PowerMode::Off).unwrap();
        assert_eq!(board.finish(&command, &Ok(())), None);
        assert_eq!(board.indicator(id(2)), Some(Indicator::Off));
    }

    #[test]
    fn test_brightness_turns_light_on() {
        let mut board = board();
        let command = board.begin_brightness(id(2), Brightness::create(75).unwrap()).unwrap();

        let light = board.get(id(2)).unwrap();
        assert!(light.is_on());
        assert_eq!(light.entry_text(), "75%");
        assert_eq!(command.payload().bri(), Some(191));
    }

    #[test]
    fn test_submit_entry_clamps() {
        let mut board = board();
        let low = board.submit_entry(id(1), "-5").unwrap();
        assert_eq!(low.kind, CommandKind::Brightness(Brightness::create(0).unwrap()));

        let high = board.submit_entry(id(1), "150%").unwrap();
        assert_eq!(high.kind, CommandKind::Brightness(Brightness::create(100).unwrap()));
        assert_eq!(board.get(id(1)).unwrap().entry_text(), "100%");
    }

    #[test]
    fn test_malformed_entry_restores_display() {
        let mut board = board();
        board.apply_poll(&PollReport::new(vec![(id(1), reading(true, 64))]));
        board.set_entry_text(id(1), "abc%").unwrap();

        let result = board.submit_entry(id(1), "abc%");
        assert_eq!(result, Err(Error::InvalidBrightness("abc%".to_string())));

        let light = board.get(id(1)).unwrap();
        assert_eq!(light.entry_text(), "64%");
        assert_eq!(light.brightness().value(), 64);
    }

    #[test]
    fn test_poll_failure_is_isolated() {
        let mut board = board();
        let report = PollReport::new(vec![
            (id(1), Err(Error::timed_out("http://bridge/api/user/lights/1"))),
            (id(2), reading(true, 30)),
        ]);
        assert_eq!(report.failures(), 1);

        board.apply_poll(&report);
        assert_eq!(board.indicator(id(1)), Some(Indicator::Error));
        assert_eq!(board.indicator(id(2)), Some(Indicator::On));
        assert_eq!(board.get(id(2)).unwrap().brightness().value(), 30);
    }

    #[test]
    fn test_poll_overwrites_optimistic_state() {
        let mut board = board();
        board.begin_brightness(id(1), Brightness::create(90).unwrap()).unwrap();
        board.apply_poll(&PollReport::new(vec![(id(1), reading(false, 20))]));

        let light = board.get(id(1)).unwrap();
        assert!(!light.is_on());
        assert_eq!(light.entry_text(), "20%");
    }

    #[test]
    fn test_unknown_light() {
        let mut board = LightBoard::empty();
        assert_eq!(board.begin_toggle(id(7)), Err(Error::LightNotFound(id(7))));
        assert!(board.is_empty());
    }
}
