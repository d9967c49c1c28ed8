//! Sequential command dispatch and polling.

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, warn};

use crate::board::{Command, LightBoard, PollReport};
use crate::bridge::BridgeClient;
use crate::countdown::PollCountdown;
use crate::errors::Error;
use crate::transport::Transport;
use crate::types::{Brightness, LightId, PowerMode};
use crate::worker::Event;

type Result<T> = std::result::Result<T, Error>;

/// Read every light once; one light's failure does not stop the others.
pub async fn poll_lights<T: Transport>(client: &BridgeClient<T>, ids: &[LightId]) -> PollReport {
    let mut readings = Vec::with_capacity(ids.len());
    for id in ids {
        readings.push((*id, client.reading(*id).await));
    }
    PollReport::new(readings)
}

/// Send one command's payload.
pub async fn send_command<T: Transport>(client: &BridgeClient<T>, command: &Command) -> Result<()> {
    client.set_state(command.id, &command.payload()).await
}

/// Drives a [`LightBoard`] against a bridge, awaiting every request in turn.
///
/// Without a bridge the controller is offline: its board is empty and every
/// light operation reports [`Error::LightNotFound`].
#[derive(Debug)]
pub struct Controller<T> {
    client: Option<BridgeClient<T>>,
    board: LightBoard,
    countdown: PollCountdown,
}

impl<T: Transport> Controller<T> {
    pub fn new(
        client: BridgeClient<T>,
        lights: &BTreeMap<LightId, String>,
        poll_interval: Duration,
    ) -> Self {
        Controller {
            client: Some(client),
            board: LightBoard::new(lights),
            countdown: PollCountdown::new(poll_interval),
        }
    }

    pub fn offline(poll_interval: Duration) -> Self {
        Controller {
            client: None,
            board: LightBoard::empty(),
            countdown: PollCountdown::new(poll_interval),
        }
    }

    pub fn is_online(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Option<&BridgeClient<T>> {
        self.client.as_ref()
    }

    pub fn board(&self) -> &LightBoard {
        &self.board
    }

    /// For callers that run requests elsewhere, e.g. through a
    /// [`SyncWorker`](crate::SyncWorker).
    pub fn board_mut(&mut self) -> &mut LightBoard {
        &mut self.board
    }

    pub fn countdown(&self) -> &PollCountdown {
        &self.countdown
    }

    /// Poll every light and restart the countdown.
    ///
    /// Returns the number of lights whose status could not be read.
    pub async fn poll(&mut self) -> usize {
        let Some(client) = &self.client else {
            self.countdown.reset();
            return 0;
        };
        let report = poll_lights(client, &self.board.ids()).await;
        self.board.apply_poll(&report);
        self.countdown.reset();
        report.failures()
    }

    /// Poll if the interval has elapsed; `None` when it has not.
    pub async fn tick(&mut self) -> Option<usize> {
        if self.countdown.is_due() {
            Some(self.poll().await)
        } else {
            None
        }
    }

    /// Apply an event from a [`SyncWorker`](crate::SyncWorker).
    ///
    /// A completed poll restarts the countdown. Returns the follow-up
    /// command a successful power-on produces.
    pub fn apply_event(&mut self, event: &Event) -> Option<Command> {
        if let Event::Polled(_) = event {
            self.countdown.reset();
        }
        event.apply_to(&mut self.board)
    }

    pub async fn toggle(&mut self, id: LightId) -> Result<()> {
        let command = self.board.begin_toggle(id)?;
        self.dispatch(command).await
    }

    pub async fn set_power(&mut self, id: LightId, power: PowerMode) -> Result<()> {
        let command = self.board.begin_power(id, power)?;
        self.dispatch(command).await
    }

    pub async fn set_brightness(&mut self, id: LightId, brightness: Brightness) -> Result<()> {
        let command = self.board.begin_brightness(id, brightness)?;
        self.dispatch(command).await
    }

    /// Submit a typed brightness entry; malformed text sends nothing.
    pub async fn submit_entry(&mut self, id: LightId, text: &str) -> Result<()> {
        let command = self.board.submit_entry(id, text)?;
        self.dispatch(command).await
    }

    /// Send a command and reconcile the result, including a follow-up
    /// brightness command after a power-on.
    ///
    /// The returned result is the first command's; a failed follow-up only
    /// marks the light.
    async fn dispatch(&mut self, command: Command) -> Result<()> {
        let result = self.send(&command).await;
        let follow_up = self.board.finish(&command, &result);

        if let Some(follow_up) = follow_up {
            debug!("light {}: restoring brightness after power-on", follow_up.id);
            let follow_result = self.send(&follow_up).await;
            if let Err(e) = &follow_result {
                warn!("light {}: brightness restore failed: {e}", follow_up.id);
            }
            self.board.finish(&follow_up, &follow_result);
        }
        result
    }

    async fn send(&self, command: &Command) -> Result<()> {
        match &self.client {
            Some(client) => send_command(client, command).await,
            None => Err(Error::NoBridge),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeAddress;
    use crate::config::Timeouts;
    use crate::light::Indicator;
    use crate::pairing::Credential;
    use crate::transport::mock::{Method, MockTransport};
    use serde_json::json;

    const LIGHTS: &str = "http://10.0.0.5/api/user/lights";
    const OK: &str = r#"[{"success": {}}]"#;

    fn id(value: u16) -> LightId {
        LightId::new(value).unwrap()
    }

    fn controller(transport: &MockTransport) -> Controller<MockTransport> {
        let client = BridgeClient::new(
            transport.clone(),
            BridgeAddress::new("10.0.0.5"),
            Credential::new("user"),
            Timeouts::default(),
        );
        let lights = BTreeMap::from([(id(1), "Sotto".to_string()), (id(2), "Sopra".to_string())]);
        Controller::new(client, &lights, Duration::from_secs(5))
    }

    fn state_url(light: u16) -> String {
        format!("{LIGHTS}/{light}/state")
    }

    #[tokio::test]
    async fn test_poll_isolates_failures() {
        let transport = MockTransport::new();
        transport.on_get(
            &format!("{LIGHTS}/2"),
            200,
            r#"{"name": "Sopra", "state": {"on": true, "bri": 191, "reachable": true}}"#,
        );
        let mut controller = controller(&transport);

        assert_eq!(controller.poll().await, 1);
        assert_eq!(controller.board().indicator(id(1)), Some(Indicator::Error));
        assert_eq!(controller.board().indicator(id(2)), Some(Indicator::On));
        assert_eq!(controller.board().get(id(2)).unwrap().entry_text(), "75%");
        assert!(!controller.countdown().is_due());
    }

    #[tokio::test]
    async fn test_poll_without_power_state_is_an_error() {
        let transport = MockTransport::new();
        transport.on_get(&format!("{LIGHTS}/1"), 200, r#"{"name": "Sotto"}"#);
        transport.on_get(&format!("{LIGHTS}/2"), 200, "[]");
        let mut controller = controller(&transport);

        assert_eq!(controller.poll().await, 2);
        assert_eq!(controller.board().indicator(id(1)), Some(Indicator::Error));
        assert_eq!(controller.board().indicator(id(2)), Some(Indicator::Error));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_polls_once_interval_elapsed() {
        let transport = MockTransport::new();
        let light = r#"{"state": {"on": true, "bri": 254}}"#;
        transport.on_get(&format!("{LIGHTS}/1"), 200, light);
        transport.on_get(&format!("{LIGHTS}/2"), 200, light);
        let mut controller = controller(&transport);

        assert_eq!(controller.tick().await, None);
        assert_eq!(transport.requests().len(), 0);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(controller.tick().await, None);
        assert_eq!(controller.countdown().remaining(), Duration::from_secs(2));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(controller.countdown().is_due());
        assert_eq!(controller.tick().await, Some(0));
        assert_eq!(transport.count(Method::Get, &format!("{LIGHTS}/1")), 1);
        assert_eq!(controller.board().indicator(id(1)), Some(Indicator::On));

        assert!(!controller.countdown().is_due());
        assert_eq!(controller.countdown().remaining(), Duration::from_secs(5));
        assert_eq!(controller.tick().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polled_event_restarts_countdown() {
        let transport = MockTransport::new();
        let mut controller = controller(&transport);
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(controller.countdown().is_due());

        let report = poll_lights(controller.client().unwrap(), &[id(1)]).await;
        assert_eq!(controller.apply_event(&Event::Polled(report)), None);
        assert!(!controller.countdown().is_due());
        assert_eq!(controller.board().indicator(id(1)), Some(Indicator::Error));
    }

    #[tokio::test]
    async fn test_toggle_failure_reverts() {
        let transport = MockTransport::new();
        transport.on_get(&format!("{LIGHTS}/1"), 200, r#"{"state": {"on": true, "bri": 127}}"#);
        transport.time_out(Method::Put, &state_url(1));
        let mut controller = controller(&transport);
        controller.poll().await;

        let result = controller.toggle(id(1)).await;
        assert_eq!(result, Err(Error::timed_out(&state_url(1))));
        assert!(controller.board().get(id(1)).unwrap().is_on());
        assert_eq!(transport.bodies(Method::Put, &state_url(1)), vec![json!({"on": false})]);
    }

    #[tokio::test]
    async fn test_toggle_on_restores_brightness() {
        let transport = MockTransport::new();
        transport.on_get(&format!("{LIGHTS}/1"), 200, r#"{"state": {"on": false, "bri": 102}}"#);
        transport.on_put(&state_url(1), 200, OK);
        let mut controller = controller(&transport);
        controller.poll().await;

        controller.toggle(id(1)).await.unwrap();
        assert_eq!(
            transport.bodies(Method::Put, &state_url(1)),
            vec![json!({"on": true}), json!({"on": true, "bri": 102})]
        );
        assert_eq!(controller.board().indicator(id(1)), Some(Indicator::On));
    }

    #[tokio::test]
    async fn test_entry_clamped_before_dispatch() {
        let transport = MockTransport::new();
        transport.on_put(&state_url(2), 200, OK);
        let mut controller = controller(&transport);

        controller.submit_entry(id(2), "150").await.unwrap();
        controller.submit_entry(id(2), "-5%").await.unwrap();
        assert_eq!(
            transport.bodies(Method::Put, &state_url(2)),
            vec![json!({"on": true, "bri": 254}), json!({"on": true, "bri": 0})]
        );
    }

    #[tokio::test]
    async fn test_malformed_entry_sends_nothing() {
        let transport = MockTransport::new();
        let mut controller = controller(&transport);
        controller.board_mut().set_entry_text(id(1), "abc%").unwrap();

        let result = controller.submit_entry(id(1), "abc%").await;
        assert_eq!(result, Err(Error::InvalidBrightness("abc%".to_string())));
        assert!(transport.requests().is_empty());
        assert_eq!(controller.board().get(id(1)).unwrap().entry_text(), "50%");
    }

    #[tokio::test]
    async fn test_bridge_error_on_write() {
        let transport = MockTransport::new();
        transport.on_put(
            &state_url(2),
            200,
            r#"[{"error": {"type": 201, "address": "/lights/2/state/bri", "description": "parameter, bri, is not modifiable. Device is set to off."}}]"#,
        );
        let mut controller = controller(&transport);

        let result = controller.set_brightness(id(2), Brightness::create(30).unwrap()).await;
        assert!(matches!(result, Err(Error::Bridge { kind: 201, .. })));
        assert!(!controller.board().get(id(2)).unwrap().is_on());
        assert_eq!(controller.board().indicator(id(2)), Some(Indicator::Error));
    }

    #[tokio::test]
    async fn test_offline_controller() {
        let mut controller: Controller<MockTransport> = Controller::offline(Duration::from_secs(5));
        assert!(!controller.is_online());
        assert!(controller.board().is_empty());
        assert_eq!(controller.poll().await, 0);
        assert_eq!(controller.toggle(id(1)).await, Err(Error::LightNotFound(id(1))));
    }
}
