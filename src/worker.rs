//! Background execution of polls and writes.
//!
//! The [`SyncWorker`] performs network requests on tokio tasks and reports
//! results as [`Event`]s over a channel. It never touches light state: the
//! owner of the [`LightBoard`] applies each event, so light state keeps a
//! single writer while a slow bridge no longer stalls the caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::board::{Command, CommandOutcome, LightBoard, PollReport};
use crate::bridge::BridgeClient;
use crate::controller::{poll_lights, send_command};
use crate::errors::Error;
use crate::transport::Transport;
use crate::types::LightId;

type Result<T> = std::result::Result<T, Error>;

/// Work handed to the worker.
#[derive(Debug)]
pub enum Request {
    Poll(Vec<LightId>),
    Send(Command),
}

/// A finished request.
#[derive(Debug)]
pub enum Event {
    Polled(PollReport),
    Finished(CommandOutcome),
}

impl Event {
    /// Apply this event to the board.
    ///
    /// Returns the follow-up command a successful power-on produces.
    pub fn apply_to(&self, board: &mut LightBoard) -> Option<Command> {
        match self {
            Event::Polled(report) => {
                board.apply_poll(report);
                None
            }
            Event::Finished(outcome) => board.finish(&outcome.command, &outcome.result),
        }
    }
}

/// Handle to the background request loop.
///
/// Polls and writes run concurrently, so an in-flight write never delays a
/// poll. A poll requested while the previous one is still running is
/// skipped.
#[derive(Debug)]
pub struct SyncWorker {
    requests: mpsc::UnboundedSender<Request>,
    handle: JoinHandle<()>,
}

impl SyncWorker {
    /// Start the worker on the current tokio runtime.
    pub fn spawn<T: Transport>(client: BridgeClient<T>) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Request>();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let client = Arc::new(client);
        let polling = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn(async move {
            while let Some(request) = request_rx.recv().await {
                let client = Arc::clone(&client);
                let events = event_tx.clone();
                match request {
                    Request::Poll(ids) => {
                        if polling.swap(true, Ordering::SeqCst) {
                            debug!("previous poll still running, skipping");
                            continue;
                        }
                        let polling = Arc::clone(&polling);
                        tokio::spawn(async move {
                            let report = poll_lights(&client, &ids).await;
                            polling.store(false, Ordering::SeqCst);
                            let _ = events.send(Event::Polled(report));
                        });
                    }
                    Request::Send(command) => {
                        tokio::spawn(async move {
                            let result = send_command(&client, &command).await;
                            let outcome = CommandOutcome { command, result };
                            let _ = events.send(Event::Finished(outcome));
                        });
                    }
                }
            }
            debug!("sync worker stopped");
        });

        (
            SyncWorker {
                requests: request_tx,
                handle,
            },
            event_rx,
        )
    }

    pub fn poll(&self, ids: Vec<LightId>) -> Result<()> {
        self.requests
            .send(Request::Poll(ids))
            .map_err(|_| Error::WorkerStopped)
    }

    pub fn send(&self, command: Command) -> Result<()> {
        self.requests
            .send(Request::Send(command))
            .map_err(|_| Error::WorkerStopped)
    }

    /// Stop accepting requests and wait for the request loop to end.
    ///
    /// Requests already started still deliver their events.
    pub async fn shutdown(self) {
        drop(self.requests);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::bridge::BridgeAddress;
    use crate::config::Timeouts;
    use crate::light::Indicator;
    use crate::pairing::Credential;
    use crate::transport::mock::{Method, MockTransport};
    use crate::types::PowerMode;

    const LIGHTS: &str = "http://10.0.0.5/api/user/lights";

    fn id(value: u16) -> LightId {
        LightId::new(value).unwrap()
    }

    fn client(transport: &MockTransport) -> BridgeClient<MockTransport> {
        BridgeClient::new(
            transport.clone(),
            BridgeAddress::new("10.0.0.5"),
            Credential::new("user"),
            Timeouts::default(),
        )
    }

    fn board() -> LightBoard {
        LightBoard::new(&BTreeMap::from([
            (id(1), "Sotto".to_string()),
            (id(2), "Sopra".to_string()),
        ]))
    }

    #[tokio::test]
    async fn test_poll_event() {
        let transport = MockTransport::new();
        transport.on_get(&format!("{LIGHTS}/1"), 200, r#"{"state": {"on": true, "bri": 254}}"#);
        let mut board = board();
        let (worker, mut events) = SyncWorker::spawn(client(&transport));

        worker.poll(board.ids()).unwrap();
        let event = events.recv().await.unwrap();
        assert!(matches!(&event, Event::Polled(report) if report.failures() == 1));
        assert_eq!(event.apply_to(&mut board), None);

        assert_eq!(board.indicator(id(1)), Some(Indicator::On));
        assert_eq!(board.indicator(id(2)), Some(Indicator::Error));
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_command_round_trip_with_follow_up() {
        let transport = MockTransport::new();
        let url = format!("{LIGHTS}/2/state");
        transport.on_put(&url, 200, r#"[{"success": {}}]"#);
        let mut board = board();
        let (worker, mut events) = SyncWorker::spawn(client(&transport));

        let command = board.begin_power(id(2), PowerMode::On).unwrap();
        worker.send(command).unwrap();

        let event = events.recv().await.unwrap();
        let follow_up = event.apply_to(&mut board).unwrap();
        assert_eq!(board.indicator(id(2)), Some(Indicator::On));

        worker.send(follow_up).unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event.apply_to(&mut board), None);
        assert_eq!(transport.count(Method::Put, &url), 2);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_command_reverts() {
        let transport = MockTransport::new();
        let mut board = board();
        let (worker, mut events) = SyncWorker::spawn(client(&transport));

        let command = board.begin_toggle(id(1)).unwrap();
        assert!(board.get(id(1)).unwrap().is_on());
        worker.send(command).unwrap();

        let event = events.recv().await.unwrap();
        event.apply_to(&mut board);
        assert!(!board.get(id(1)).unwrap().is_on());
        assert_eq!(board.indicator(id(1)), Some(Indicator::Error));
        worker.shutdown().await;
    }
}
