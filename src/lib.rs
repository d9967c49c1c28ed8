//! # hue_lights_rs
//!
//! An async Rust library for finding a Philips Hue bridge on the local
//! network and keeping the state of its lights in sync.
//!
//! The crate covers the non-visual half of a light controller: bridge
//! discovery, pairing, light discovery, periodic polling and the dispatch of
//! power and brightness changes. A front-end (desktop, terminal, web) only
//! has to render a [`LightBoard`] and forward user intents to it.
//!
//! ## Quick Start
//!
//! ```ignore
//! use hue_lights_rs::{Brightness, ControllerConfig, HttpTransport, LightId, Session};
//!
//! async fn dim_first_light() -> Result<(), hue_lights_rs::Error> {
//!     let session = Session::start(ControllerConfig::default(), HttpTransport::new()).await;
//!     let mut controller = session.controller(&mut session.known_lights()).await;
//!     controller.poll().await;
//!
//!     if let Some(id) = controller.board().ids().first().copied() {
//!         controller.set_brightness(id, Brightness::create(30).unwrap()).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Discovery**: fixed address, then the Hue cloud service, then a scan
//!   of the local /24, see [`BridgeLocator`]
//! - **Pairing**: link-button registration with a persisted [`Credential`]
//! - **Known lights**: a validated cache that avoids fetching the whole
//!   collection, see [`KnownLights`]
//! - **Optimistic updates**: changes show immediately and revert to the last
//!   confirmed state when the bridge rejects them, see [`LightBoard`]
//! - **Background sync**: [`SyncWorker`] runs requests off the caller's task
//!   and hands results back as events
//!
//! ## Communication
//!
//! All bridge traffic is plain HTTP against the bridge's v1 REST API
//! (`/api/<username>/lights`). The cloud lookup uses HTTPS.
//!
//! ## Feature Flags
//!
//! - `rustls-tls` (default): TLS for the cloud lookup via rustls
//! - `native-tls`: TLS via the platform library

mod board;
mod bridge;
mod cache;
mod config;
mod controller;
mod countdown;
mod discovery;
mod errors;
mod light;
mod pairing;
mod payload;
mod response;
mod session;
mod status;
pub mod transport;
mod types;
mod worker;

// Re-export public API
pub use board::{Command, CommandKind, CommandOutcome, LightBoard, PollReport};
pub use bridge::{BridgeAddress, BridgeClient};
pub use cache::{Freshness, KnownLights, discover_lights, full_discovery, reachable_lights};
pub use config::{ControllerConfig, Timeouts};
pub use controller::{Controller, poll_lights, send_command};
pub use countdown::PollCountdown;
pub use discovery::{BridgeLocator, DiscoveredBridge, Strategy, subnet_hosts};
pub use errors::Error;
pub use light::{Indicator, Light};
pub use pairing::{Credential, CredentialStore, pair};
pub use payload::StatePayload;
pub use response::{ApiEntry, ApiError};
pub use session::{Session, SessionState};
pub use status::{BridgeLight, BridgeLightState, LightReading, LightState};
pub use transport::{HttpResponse, HttpTransport, Transport};
pub use types::{Brightness, InvalidLightId, LightId, PowerMode};
pub use worker::{Event, Request, SyncWorker};
