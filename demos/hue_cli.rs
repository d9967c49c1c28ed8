//! CLI application for controlling Hue lights.
//!
//! Each invocation finds the bridge, uses the stored credential and runs a
//! single command.
//!
//! Run with: cargo run --example hue_cli -- --help

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hue_lights_rs::{
    BridgeLocator, Controller, ControllerConfig, HttpTransport, LightId, PowerMode, Session,
    SessionState, Strategy,
};
use strum::IntoEnumIterator;

#[derive(Parser)]
#[command(name = "hue-cli")]
#[command(about = "Control Philips Hue lights from the command line", long_about = None)]
struct Cli {
    /// Bridge address to try before the cloud lookup and the LAN scan
    #[arg(short, long, global = true)]
    bridge: Option<String>,

    /// Configuration file
    #[arg(short, long, global = true, default_value = ControllerConfig::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every discovery strategy and report what each one finds
    Discover,

    /// Register with the bridge (press its link button first)
    Pair,

    /// List the available lights and their state
    Lights,

    /// Turn a light on
    On { id: LightId },

    /// Turn a light off
    Off { id: LightId },

    /// Toggle a light on/off
    Toggle { id: LightId },

    /// Set brightness in percent, e.g. `40` or `40%`
    Brightness { id: LightId, level: String },
}

async fn connect(
    session: &Session<HttpTransport>,
) -> Result<Controller<HttpTransport>, Box<dyn std::error::Error>> {
    match session.state() {
        SessionState::NoBridge => return Err("no Hue bridge found".into()),
        SessionState::Unpaired => return Err("not paired yet, run `hue-cli pair` first".into()),
        SessionState::Paired => {}
    }
    let mut controller = session.controller(&mut session.known_lights()).await;
    let failures = controller.poll().await;
    if failures > 0 {
        eprintln!("{failures} light(s) did not answer");
    }
    Ok(controller)
}

fn print_lights(controller: &Controller<HttpTransport>) {
    if controller.board().is_empty() {
        println!("No lights found.");
        return;
    }
    for light in controller.board().lights() {
        println!(
            "  {:>3}  {:<20} {:<5} {}",
            light.id().to_string(),
            light.name(),
            light.indicator().to_string(),
            light.brightness()
        );
    }
}

async fn discover(config: ControllerConfig, transport: HttpTransport) {
    let locator = BridgeLocator::new(transport, config);
    for strategy in Strategy::iter() {
        println!("Trying {strategy}...");
        match locator.try_strategy(strategy).await {
            Ok(Some(address)) => println!("  found bridge at {address}"),
            Ok(None) => println!("  nothing found"),
            Err(e) => eprintln!("  error: {e}"),
        }
    }
}

async fn open_session(
    config: ControllerConfig,
    transport: HttpTransport,
) -> Session<HttpTransport> {
    let session = Session::start(config, transport).await;
    if let Some(bridge) = session.bridge() {
        println!("Using bridge at {} (found via {})", bridge.address, bridge.strategy);
    }
    session
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = ControllerConfig::load(&cli.config)?;
    if cli.bridge.is_some() {
        config.fixed_ip = cli.bridge;
    }
    let transport = HttpTransport::new();

    match cli.command {
        Commands::Discover => discover(config, transport).await,

        Commands::Pair => {
            let mut session = open_session(config, transport).await;
            match session.pair().await {
                Ok(_) => println!(
                    "Paired. Credential saved to {}",
                    session.config().credential_path.display()
                ),
                Err(e) => eprintln!("Error: {e}"),
            }
        }

        Commands::Lights => {
            let session = open_session(config, transport).await;
            print_lights(&connect(&session).await?);
        }

        Commands::On { id } => {
            let session = open_session(config, transport).await;
            let mut controller = connect(&session).await?;
            match controller.set_power(id, PowerMode::On).await {
                Ok(_) => println!("Light {id} turned ON"),
                Err(e) => eprintln!("Error: {e}"),
            }
        }

        Commands::Off { id } => {
            let session = open_session(config, transport).await;
            let mut controller = connect(&session).await?;
            match controller.set_power(id, PowerMode::Off).await {
                Ok(_) => println!("Light {id} turned OFF"),
                Err(e) => eprintln!("Error: {e}"),
            }
        }

        Commands::Toggle { id } => {
            let session = open_session(config, transport).await;
            let mut controller = connect(&session).await?;
            match controller.toggle(id).await {
                Ok(_) => println!("Light {id} toggled"),
                Err(e) => eprintln!("Error: {e}"),
            }
        }

        Commands::Brightness { id, level } => {
            let session = open_session(config, transport).await;
            let mut controller = connect(&session).await?;
            match controller.submit_entry(id, &level).await {
                Ok(_) => {
                    let shown = controller.board().get(id).map(|light| light.brightness());
                    if let Some(brightness) = shown {
                        println!("Light {id} set to {brightness}");
                    }
                }
                Err(e) => eprintln!("Error: {e}"),
            }
        }
    }

    Ok(())
}
