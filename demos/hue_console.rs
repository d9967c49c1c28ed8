//! Interactive terminal controller for Hue lights.
//!
//! Finds the bridge, pairs if needed, then polls every light in the
//! background and accepts commands on stdin:
//!
//! ```text
//! list                show all lights
//! toggle <id>         flip a light on/off
//! on <id> | off <id>  switch a light
//! bri <id> <value>    set brightness, e.g. `bri 1 40%`
//! quit
//! ```
//!
//! Run with: cargo run --example hue_console

use std::time::Duration;

use hue_lights_rs::{
    Command, ControllerConfig, Error, Event, HttpTransport, LightBoard, LightId, PollCountdown,
    PowerMode, Session, SessionState, SyncWorker,
};
use tokio::io::{AsyncBufReadExt, BufReader};

fn print_board(board: &LightBoard, countdown: &PollCountdown) {
    for light in board.lights() {
        println!(
            "  [{}] {:<16} {:<5} {}",
            light.id(),
            light.name(),
            light.indicator().to_string(),
            light.entry_text()
        );
    }
    println!("  next update in {}s", countdown.remaining().as_secs());
}

fn parse_id(arg: Option<&str>) -> Result<LightId, String> {
    arg.ok_or("missing light id")?
        .parse::<LightId>()
        .map_err(|e| e.to_string())
}

/// Turn a typed line into a command, applying it to the board.
fn handle_line(board: &mut LightBoard, line: &str) -> Result<Option<Command>, String> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default();
    let command = match verb {
        "" => return Ok(None),
        "toggle" => board.begin_toggle(parse_id(parts.next())?),
        "on" => board.begin_power(parse_id(parts.next())?, PowerMode::On),
        "off" => board.begin_power(parse_id(parts.next())?, PowerMode::Off),
        "bri" => {
            let id = parse_id(parts.next())?;
            let text = parts.collect::<Vec<_>>().join(" ");
            board.set_entry_text(id, &text).map_err(|e| e.to_string())?;
            board.submit_entry(id, &text)
        }
        other => return Err(format!("unknown command {other:?}")),
    };
    command.map(Some).map_err(|e| match e {
        Error::InvalidBrightness(_) => format!("{e}; keeping the previous value"),
        e => e.to_string(),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ControllerConfig::load(ControllerConfig::DEFAULT_CONFIG_FILE)?;
    println!("Looking for a Hue bridge...");
    let mut session = Session::start(config, HttpTransport::new()).await;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    match session.state() {
        SessionState::NoBridge => println!("No Hue bridge found; light control is disabled."),
        SessionState::Unpaired => loop {
            println!(
                "Press the button on your Hue Bridge, then press Enter to connect (or type quit)."
            );
            let Some(line) = stdin.next_line().await? else {
                return Ok(());
            };
            if line.trim() == "quit" {
                return Ok(());
            }
            match session.pair().await {
                Ok(_) => {
                    println!("Success! Connected to the bridge.");
                    break;
                }
                Err(Error::PairingRejected(_)) => {
                    println!("Press the bridge button and try again.")
                }
                Err(e) => println!("Error: {e}"),
            }
        },
        SessionState::Paired => {}
    }

    let mut known = session.known_lights();
    let mut controller = session.controller(&mut known).await;
    controller.poll().await;

    print_board(controller.board(), controller.countdown());

    let Some(client) = controller.client().cloned() else {
        println!("Nothing to control. Bye.");
        return Ok(());
    };
    let (worker, mut events) = SyncWorker::spawn(client);
    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let mut poll_pending = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !poll_pending && controller.countdown().is_due() {
                    worker.poll(controller.board().ids())?;
                    poll_pending = true;
                }
            }
            Some(event) = events.recv() => {
                if let Some(follow_up) = controller.apply_event(&event) {
                    worker.send(follow_up)?;
                }
                if let Event::Polled(_) = event {
                    poll_pending = false;
                    print_board(controller.board(), controller.countdown());
                }
            }
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "quit" => break,
                    "list" => print_board(controller.board(), controller.countdown()),
                    line => match handle_line(controller.board_mut(), line) {
                        Ok(Some(command)) => worker.send(command)?,
                        Ok(None) => {}
                        Err(message) => println!("  {message}"),
                    },
                }
            }
        }
    }

    worker.shutdown().await;
    Ok(())
}
