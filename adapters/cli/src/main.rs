#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Block Picker in a terminal.
//!
//! The main thread owns the progression controller and ticks it at a fixed
//! rate. A console thread reads commands from stdin and talks to the shared
//! [`CommandBridge`]; replies go to stdout and logs to stderr.

mod catalog_file;
mod console;
mod terminal;

use std::{
    io::{self, BufRead},
    path::PathBuf,
    sync::{
        mpsc::{self, Receiver, Sender, TryRecvError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use block_picker_bridge::{commands::CommandReply, pump, CommandBridge};
use block_picker_core::{CaptureMode, TICKS_PER_SECOND, TRANSITION_DWELL};
use block_picker_system_progression::{Config, ProgressionController};
use block_picker_world::{catalog::MapCatalog, query, GameState};
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    console::Control,
    terminal::{write_reply, Presenter},
};

/// Command-line arguments accepted by the Block Picker binary.
#[derive(Debug, Parser)]
#[command(name = "block-picker", about = "Chase the reward across a catalog of maps")]
struct Args {
    /// Advance through the catalog automatically after each capture.
    #[arg(long)]
    sequential: bool,
    /// Catalog index of the map shown on the title screen.
    #[arg(long, default_value_t = 0)]
    map: usize,
    /// TOML file with `[[maps]]` entries replacing the built-in catalog.
    #[arg(long, value_name = "PATH")]
    maps: Option<PathBuf>,
    /// Ticks per second of the game loop.
    #[arg(long, default_value_t = TICKS_PER_SECOND, value_parser = clap::value_parser!(u32).range(1..=120))]
    tick_rate: u32,
    /// Pause between a capture and the next map in sequential mode.
    #[arg(long, value_name = "MILLIS", default_value_t = TRANSITION_DWELL.as_millis() as u64)]
    dwell_ms: u64,
    /// What happens after a capture outside sequential mode.
    #[arg(long, value_enum, default_value_t = CaptureArg::Manual)]
    capture_mode: CaptureArg,
    /// Seed for reward placement; entropy when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Emit replies and frames as JSON lines.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CaptureArg {
    /// Stay on the reward screen until `start`.
    Manual,
    /// Move the reward and keep playing.
    Relocate,
}

impl From<CaptureArg> for CaptureMode {
    fn from(value: CaptureArg) -> Self {
        match value {
            CaptureArg::Manual => Self::ManualRestart,
            CaptureArg::Relocate => Self::Relocate,
        }
    }
}

/// Entry point for the Block Picker command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let catalog = match &args.maps {
        Some(path) => catalog_file::load_catalog(path)?,
        None => MapCatalog::builtin().context("built-in map catalog is malformed")?,
    };
    let state = match args.seed {
        Some(seed) => GameState::with_rng(catalog, 0, ChaCha8Rng::seed_from_u64(seed)),
        None => GameState::new(catalog, 0),
    }
    .context("failed to load the first map")?;
    let map_names: Vec<String> = query::map_names(&state)
        .into_iter()
        .map(str::to_owned)
        .collect();

    let config = Config::new(
        args.sequential,
        args.capture_mode.into(),
        Duration::from_millis(args.dwell_ms),
    );
    let mut controller = ProgressionController::new(state, config);
    controller
        .select_map(args.map)
        .with_context(|| format!("cannot open map {}", args.map))?;

    info!(
        maps = map_names.len(),
        map = args.map,
        sequential = args.sequential,
        tick_rate = args.tick_rate,
        "block picker ready"
    );

    let bridge = Arc::new(CommandBridge::new(controller.snapshot(Instant::now())));
    let (controls, control_rx) = mpsc::channel();
    let _console = spawn_console(Arc::clone(&bridge), controls, map_names, args.json)?;

    run(&bridge, &mut controller, &control_rx, args.tick_rate, args.json)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn spawn_console(
    bridge: Arc<CommandBridge>,
    controls: Sender<Control>,
    map_names: Vec<String>,
    json: bool,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("console".to_owned())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(error) => {
                        warn!(%error, "failed to read stdin");
                        return;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(reply) = console::dispatch(&line, &bridge, &controls, &map_names) {
                    if let Err(error) = write_reply(&mut io::stdout().lock(), &reply, json) {
                        warn!(%error, "failed to write reply");
                        return;
                    }
                }
            }
            debug!("stdin closed");
        })
        .context("failed to spawn the console thread")
}

fn run(
    bridge: &CommandBridge,
    controller: &mut ProgressionController,
    controls: &Receiver<Control>,
    tick_rate: u32,
    json: bool,
) -> Result<()> {
    let period = Duration::from_secs(1) / tick_rate;
    let mut presenter = Presenter::new(json);
    let mut events = Vec::new();

    loop {
        let now = Instant::now();
        loop {
            match controls.try_recv() {
                Ok(Control::Quit) => {
                    info!("quit requested");
                    return Ok(());
                }
                Ok(control) => {
                    let reply = handle_control(controller, control);
                    write_reply(&mut io::stdout().lock(), &reply, json)
                        .context("failed to write reply")?;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("console closed; shutting down");
                    return Ok(());
                }
            }
        }

        pump(bridge, controller, now, &mut events);
        for event in events.drain(..) {
            debug!(?event, "game event");
        }

        presenter
            .present(&bridge.snapshot(), &mut io::stdout().lock())
            .context("failed to write frame")?;

        thread::sleep(period.saturating_sub(now.elapsed()));
    }
}

fn handle_control(controller: &mut ProgressionController, control: Control) -> CommandReply {
    let outcome = match control {
        Control::Key(direction) => {
            let outcome = controller.move_player(direction);
            debug!(%direction, ?outcome, "keyboard move");
            Ok(format!("Moving {direction}"))
        }
        Control::SelectMap(index) => controller.select_map(index).map(|()| {
            format!(
                "Selected map {index}: {}",
                query::map_name(controller.state())
            )
        }),
        Control::Sequential(enabled) => controller
            .set_sequential(enabled)
            .map(|()| format!("Sequential mode {}", if enabled { "on" } else { "off" })),
        Control::Title => {
            controller.return_to_title();
            Ok("Back to the title screen".to_owned())
        }
        Control::Quit => Ok("Bye".to_owned()),
    };

    match outcome {
        Ok(message) => CommandReply { ok: true, message },
        Err(error) => CommandReply {
            ok: false,
            message: error.to_string(),
        },
    }
}
