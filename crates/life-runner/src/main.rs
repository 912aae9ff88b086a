//! Headless Game of Life runner.
//!
//! Builds an engine from the environment, seeds it, and advances generations
//! while logging population. Line commands on stdin:
//! - `p` or `pause` - Toggle pause
//! - `s` or `step` - Advance one generation while paused
//! - `r` or `random` - Reseed from the configured source
//! - `c` or `clear` - Kill every cell
//! - `set x y`, `kill x y` - Edit one cell
//! - `q` or `quit` - Stop
//! - `help` - Show help
//!
//! Environment:
//! - `LIFE_WIDTH`, `LIFE_HEIGHT`, `LIFE_WORKERS` - grid size and bands
//! - `LIFE_GENERATIONS` - stop after this many generations (default 100)
//! - `LIFE_SOURCE` - `urandom` (default) or `seeded`
//! - `LIFE_SEED` - seed for the `seeded` source (default 0)

mod run;

use std::io::{self, BufRead};
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use eyre::{WrapErr, bail};
use life_core::{Engine, EngineConfig};
use rand::{SeedableRng, rngs::SmallRng};
use tracing::info;

use crate::run::{BitSource, Command, Flow, Runner, parse_command};

const GENERATIONS_VAR: &str = "LIFE_GENERATIONS";
const SOURCE_VAR: &str = "LIFE_SOURCE";
const SEED_VAR: &str = "LIFE_SEED";

/// Log population every this many generations.
const REPORT_EVERY: u64 = 10;

const IDLE: Duration = Duration::from_millis(10);

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("life_runner=info".parse()?)
                .add_directive("life_core=info".parse()?),
        )
        .init();

    let config = EngineConfig::from_env();
    config.validate().wrap_err("invalid engine configuration")?;
    info!(
        width = config.width,
        height = config.height,
        workers = config.workers,
        "starting life runner"
    );

    let generations: u64 = env_or(GENERATIONS_VAR, 100);

    let source = match std::env::var(SOURCE_VAR).as_deref() {
        Ok("urandom") | Err(_) => BitSource::Urandom,
        Ok("seeded") => {
            let seed: u64 = env_or(SEED_VAR, 0);
            info!(seed, "seeding from SmallRng");
            BitSource::Seeded(SmallRng::seed_from_u64(seed))
        }
        Ok(other) => bail!("unknown {SOURCE_VAR} {other:?}, expected urandom or seeded"),
    };

    let mut runner = Runner::new(Engine::new(config)?, source);
    let population = runner.reseed().wrap_err("seeding grid")?;
    info!(population, "seeded grid");

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    thread::spawn(move || input_thread(&cmd_tx));

    let started = Instant::now();
    let mut input_open = true;

    'run: while runner.engine().generation() < generations {
        loop {
            match cmd_rx.try_recv() {
                Ok(command) => {
                    if runner.apply(command).wrap_err("reseeding grid")? == Flow::Quit {
                        break 'run;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    input_open = false;
                    break;
                }
            }
        }

        if runner.tick()? {
            let generation = runner.engine().generation();
            if generation % REPORT_EVERY == 0 {
                info!(generation, population = runner.engine().population());
            }
        } else if input_open {
            thread::sleep(IDLE);
        } else {
            info!("paused with no input left, stopping");
            break;
        }
    }

    info!(
        generation = runner.engine().generation(),
        population = runner.engine().population(),
        elapsed_ms = started.elapsed().as_millis(),
        "done"
    );
    Ok(())
}

fn input_thread(tx: &mpsc::Sender<Command>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let cmd = parse_command(&line);
        let is_quit = matches!(cmd, Command::Quit);
        if tx.send(cmd).is_err() || is_quit {
            break;
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
