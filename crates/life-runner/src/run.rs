//! Run control: pause, single-frame stepping and live edits on top of the
//! engine.

use std::fs::File;
use std::io::{self, BufReader};

use life_core::{ByteBits, Engine, LifeResult};
use rand::{Rng, rngs::SmallRng};
use tracing::{debug, info, warn};

const URANDOM: &str = "/dev/urandom";

/// Where reseeding bits come from.
#[derive(Debug)]
pub enum BitSource {
    /// `/dev/urandom`, reopened on every reseed.
    Urandom,
    /// Reproducible stream.
    Seeded(SmallRng),
}

impl BitSource {
    /// Refill `engine` from this source. Returns the new population.
    pub fn fill(&mut self, engine: &mut Engine) -> io::Result<usize> {
        match self {
            Self::Urandom => {
                let urandom = File::open(URANDOM)?;
                engine.randomize(ByteBits::new(BufReader::new(urandom)));
            }
            Self::Seeded(rng) => {
                engine.randomize(std::iter::repeat_with(|| rng.random::<bool>()));
            }
        }
        Ok(engine.population())
    }
}

/// Line commands read from stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pause,
    Step,
    Randomize,
    Clear,
    Set { x: i32, y: i32 },
    Kill { x: i32, y: i32 },
    Quit,
    Help,
    Unknown(String),
}

/// Whether the run loop should keep going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn parse_command(input: &str) -> Command {
    let line = input.trim().to_lowercase();
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["p" | "pause"] => Command::Pause,
        ["s" | "step"] => Command::Step,
        ["r" | "random"] => Command::Randomize,
        ["c" | "clear"] => Command::Clear,
        ["q" | "quit" | "exit"] => Command::Quit,
        ["help" | "h" | "?"] => Command::Help,
        [verb @ ("set" | "kill"), x, y] => match (x.parse::<i32>(), y.parse::<i32>()) {
            (Ok(x), Ok(y)) if *verb == "set" => Command::Set { x, y },
            (Ok(x), Ok(y)) => Command::Kill { x, y },
            _ => Command::Unknown(words.join(" ")),
        },
        _ => Command::Unknown(words.join(" ")),
    }
}

/// Drives an [`Engine`] one tick at a time.
///
/// While paused, a tick only advances if a frame step was requested.
#[derive(Debug)]
pub struct Runner {
    engine: Engine,
    source: BitSource,
    paused: bool,
    pending_frames: u32,
}

impl Runner {
    pub const fn new(engine: Engine, source: BitSource) -> Self {
        Self {
            engine,
            source,
            paused: false,
            pending_frames: 0,
        }
    }

    /// Flip between running and paused. Returns the new paused state.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        debug!(paused = self.paused, "toggled pause");
        self.paused
    }

    /// Queue one generation to run on the next tick, even while paused.
    pub fn request_frame(&mut self) {
        self.pending_frames = self.pending_frames.saturating_add(1);
    }

    /// Advance one generation if running or a frame is pending.
    ///
    /// Returns whether a generation was computed. A failed step still
    /// consumes the pending frame.
    pub fn tick(&mut self) -> LifeResult<bool> {
        if self.paused && self.pending_frames == 0 {
            return Ok(false);
        }
        self.pending_frames = self.pending_frames.saturating_sub(1);
        self.engine.step_generation()?;
        Ok(true)
    }

    /// Refill the grid from the configured source. Returns the population.
    pub fn reseed(&mut self) -> io::Result<usize> {
        self.source.fill(&mut self.engine)
    }

    /// Apply one command.
    ///
    /// Bad cell coordinates are logged and ignored; only a failing bit source
    /// is an error.
    pub fn apply(&mut self, command: Command) -> io::Result<Flow> {
        match command {
            Command::Pause => {
                let paused = self.toggle_pause();
                info!(paused, generation = self.engine.generation());
            }
            Command::Step => {
                self.request_frame();
                debug!(pending = self.pending_frames, "frame step queued");
            }
            Command::Randomize => {
                let population = self.reseed()?;
                info!(population, "reseeded grid");
            }
            Command::Clear => {
                self.engine.clear_all();
                info!("cleared grid");
            }
            Command::Set { x, y } => match self.engine.set_alive(x, y) {
                Ok(changed) => debug!(x, y, changed, "set cell"),
                Err(e) => warn!("set {x} {y}: {e}"),
            },
            Command::Kill { x, y } => match self.engine.clear_alive(x, y) {
                Ok(changed) => debug!(x, y, changed, "killed cell"),
                Err(e) => warn!("kill {x} {y}: {e}"),
            },
            Command::Quit => {
                info!("quit requested");
                return Ok(Flow::Quit);
            }
            Command::Help => {
                info!("commands: p/pause, s/step, r/random, c/clear, set x y, kill x y, q/quit, help");
            }
            Command::Unknown(s) => {
                if !s.is_empty() {
                    warn!("unknown command '{s}', type 'help' for commands");
                }
            }
        }
        Ok(Flow::Continue)
    }

    #[must_use]
    pub const fn pending_frames(&self) -> u32 {
        self.pending_frames
    }

    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }
}
