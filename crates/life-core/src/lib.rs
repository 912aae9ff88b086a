//! Banded parallel Game of Life.
//!
//! A fixed `W x H` grid surrounded by an always-dead padding ring. Two planes
//! are kept in lockstep: the alive plane and a live-neighbor-count plane that
//! is updated incrementally on every flip.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Engine (step executor)                                             │
//! │    - clears the padding ring, snapshots both planes                 │
//! │    - runs one BandWorker per band on a rayon pool                   │
//! │    - rolls back the generation if a worker panics                   │
//! └─────────────────────────────────────────────────────────────────────┘
//!          │ bands (partition)            │ seam gates (seam)
//!          ▼                              ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  BandWorker                                                         │
//! │    - top 2 rows under the upper gate                                │
//! │    - interior rows with no lock                                     │
//! │    - bottom 2 rows under the lower gate                             │
//! └─────────────────────────────────────────────────────────────────────┘
//!          │ flip_on / flip_off (neighbor)
//!          ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Grid: alive + neighbor-count planes, bordered addressing           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use life_core::{Engine, EngineConfig, Plane};
//!
//! let mut engine = Engine::new(EngineConfig::new(64, 64).with_workers(4))?;
//! engine.set_alive(10, 10)?;
//! engine.set_alive(11, 10)?;
//! engine.set_alive(12, 10)?;
//!
//! engine.step_generation()?;
//!
//! let pixels = engine.view(Plane::Alive).to_vec();
//! ```

mod bits;
mod config;
mod error;
mod grid;
mod neighbor;
mod partition;
mod seam;
mod step;

pub use bits::ByteBits;
pub use config::{EngineConfig, HEIGHT_VAR, WIDTH_VAR, WORKERS_VAR};
pub use error::{LifeError, LifeResult};
pub use grid::{Grid, MAX_DIMENSION, Plane, PlaneView};
pub use partition::{Band, SEAM_ROWS, compute_bands};
pub use seam::SeamGates;
pub use step::Engine;
