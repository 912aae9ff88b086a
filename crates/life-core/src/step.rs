//! Step executor.
//!
//! # Generation
//!
//! ```text
//! step_generation():
//!   1. clear_borders            zero the padding ring
//!   2. snapshot                 copy alive + count planes
//!   3. dispatch                 one BandWorker per band on the pool
//!   4. join                     pool.scope returns when every band is Done
//!   5. commit or roll back      a panicked band restores the snapshot
//! ```

use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error, trace};

use crate::config::EngineConfig;
use crate::error::{LifeError, LifeResult};
use crate::grid::{Grid, Plane, PlaneView, Snapshot};
use crate::partition::{Band, compute_bands};
use crate::seam::{BandWorker, SeamGates, WorkerState};

/// Owns the grid, the per-generation snapshot, the bands, their seam gates and
/// the worker pool.
#[derive(Debug)]
pub struct Engine {
    grid: Grid,
    snapshot: Snapshot,
    bands: Vec<Band>,
    gates: SeamGates,
    pool: ThreadPool,
    generation: u64,
}

impl Engine {
    /// Allocate an all-dead grid and a pool of `config.workers` threads.
    pub fn new(config: EngineConfig) -> LifeResult<Self> {
        config.validate()?;
        let grid = Grid::new(config.width, config.height)?;
        Self::with_grid(grid, config.workers)
    }

    /// Drive an existing grid with `workers` bands.
    pub fn with_grid(grid: Grid, workers: usize) -> LifeResult<Self> {
        let bands = compute_bands(grid.height(), workers)?;
        let pool = build_pool(workers)?;
        debug!(
            width = grid.width(),
            height = grid.height(),
            workers,
            "engine ready"
        );

        Ok(Self {
            grid,
            snapshot: Snapshot::default(),
            gates: SeamGates::new(bands.len()),
            bands,
            pool,
            generation: 0,
        })
    }

    /// Advance one generation.
    ///
    /// If any band worker panics, the live planes are restored from the
    /// snapshot and the generation counter does not advance.
    pub fn step_generation(&mut self) -> LifeResult<()> {
        self.grid.clear_borders();
        self.grid.snapshot_into(&mut self.snapshot);

        let failed: Mutex<Option<usize>> = Mutex::new(None);
        {
            let grid = &self.grid;
            let snapshot = &self.snapshot;
            let gates = &self.gates;
            let bands = &self.bands;
            let failed = &failed;

            self.pool.scope(|scope| {
                for &band in bands {
                    scope.spawn(move |_| {
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                            let mut worker = BandWorker::new(grid, snapshot, band, gates);
                            worker.run();
                            debug_assert_eq!(worker.state(), WorkerState::Done);
                            worker.flips()
                        }));
                        match outcome {
                            Ok(flips) => trace!(band = band.index, flips, "band done"),
                            Err(_) => {
                                failed.lock().get_or_insert(band.index);
                            }
                        }
                    });
                }
            });
        }

        if let Some(band) = failed.into_inner() {
            let generation = self.generation + 1;
            error!(band, generation, "band worker panicked, rolling back");
            self.grid.restore_from(&self.snapshot);
            return Err(LifeError::WorkerPanicked { band, generation });
        }

        self.generation += 1;
        trace!(generation = self.generation, "generation complete");
        Ok(())
    }

    /// Refill the grid from an external bit source. See [`Grid::reseed`].
    pub fn randomize(&mut self, bits: impl IntoIterator<Item = bool>) {
        let population = self.grid.reseed(bits);
        debug!(population, "randomized grid");
    }

    /// Rebuild every neighbor count from the alive plane.
    pub fn recompute_all(&mut self) {
        self.grid.recompute_all();
    }

    /// Kill every cell.
    pub fn clear_all(&mut self) {
        self.grid.clear_all();
    }

    /// Make `(x, y)` alive. Returns whether the cell changed.
    pub fn set_alive(&mut self, x: i32, y: i32) -> LifeResult<bool> {
        self.grid.set_alive(x, y)
    }

    /// Make `(x, y)` dead. Returns whether the cell changed.
    pub fn clear_alive(&mut self, x: i32, y: i32) -> LifeResult<bool> {
        self.grid.clear_alive(x, y)
    }

    pub fn is_alive(&self, x: i32, y: i32) -> LifeResult<bool> {
        self.grid.is_alive(x, y)
    }

    pub fn neighbor_count(&self, x: i32, y: i32) -> LifeResult<u8> {
        self.grid.neighbor_count(x, y)
    }

    /// Rebuild bands, gates and pool for a new worker count. Cell state is
    /// kept; on error the old configuration stays in place.
    pub fn set_workers(&mut self, workers: usize) -> LifeResult<()> {
        let bands = compute_bands(self.grid.height(), workers)?;
        self.pool = build_pool(workers)?;
        self.gates = SeamGates::new(bands.len());
        self.bands = bands;
        debug!(workers, "rebuilt worker bands");
        Ok(())
    }

    /// Replace the grid with an all-dead one of a new size.
    pub fn resize(&mut self, width: usize, height: usize) -> LifeResult<()> {
        let bands = compute_bands(height, self.bands.len())?;
        self.grid.resize(width, height)?;
        self.gates = SeamGates::new(bands.len());
        self.bands = bands;
        debug!(width, height, "resized grid");
        Ok(())
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Read-only view for rendering.
    #[must_use]
    pub fn view(&self, plane: Plane) -> PlaneView<'_> {
        self.grid.view(plane)
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.grid.population()
    }

    /// Completed generations since construction.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.bands.len()
    }

    #[must_use]
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }
}

fn build_pool(workers: usize) -> LifeResult<ThreadPool> {
    Ok(ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("life-band-{i}"))
        .build()?)
}
