//! Engine error types.

use std::collections::TryReserveError;

use thiserror::Error;

/// Engine error type.
#[derive(Debug, Error)]
pub enum LifeError {
    /// Coordinate outside the addressable range of the grid.
    #[error("coordinate ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfRange {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },

    /// `flip_on` called on a live cell.
    #[error("cell ({x}, {y}) is already alive")]
    AlreadyAlive { x: i32, y: i32 },

    /// `flip_off` called on a dead cell.
    #[error("cell ({x}, {y}) is already dead")]
    AlreadyDead { x: i32, y: i32 },

    /// Zero-sized or oversized grid.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// A partition needs at least one worker.
    #[error("worker count must be at least 1")]
    NoWorkers,

    /// Plane allocation failed.
    #[error("failed to allocate {cells} cells")]
    Allocation {
        cells: usize,
        #[source]
        source: TryReserveError,
    },

    /// The worker thread pool could not be built.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// A band worker panicked; the generation was rolled back.
    #[error("worker for band {band} panicked during generation {generation}")]
    WorkerPanicked { band: usize, generation: u64 },
}

/// Result type for engine operations.
pub type LifeResult<T> = Result<T, LifeError>;
