//! Engine configuration.

use std::str::FromStr;

use crate::error::{LifeError, LifeResult};
use crate::grid::MAX_DIMENSION;

/// Environment variable overriding [`EngineConfig::width`].
pub const WIDTH_VAR: &str = "LIFE_WIDTH";
/// Environment variable overriding [`EngineConfig::height`].
pub const HEIGHT_VAR: &str = "LIFE_HEIGHT";
/// Environment variable overriding [`EngineConfig::workers`].
pub const WORKERS_VAR: &str = "LIFE_WORKERS";

/// Grid size and worker count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EngineConfig {
    /// Grid width in cells.
    pub width: usize,
    /// Grid height in cells.
    pub height: usize,
    /// Number of bands, and of worker threads.
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            workers: 4,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            workers: 4,
        }
    }

    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub const fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Defaults overridden by `LIFE_WIDTH`, `LIFE_HEIGHT` and `LIFE_WORKERS`.
    ///
    /// Unset or unparsable variables fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str, default: usize| parse_or(lookup(key), default);
        Self {
            width: read(WIDTH_VAR, defaults.width),
            height: read(HEIGHT_VAR, defaults.height),
            workers: read(WORKERS_VAR, defaults.workers),
        }
    }

    /// Reject sizes the grid cannot hold and zero workers.
    pub fn validate(&self) -> LifeResult<()> {
        if self.width == 0
            || self.height == 0
            || self.width > MAX_DIMENSION
            || self.height > MAX_DIMENSION
        {
            return Err(LifeError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.workers == 0 {
            return Err(LifeError::NoWorkers);
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
