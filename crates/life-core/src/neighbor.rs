//! Incremental neighbor-count maintenance.
//!
//! Every change to the alive plane goes through [`Grid::flip_on`] or
//! [`Grid::flip_off`], which touch exactly the eight surrounding count cells.
//! A full rescan ([`Grid::recompute_all`]) is only used after bulk reseeding.

use std::sync::atomic::Ordering;

use crate::error::{LifeError, LifeResult};
use crate::grid::Grid;

impl Grid {
    /// Arena indices of the eight neighbors of an interior cell.
    #[inline]
    pub(crate) fn neighbors_of(&self, idx: usize) -> [usize; 8] {
        let s = self.stride();
        [
            idx - s - 1,
            idx - s,
            idx - s + 1,
            idx - 1,
            idx + 1,
            idx + s - 1,
            idx + s,
            idx + s + 1,
        ]
    }

    /// Flip the interior cell at `idx`. Returns `false`, touching nothing,
    /// if the cell was already in the target state.
    ///
    /// Takes `&self`: band workers flip concurrently. The compare-exchange on
    /// the alive cell makes the state check and the write one step.
    #[inline]
    pub(crate) fn flip_at(&self, idx: usize, on: bool) -> bool {
        let (from, to) = if on { (0, 1) } else { (1, 0) };
        if self.alive[idx]
            .compare_exchange(from, to, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }
        for n in self.neighbors_of(idx) {
            if on {
                self.count[n].fetch_add(1, Ordering::Relaxed);
            } else {
                // Padding counts may wrap; they are zeroed before every generation.
                self.count[n].fetch_sub(1, Ordering::Relaxed);
            }
        }
        true
    }

    /// Bring a dead interior cell to life.
    ///
    /// Fails with [`LifeError::AlreadyAlive`] if the cell is alive.
    pub fn flip_on(&self, x: i32, y: i32) -> LifeResult<()> {
        let idx = self.interior_index(x, y)?;
        if self.flip_at(idx, true) {
            Ok(())
        } else {
            Err(LifeError::AlreadyAlive { x, y })
        }
    }

    /// Kill a live interior cell.
    ///
    /// Fails with [`LifeError::AlreadyDead`] if the cell is dead.
    pub fn flip_off(&self, x: i32, y: i32) -> LifeResult<()> {
        let idx = self.interior_index(x, y)?;
        if self.flip_at(idx, false) {
            Ok(())
        } else {
            Err(LifeError::AlreadyDead { x, y })
        }
    }

    /// Rebuild every interior count from the alive plane, then zero the ring.
    pub fn recompute_all(&mut self) {
        self.clear_borders();

        let (width, height, stride) = (self.width(), self.height(), self.stride());
        for y in 1..=height {
            for x in 1..=width {
                let idx = y * stride + x;
                let sum: u8 = self
                    .neighbors_of(idx)
                    .iter()
                    .map(|&n| self.alive[n].load(Ordering::Relaxed))
                    .sum();
                self.count[idx].store(sum, Ordering::Relaxed);
            }
        }
    }

    /// Overwrite the alive plane from `bits`, then rebuild every count.
    ///
    /// Cells are filled column by column (`x` outer, `y` inner). Once `bits`
    /// runs dry the remaining cells are dead. Returns the new population.
    pub fn reseed(&mut self, bits: impl IntoIterator<Item = bool>) -> usize {
        let mut bits = bits.into_iter();
        let (width, height, stride) = (self.width(), self.height(), self.stride());
        let mut population = 0;

        for x in 1..=width {
            for y in 1..=height {
                let on = bits.next().unwrap_or(false);
                population += usize::from(on);
                *self.alive[y * stride + x].get_mut() = u8::from(on);
            }
        }
        self.recompute_all();
        population
    }

    /// Force-zero both planes on the one-cell padding ring, corners included.
    pub fn clear_borders(&mut self) {
        let (width, height, stride) = (self.width(), self.height(), self.stride());
        let last_row = (height + 1) * stride;

        let ring = (0..stride)
            .chain(last_row..last_row + stride)
            .chain((1..=height).flat_map(|y| [y * stride, y * stride + width + 1]));

        for idx in ring {
            *self.alive[idx].get_mut() = 0;
            *self.count[idx].get_mut() = 0;
        }
    }
}
