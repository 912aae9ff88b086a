//! Grid store: two co-indexed planes behind a one-cell padding ring.
//!
//! ```text
//!   -1  0  1 ... W-1  W
//! -1 .  .  .      .   .     padding ring (always dead)
//!  0 .  #  #      #   .
//!  1 .  #  #      #   .     interior W x H
//!  ...
//!  H .  .  .      .   .
//! ```
//!
//! Both planes live in one flat arena each, row-major, with stride `W + 2`.
//! Cells are `AtomicU8` so band workers can flip cells through a shared
//! reference; every other path goes through `&mut Grid`.

use std::sync::atomic::{AtomicU8, Ordering};

use tracing::debug;

use crate::error::{LifeError, LifeResult};

/// Largest supported width or height. Keeps every padded coordinate in `i32`.
pub const MAX_DIMENSION: usize = (i32::MAX - 2) as usize;

/// Which plane a [`PlaneView`] exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Plane {
    /// Cell state, 0 or 1.
    #[default]
    Alive,
    /// Live-neighbor count, 0 through 8.
    NeighborCount,
}

impl Plane {
    /// The other plane.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Alive => Self::NeighborCount,
            Self::NeighborCount => Self::Alive,
        }
    }
}

/// The live alive/count planes.
#[derive(Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    /// `width + 2`
    stride: usize,
    pub(crate) alive: Vec<AtomicU8>,
    pub(crate) count: Vec<AtomicU8>,
}

impl Grid {
    /// Create an all-dead grid.
    pub fn new(width: usize, height: usize) -> LifeResult<Self> {
        let len = padded_len(width, height)?;
        let grid = Self {
            width,
            height,
            stride: width + 2,
            alive: zeroed_plane(len)?,
            count: zeroed_plane(len)?,
        };
        debug!(width, height, cells = len, "allocated grid");
        Ok(grid)
    }

    /// Logical width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Logical height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn stride(&self) -> usize {
        self.stride
    }

    /// Number of cells in each padded plane.
    pub(crate) fn padded_len(&self) -> usize {
        self.alive.len()
    }

    /// Whether `(x, y)` is an interior cell.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Whether `(x, y)` is addressable, i.e. interior or on the padding ring.
    #[must_use]
    pub fn contains_padded(&self, x: i32, y: i32) -> bool {
        x >= -1 && y >= -1 && (x as i64) <= self.width as i64 && (y as i64) <= self.height as i64
    }

    /// Arena index of `(x, y)`. Caller guarantees `contains_padded`.
    #[inline]
    pub(crate) fn offset(&self, x: i32, y: i32) -> usize {
        (y + 1) as usize * self.stride + (x + 1) as usize
    }

    /// Arena index of `(x, y)` anywhere on the padded grid.
    pub(crate) fn padded_index(&self, x: i32, y: i32) -> LifeResult<usize> {
        if self.contains_padded(x, y) {
            Ok(self.offset(x, y))
        } else {
            Err(self.out_of_range(x, y))
        }
    }

    /// Arena index of an interior cell. Only interior cells may be written.
    pub(crate) fn interior_index(&self, x: i32, y: i32) -> LifeResult<usize> {
        if self.contains(x, y) {
            Ok(self.offset(x, y))
        } else {
            Err(self.out_of_range(x, y))
        }
    }

    fn out_of_range(&self, x: i32, y: i32) -> LifeError {
        LifeError::OutOfRange {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }

    /// Whether `(x, y)` is alive. The padding ring reads as dead.
    pub fn is_alive(&self, x: i32, y: i32) -> LifeResult<bool> {
        let idx = self.padded_index(x, y)?;
        Ok(self.alive[idx].load(Ordering::Relaxed) != 0)
    }

    /// Live-neighbor count of `(x, y)`.
    ///
    /// Exact for interior cells. Counts on the padding ring are scratch values
    /// written by edge flips and zeroed before every generation.
    pub fn neighbor_count(&self, x: i32, y: i32) -> LifeResult<u8> {
        let idx = self.padded_index(x, y)?;
        Ok(self.count[idx].load(Ordering::Relaxed))
    }

    /// Make `(x, y)` alive. Returns whether the cell changed.
    pub fn set_alive(&mut self, x: i32, y: i32) -> LifeResult<bool> {
        if self.is_alive(x, y)? {
            return Ok(false);
        }
        self.flip_on(x, y)?;
        Ok(true)
    }

    /// Make `(x, y)` dead. Returns whether the cell changed.
    pub fn clear_alive(&mut self, x: i32, y: i32) -> LifeResult<bool> {
        if !self.is_alive(x, y)? {
            self.interior_index(x, y)?;
            return Ok(false);
        }
        self.flip_off(x, y)?;
        Ok(true)
    }

    /// Reset both planes to zero.
    pub fn clear_all(&mut self) {
        for cell in self.alive.iter_mut().chain(self.count.iter_mut()) {
            *cell.get_mut() = 0;
        }
    }

    /// Replace the planes with all-dead planes of a new size.
    pub fn resize(&mut self, width: usize, height: usize) -> LifeResult<()> {
        *self = Self::new(width, height)?;
        Ok(())
    }

    /// Number of live interior cells.
    #[must_use]
    pub fn population(&self) -> usize {
        (0..self.height)
            .map(|y| {
                let start = (y + 1) * self.stride + 1;
                self.alive[start..start + self.width]
                    .iter()
                    .filter(|cell| cell.load(Ordering::Relaxed) != 0)
                    .count()
            })
            .sum()
    }

    /// Read-only view over one plane.
    #[must_use]
    pub fn view(&self, plane: Plane) -> PlaneView<'_> {
        PlaneView { grid: self, plane }
    }

    /// Copy both planes into `snapshot`, reallocating it if the size changed.
    pub(crate) fn snapshot_into(&self, snapshot: &mut Snapshot) {
        let len = self.padded_len();
        if snapshot.alive.len() != len {
            snapshot.alive = vec![0; len];
            snapshot.count = vec![0; len];
        }
        snapshot.stride = self.stride;
        for (dst, src) in snapshot.alive.iter_mut().zip(&self.alive) {
            *dst = src.load(Ordering::Relaxed);
        }
        for (dst, src) in snapshot.count.iter_mut().zip(&self.count) {
            *dst = src.load(Ordering::Relaxed);
        }
    }

    /// Overwrite both planes with a snapshot of this grid.
    pub(crate) fn restore_from(&mut self, snapshot: &Snapshot) {
        debug_assert_eq!(snapshot.alive.len(), self.padded_len());
        for (dst, &src) in self.alive.iter_mut().zip(&snapshot.alive) {
            *dst.get_mut() = src;
        }
        for (dst, &src) in self.count.iter_mut().zip(&snapshot.count) {
            *dst.get_mut() = src;
        }
    }
}

/// Frozen copy of both planes taken at the start of a generation.
#[derive(Debug, Default, Clone)]
pub(crate) struct Snapshot {
    stride: usize,
    alive: Vec<u8>,
    count: Vec<u8>,
}

impl Snapshot {
    #[inline]
    pub(crate) fn alive_at(&self, idx: usize) -> bool {
        self.alive[idx] != 0
    }

    #[inline]
    pub(crate) fn count_at(&self, idx: usize) -> u8 {
        self.count[idx]
    }

    pub(crate) fn stride(&self) -> usize {
        self.stride
    }
}

/// Read-only view over one plane of a [`Grid`], interior cells only.
#[derive(Clone, Copy)]
pub struct PlaneView<'a> {
    grid: &'a Grid,
    plane: Plane,
}

impl<'a> PlaneView<'a> {
    /// The plane this view reads.
    #[must_use]
    pub fn plane(&self) -> Plane {
        self.plane
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.grid.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.grid.height
    }

    fn cells(&self) -> &'a [AtomicU8] {
        match self.plane {
            Plane::Alive => &self.grid.alive,
            Plane::NeighborCount => &self.grid.count,
        }
    }

    /// Value at interior cell `(x, y)`.
    pub fn get(&self, x: i32, y: i32) -> LifeResult<u8> {
        let idx = self.grid.interior_index(x, y)?;
        Ok(self.cells()[idx].load(Ordering::Relaxed))
    }

    /// Values of row `y`, left to right.
    pub fn row(&self, y: usize) -> LifeResult<impl Iterator<Item = u8> + 'a> {
        if y >= self.grid.height {
            let y = i32::try_from(y).unwrap_or(i32::MAX);
            return Err(self.grid.out_of_range(0, y));
        }
        let start = (y + 1) * self.grid.stride + 1;
        Ok(self.cells()[start..start + self.grid.width]
            .iter()
            .map(|cell| cell.load(Ordering::Relaxed)))
    }

    /// Row-major copy of the interior, `width * height` values.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.grid.width * self.grid.height);
        for y in 0..self.grid.height {
            let start = (y + 1) * self.grid.stride + 1;
            out.extend(
                self.cells()[start..start + self.grid.width]
                    .iter()
                    .map(|cell| cell.load(Ordering::Relaxed)),
            );
        }
        out
    }
}

impl core::fmt::Debug for PlaneView<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PlaneView")
            .field("plane", &self.plane)
            .field("width", &self.grid.width)
            .field("height", &self.grid.height)
            .finish()
    }
}

fn padded_len(width: usize, height: usize) -> LifeResult<usize> {
    let invalid = LifeError::InvalidDimensions { width, height };
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(invalid);
    }
    (width + 2).checked_mul(height + 2).ok_or(invalid)
}

fn zeroed_plane(len: usize) -> LifeResult<Vec<AtomicU8>> {
    let mut plane = Vec::new();
    plane
        .try_reserve_exact(len)
        .map_err(|source| LifeError::Allocation { cells: len, source })?;
    plane.extend((0..len).map(|_| AtomicU8::new(0)));
    Ok(plane)
}
