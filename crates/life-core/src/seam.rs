//! Seam gates and the per-band worker protocol.
//!
//! A flip at row `y` writes counts at rows `y - 1 ..= y + 1`, so the last two
//! rows of one band and the first two rows of the next write the same two
//! count rows. One gate per adjacent band pair serializes those row groups:
//!
//! ```text
//! band i-1   ...interior...      no lock
//!            bottom rows (2)  ┐
//! ───────── seam ─────────────┤  gate i-1
//! band i     top rows (2)     ┘
//!            ...interior...      no lock
//!            bottom rows (2)  ┐
//! ───────── seam ─────────────┤  gate i
//! band i+1   top rows (2)     ┘
//! ```
//!
//! Bands shorter than `2 * SEAM_ROWS` have rows that reach both neighbors.
//! Those rows run with both gates held. Gates are always taken in ascending
//! seam order (upper before lower), so no wait cycle can form.

use std::ops::Range;

use parking_lot::Mutex;
use tracing::trace;

use crate::grid::{Grid, Snapshot};
use crate::partition::Band;

/// One mutual-exclusion gate per pair of vertically adjacent bands.
#[derive(Debug, Default)]
pub struct SeamGates {
    gates: Vec<Mutex<()>>,
}

impl SeamGates {
    /// Gates for `bands` bands, i.e. `bands - 1` seams.
    #[must_use]
    pub fn new(bands: usize) -> Self {
        Self {
            gates: (0..bands.saturating_sub(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Number of seams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Gate shared with the band above, `None` for the first band.
    #[must_use]
    pub fn above(&self, band: &Band) -> Option<&Mutex<()>> {
        band.index.checked_sub(1).and_then(|i| self.gates.get(i))
    }

    /// Gate shared with the band below, `None` for the last band.
    #[must_use]
    pub fn below(&self, band: &Band) -> Option<&Mutex<()>> {
        self.gates.get(band.index)
    }
}

/// Progress of a [`BandWorker`] through one generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum WorkerState {
    Idle,
    LockPrev,
    ProcessTopRows,
    UnlockPrev,
    ProcessInterior,
    LockNext,
    ProcessBottomRows,
    UnlockNext,
    Done,
}

/// Applies one generation of the rule to a single band.
pub(crate) struct BandWorker<'a> {
    grid: &'a Grid,
    snapshot: &'a Snapshot,
    band: Band,
    prev: Option<&'a Mutex<()>>,
    next: Option<&'a Mutex<()>>,
    state: WorkerState,
    flips: usize,
}

impl<'a> BandWorker<'a> {
    pub(crate) fn new(
        grid: &'a Grid,
        snapshot: &'a Snapshot,
        band: Band,
        gates: &'a SeamGates,
    ) -> Self {
        Self {
            grid,
            snapshot,
            band,
            prev: gates.above(&band),
            next: gates.below(&band),
            state: WorkerState::Idle,
            flips: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Cells flipped so far.
    #[must_use]
    pub fn flips(&self) -> usize {
        self.flips
    }

    fn enter(&mut self, state: WorkerState) {
        trace!(band = self.band.index, ?state, "worker state");
        self.state = state;
    }

    /// Run the whole band: gated top rows, free interior, gated bottom rows.
    pub fn run(&mut self) {
        #[cfg(test)]
        if fault::should_fail(self.grid, self.band.index) {
            panic!("injected failure in band {}", self.band.index);
        }

        let band = self.band;

        self.enter(WorkerState::LockPrev);
        let prev = lock_if_rows(self.prev, &band.top_rows());
        self.enter(WorkerState::ProcessTopRows);
        self.process(band.top_only_rows());

        // Short band: the remaining top rows also reach the band below.
        let shared = band.shared_rows();
        let mut next = None;
        if !shared.is_empty() {
            self.enter(WorkerState::LockNext);
            next = lock_if_rows(self.next, &shared);
            self.enter(WorkerState::ProcessBottomRows);
            self.process(shared);
        }
        drop(prev);
        self.enter(WorkerState::UnlockPrev);

        self.enter(WorkerState::ProcessInterior);
        self.process(band.interior_rows());

        let bottom = band.bottom_only_rows();
        if next.is_none() {
            self.enter(WorkerState::LockNext);
            next = lock_if_rows(self.next, &bottom);
        }
        self.enter(WorkerState::ProcessBottomRows);
        self.process(bottom);
        drop(next);
        self.enter(WorkerState::UnlockNext);

        self.enter(WorkerState::Done);
    }

    fn process(&mut self, rows: Range<usize>) {
        for y in rows {
            self.flips += evaluate_row(self.grid, self.snapshot, y);
        }
    }
}

/// Take `gate` unless there is no gate or nothing to do under it.
fn lock_if_rows<'g>(
    gate: Option<&'g Mutex<()>>,
    rows: &Range<usize>,
) -> Option<parking_lot::MutexGuard<'g, ()>> {
    if rows.is_empty() {
        return None;
    }
    gate.map(|g| g.lock())
}

/// Apply the rule to every cell of row `y`, reading the snapshot and writing
/// flips to the live grid. Returns the number of cells flipped.
fn evaluate_row(grid: &Grid, snapshot: &Snapshot, y: usize) -> usize {
    let stride = snapshot.stride();
    let start = (y + 1) * stride + 1;
    let mut flips = 0;

    for idx in start..start + grid.width() {
        let n = snapshot.count_at(idx);
        let flip = if snapshot.alive_at(idx) {
            n != 2 && n != 3
        } else {
            n == 3
        };
        if flip {
            let on = !snapshot.alive_at(idx);
            let flipped = grid.flip_at(idx, on);
            debug_assert!(flipped, "cell {idx} flipped twice in one generation");
            flips += 1;
        }
    }
    flips
}

/// Test-only failure injection, keyed by grid address so parallel tests
/// cannot trip each other.
#[cfg(test)]
pub(crate) mod fault {
    use parking_lot::Mutex;

    use crate::grid::Grid;

    static FAILING: Mutex<Vec<(usize, usize)>> = parking_lot::const_mutex(Vec::new());

    fn key(grid: &Grid) -> usize {
        std::ptr::from_ref(grid) as usize
    }

    /// Make the worker for `band` panic on `grid` until [`heal`] is called.
    pub(crate) fn fail_band(grid: &Grid, band: usize) {
        FAILING.lock().push((key(grid), band));
    }

    pub(crate) fn heal(grid: &Grid) {
        let key = key(grid);
        FAILING.lock().retain(|&(g, _)| g != key);
    }

    pub(super) fn should_fail(grid: &Grid, band: usize) -> bool {
        FAILING.lock().contains(&(key(grid), band))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::compute_bands;

    fn snapshot_of(grid: &Grid) -> Snapshot {
        let mut snapshot = Snapshot::default();
        grid.snapshot_into(&mut snapshot);
        snapshot
    }

    #[test]
    fn one_gate_per_seam() {
        let bands = compute_bands(12, 4).unwrap();
        let gates = SeamGates::new(bands.len());
        assert_eq!(gates.len(), 3);

        assert!(gates.above(&bands[0]).is_none());
        assert!(gates.below(&bands[3]).is_none());

        // Band i's lower gate is band i+1's upper gate.
        for pair in bands.windows(2) {
            let lower = gates.below(&pair[0]).unwrap();
            let upper = gates.above(&pair[1]).unwrap();
            assert!(std::ptr::eq(lower, upper));
        }

        assert!(SeamGates::new(1).is_empty());
        assert!(SeamGates::new(0).is_empty());
    }

    #[test]
    fn worker_walks_the_protocol_to_done() {
        let mut grid = Grid::new(6, 8).unwrap();
        for x in 1..4 {
            grid.set_alive(x, 3).unwrap();
        }
        let snapshot = snapshot_of(&grid);
        let bands = compute_bands(8, 2).unwrap();
        let gates = SeamGates::new(bands.len());

        let mut worker = BandWorker::new(&grid, &snapshot, bands[0], &gates);
        assert_eq!(worker.state(), WorkerState::Idle);
        worker.run();
        assert_eq!(worker.state(), WorkerState::Done);
        // Row 3 is band 0's bottom seam row: two ends die, (2, 2) is born.
        assert_eq!(worker.flips(), 3);
        assert!(grid.is_alive(2, 2).unwrap());
        assert!(!grid.is_alive(1, 3).unwrap());

        let mut worker = BandWorker::new(&grid, &snapshot, bands[1], &gates);
        worker.run();
        assert_eq!(worker.flips(), 1);
        assert!(grid.is_alive(2, 4).unwrap());
    }

    #[test]
    fn gates_are_released_after_run() {
        let grid = Grid::new(4, 9).unwrap();
        let snapshot = snapshot_of(&grid);
        let bands = compute_bands(9, 3).unwrap();
        let gates = SeamGates::new(bands.len());

        for band in &bands {
            BandWorker::new(&grid, &snapshot, *band, &gates).run();
        }
        for band in &bands[1..] {
            assert!(gates.above(band).unwrap().try_lock().is_some());
        }
    }

    #[test]
    fn evaluate_row_reads_only_the_snapshot() {
        // A vertical blinker: evaluating row 2 alone must use generation-N
        // counts even after row 1 has already been flipped.
        let mut grid = Grid::new(5, 5).unwrap();
        for y in 1..4 {
            grid.set_alive(2, y).unwrap();
        }
        let snapshot = snapshot_of(&grid);

        assert_eq!(evaluate_row(&grid, &snapshot, 1), 1);
        assert_eq!(evaluate_row(&grid, &snapshot, 2), 2);
        assert_eq!(evaluate_row(&grid, &snapshot, 3), 1);

        let row: Vec<bool> = (0..5).map(|x| grid.is_alive(x, 2).unwrap()).collect();
        assert_eq!(row, vec![false, true, true, true, false]);
        assert_eq!(grid.population(), 3);
    }

    /// Runs band 1 of a 6x6 grid split into 2-row bands while the test
    /// thread holds its lower (or upper) gate. Returns the watched count
    /// before the run, while the gate is held, and after release.
    fn run_while_holding(lower: bool, watch: (i32, i32)) -> (u8, u8, u8) {
        // Blinker on row 3: band 1 (rows 2..4) flips cells in rows 2 and 3,
        // writing counts into rows 1 and 4 of the neighboring bands.
        let mut grid = Grid::new(6, 6).unwrap();
        for x in 1..4 {
            grid.set_alive(x, 3).unwrap();
        }
        let snapshot = snapshot_of(&grid);
        let bands = compute_bands(6, 3).unwrap();
        let gates = SeamGates::new(bands.len());
        let before = grid.neighbor_count(watch.0, watch.1).unwrap();

        let (while_held, after) = std::thread::scope(|scope| {
            let gate = if lower {
                gates.below(&bands[1])
            } else {
                gates.above(&bands[1])
            };
            let guard = gate.unwrap().lock();
            let worker = scope.spawn(|| BandWorker::new(&grid, &snapshot, bands[1], &gates).run());
            std::thread::sleep(std::time::Duration::from_millis(50));
            let while_held = grid.neighbor_count(watch.0, watch.1).unwrap();
            assert!(!worker.is_finished());
            drop(guard);
            worker.join().unwrap();
            (while_held, grid.neighbor_count(watch.0, watch.1).unwrap())
        });
        (before, while_held, after)
    }

    #[test]
    fn short_band_waits_for_the_lower_gate() {
        // (1, 3) and (3, 3) die, each taking one off the count at (2, 4).
        let (before, while_held, after) = run_while_holding(true, (2, 4));
        assert_eq!((before, while_held, after), (3, 3, 1));
    }

    #[test]
    fn short_band_waits_for_the_upper_gate() {
        // (2, 2) is born, adding one to the count at (2, 1).
        let (before, while_held, after) = run_while_holding(false, (2, 1));
        assert_eq!((before, while_held, after), (0, 0, 1));
    }

    #[test]
    fn three_row_band_processes_each_row_once() {
        let mut grid = Grid::new(5, 9).unwrap();
        for y in 3..6 {
            grid.set_alive(2, y).unwrap();
        }
        let snapshot = snapshot_of(&grid);
        let bands = compute_bands(9, 3).unwrap();
        let gates = SeamGates::new(bands.len());

        for band in &bands {
            BandWorker::new(&grid, &snapshot, *band, &gates).run();
        }
        // Vertical blinker filling the middle band turns horizontal.
        let alive: Vec<(i32, i32)> = (0..9)
            .flat_map(|y| (0..5).map(move |x| (x, y)))
            .filter(|&(x, y)| grid.is_alive(x, y).unwrap())
            .collect();
        assert_eq!(alive, vec![(1, 4), (2, 4), (3, 4)]);
        for gate in &gates.gates {
            assert!(gate.try_lock().is_some());
        }
    }
}
