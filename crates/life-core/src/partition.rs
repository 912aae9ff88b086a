//! Horizontal band partitioning.

use std::ops::Range;

use crate::error::{LifeError, LifeResult};

/// Rows at each end of a band whose flips reach into the neighboring band.
pub const SEAM_ROWS: usize = 2;

/// A contiguous slice of rows `[start, end)` owned by one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Band {
    /// Position of this band, top to bottom.
    pub index: usize,
    /// First row.
    pub start: usize,
    /// One past the last row.
    pub end: usize,
}

impl Band {
    #[must_use]
    pub const fn new(index: usize, start: usize, end: usize) -> Self {
        Self { index, start, end }
    }

    /// Number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub const fn rows(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Rows whose flips reach the band above: the first `SEAM_ROWS` rows.
    #[must_use]
    pub fn top_rows(&self) -> Range<usize> {
        self.start..(self.start + SEAM_ROWS).min(self.end)
    }

    /// Rows whose flips reach the band below: the last `SEAM_ROWS` rows.
    ///
    /// Overlaps [`Band::top_rows`] when the band is shorter than
    /// `2 * SEAM_ROWS`.
    #[must_use]
    pub fn bottom_rows(&self) -> Range<usize> {
        self.end.saturating_sub(SEAM_ROWS).max(self.start)..self.end
    }

    /// Rows reaching neither neighbor.
    #[must_use]
    pub fn interior_rows(&self) -> Range<usize> {
        let top_end = self.top_rows().end;
        top_end..self.bottom_rows().start.max(top_end)
    }

    /// Top rows that are not also bottom rows. Need only the upper gate.
    #[must_use]
    pub fn top_only_rows(&self) -> Range<usize> {
        let top = self.top_rows();
        top.start..top.end.min(self.bottom_rows().start)
    }

    /// Rows that are both top and bottom rows. Need both gates.
    #[must_use]
    pub fn shared_rows(&self) -> Range<usize> {
        let (top, bottom) = (self.top_rows(), self.bottom_rows());
        bottom.start.min(top.end)..top.end
    }

    /// Bottom rows that are not also top rows. Need only the lower gate.
    #[must_use]
    pub fn bottom_only_rows(&self) -> Range<usize> {
        let bottom = self.bottom_rows();
        bottom.start.max(self.top_rows().end)..bottom.end
    }
}

/// Split `height` rows into `workers` bands.
///
/// Band `i` spans `[height * i / workers, height * (i + 1) / workers)`. The
/// cumulative boundaries make the heights sum to `height` exactly and differ
/// by at most one row. With fewer rows than workers some bands are empty.
pub fn compute_bands(height: usize, workers: usize) -> LifeResult<Vec<Band>> {
    if workers == 0 {
        return Err(LifeError::NoWorkers);
    }
    let boundary = |i: usize| (height as u128 * i as u128 / workers as u128) as usize;

    Ok((0..workers)
        .map(|i| Band::new(i, boundary(i), boundary(i + 1)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(height: usize, workers: usize) {
        let bands = compute_bands(height, workers).unwrap();
        assert_eq!(bands.len(), workers);

        let mut next = 0;
        for (i, band) in bands.iter().enumerate() {
            assert_eq!(band.index, i);
            assert_eq!(band.start, next, "gap before band {i} (h={height}, w={workers})");
            assert!(band.start <= band.end);
            next = band.end;
        }
        assert_eq!(next, height);

        let min = bands.iter().map(Band::len).min().unwrap();
        let max = bands.iter().map(Band::len).max().unwrap();
        assert!(max - min <= 1, "uneven bands for h={height}, w={workers}");
        if height >= workers {
            assert!(min > 0, "empty band for h={height}, w={workers}");
        }
    }

    #[test]
    fn bands_cover_rows_exactly() {
        for height in 0..64 {
            for workers in 1..12 {
                assert_partition(height, workers);
            }
        }
        assert_partition(1080, 7);
        assert_partition(1_000_003, 16);
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(compute_bands(10, 0), Err(LifeError::NoWorkers)));
    }

    #[test]
    fn uneven_heights_use_cumulative_boundaries() {
        let bands = compute_bands(10, 4).unwrap();
        let spans: Vec<_> = bands.iter().map(|b| (b.start, b.end)).collect();
        assert_eq!(spans, vec![(0, 2), (2, 5), (5, 7), (7, 10)]);
    }

    #[test]
    fn row_groups_split_each_band_once() {
        for len in 0..9 {
            let band = Band::new(1, 10, 10 + len);
            let rows: Vec<usize> = band
                .top_only_rows()
                .chain(band.shared_rows())
                .chain(band.interior_rows())
                .chain(band.bottom_only_rows())
                .collect();
            assert_eq!(rows, band.rows().collect::<Vec<_>>(), "len {len}");
        }
    }

    #[test]
    fn seam_rows_are_two_deep() {
        let band = Band::new(0, 4, 12);
        assert_eq!(band.top_rows(), 4..6);
        assert_eq!(band.interior_rows(), 6..10);
        assert_eq!(band.bottom_rows(), 10..12);
        assert!(band.shared_rows().is_empty());
    }

    #[test]
    fn short_bands_keep_full_seam_coverage() {
        // Every row that can write into a neighbor's rows stays under that
        // neighbor's gate, so short bands share rows between both gates.
        let three = Band::new(1, 4, 7);
        assert_eq!(three.top_rows(), 4..6);
        assert_eq!(three.bottom_rows(), 5..7);
        assert_eq!(three.top_only_rows(), 4..5);
        assert_eq!(three.shared_rows(), 5..6);
        assert_eq!(three.bottom_only_rows(), 6..7);
        assert!(three.interior_rows().is_empty());

        let two = Band::new(1, 4, 6);
        assert_eq!(two.shared_rows(), 4..6);
        assert!(two.top_only_rows().is_empty());
        assert!(two.bottom_only_rows().is_empty());

        let one = Band::new(1, 4, 5);
        assert_eq!(one.shared_rows(), 4..5);

        let empty = Band::new(1, 4, 4);
        assert!(empty.top_rows().is_empty());
        assert!(empty.bottom_rows().is_empty());
        assert!(empty.shared_rows().is_empty());
    }
}
