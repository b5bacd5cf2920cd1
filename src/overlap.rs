//! Overlap counting for a single query.

use crate::interval::Interval;

/// Count intervals in `window` that were running when `current` started.
///
/// `window` is the candidate range `[L, i)` produced by the window tracker;
/// the query itself is not part of it. Scanning stops at the first
/// candidate that starts after `current`, since with start-sorted input no
/// later candidate can have started earlier.
#[inline]
pub fn count_overlapping(window: &[Interval], current: &Interval) -> usize {
    count_overlapping_with_comparisons(window, current).0
}

/// Same as [`count_overlapping`], also returning how many candidates were
/// compared.
#[inline]
pub fn count_overlapping_with_comparisons(
    window: &[Interval],
    current: &Interval,
) -> (usize, usize) {
    let mut count = 0;
    let mut compared = 0;
    for candidate in window {
        compared += 1;
        if candidate.covers_start_of(current) {
            count += 1;
        }
        if candidate.start > current.start {
            break;
        }
    }
    (count, compared)
}

/// Quadratic reference count over the whole sequence.
///
/// Counts, for the interval at `position`, every other interval `Y` with
/// `Y.start < X.start < Y.end`, regardless of order. Used to cross-check
/// the windowed scan.
pub fn brute_force_count(intervals: &[Interval], position: usize) -> usize {
    let current = &intervals[position];
    intervals
        .iter()
        .enumerate()
        .filter(|&(j, other)| j != position && other.covers_start_of(current))
        .count()
}
