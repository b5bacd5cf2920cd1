//! Window lower-bound tracking for the concurrency scan.
//!
//! For the query at position `i` of a start-sorted sequence, the tracker
//! maintains a lower bound `L <= i` such that every interval before `L`
//! has already ended by the query's start. The overlap counter then only
//! scans `[L, i)` instead of the whole prefix.
//!
//! # Algorithm
//!
//! The bound advances in fixed-size blocks. The block `[L, L + block)`
//! is skipped once it lies wholly before `i` and the latest end inside it
//! is `<= start`. The latest end of the pending block is computed once and
//! cached until the block is skipped, so maintenance is O(1) amortized.
//!
//! Because starts are non-decreasing, an interval that ended by one
//! query's start has also ended by every later query's start, so the bound
//! never needs to move back. The bound is conservative rather than tight:
//! a single long-running query pins its block until it ends, which widens
//! the scan but never hides an overlap.

use crate::interval::{Interval, Timestamp};

/// Default block size for advancing the lower bound.
pub const DEFAULT_BLOCK_SIZE: usize = 100;

/// Monotonic lower bound into an ordered interval sequence.
#[derive(Debug)]
pub struct WindowTracker {
    /// Index of the first interval that may still overlap.
    lower_bound: usize,
    /// Jump size used when advancing the bound.
    block_size: usize,
    /// Latest end within `[lower_bound, lower_bound + block_size)`, once known.
    pending_block_end: Option<Timestamp>,
    /// Widest window handed out (for statistics).
    max_window: usize,
}

impl Default for WindowTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowTracker {
    /// Create a tracker with the default block size.
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Create a tracker with a custom block size (minimum 1).
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            lower_bound: 0,
            block_size: block_size.max(1),
            pending_block_end: None,
            max_window: 0,
        }
    }

    /// Advance the bound for the query at `position` and return it.
    ///
    /// `intervals` must contain at least the intervals `[0, position]` and
    /// must be non-decreasing by start. Positions must be visited in
    /// non-decreasing order.
    #[inline]
    pub fn advance(&mut self, intervals: &[Interval], position: usize) -> usize {
        let start = intervals[position].start;

        while self.lower_bound + self.block_size <= position {
            let block_end = match self.pending_block_end {
                Some(end) => end,
                None => {
                    let block = &intervals[self.lower_bound..self.lower_bound + self.block_size];
                    let end = latest_end(block);
                    self.pending_block_end = Some(end);
                    end
                }
            };

            if block_end > start {
                break;
            }
            self.lower_bound += self.block_size;
            self.pending_block_end = None;
        }

        let width = position - self.lower_bound;
        if width > self.max_window {
            self.max_window = width;
        }
        self.lower_bound
    }

    /// Current lower bound.
    #[inline]
    pub fn lower_bound(&self) -> usize {
        self.lower_bound
    }

    /// Block size used for jumps.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Widest window `[L, i)` observed so far.
    pub fn max_window(&self) -> usize {
        self.max_window
    }
}

#[inline]
fn latest_end(block: &[Interval]) -> Timestamp {
    block
        .iter()
        .map(|iv| iv.end)
        .fold(Timestamp::NEG_INFINITY, Timestamp::max)
}
