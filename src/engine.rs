//! Concurrency engine.
//!
//! Drives the window tracker and the overlap counter over a start-sorted
//! query sequence, producing one concurrency count per query in input
//! order.
//!
//! # Requirements
//!
//! Input MUST be sorted by start time. The engine never sorts; with the
//! order check enabled (the default) an out-of-order record aborts the scan.
//!
//! # Cancellation
//!
//! Cancellation is cooperative and checked once per record, before the
//! record is parsed. A cancelled scan keeps every count computed so far
//! and never holds a partially counted record.

use crate::interval::Interval;
use crate::overlap::count_overlapping_with_comparisons;
use crate::records::{RawRecord, RecordError};
use crate::validation::StartOrderValidator;
use crate::window::{WindowTracker, DEFAULT_BLOCK_SIZE};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Cancelled,
    Completed,
}

impl ScanState {
    /// `Cancelled` and `Completed` end a scan.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Result of a cancellation check at a record boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

/// Shared flag used to request that a running scan stop.
///
/// Cloning shares the flag, so a clone can be moved into a signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Check whether the scan should go on.
    #[inline]
    pub fn check(&self) -> Control {
        if self.is_cancelled() {
            Control::Stop
        } else {
            Control::Continue
        }
    }
}

/// Receives progress notifications from a scan.
///
/// Notifications are purely observational.
pub trait ProgressObserver {
    /// Called when the scan enters a new state.
    fn on_state(&mut self, _state: ScanState, _processed: usize, _total: usize) {}

    /// Called every [`update_interval`] records.
    fn on_progress(&mut self, processed: usize, total: usize);
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _processed: usize, _total: usize) {}
}

/// Progress cadence for an input of `total` records.
pub fn update_interval(total: usize) -> usize {
    if total >= 10_000 {
        100
    } else if total >= 200 {
        10
    } else {
        1
    }
}

/// Concurrency engine configuration.
#[derive(Debug, Clone)]
pub struct ConcurrencyEngine {
    /// Jump size for the window lower bound
    pub block_size: usize,
    /// Reject records whose start is earlier than the previous one
    pub check_order: bool,
    cancellation: CancellationToken,
}

impl Default for ConcurrencyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConcurrencyEngine {
    pub fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            check_order: true,
            cancellation: CancellationToken::new(),
        }
    }

    /// Set the window block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Enable or disable the start-order check.
    pub fn with_order_check(mut self, check: bool) -> Self {
        self.check_order = check;
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Token that cancels scans run by this engine.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Parse and scan raw records.
    ///
    /// A malformed record aborts the scan with [`RecordError::Malformed`].
    pub fn calculate(
        &self,
        records: &[RawRecord],
        progress: &mut dyn ProgressObserver,
    ) -> Result<ConcurrencyScan, RecordError> {
        let items = records
            .iter()
            .map(|rec| rec.parse().map(|interval| (rec.line, interval)));
        self.scan(items, records.len(), progress)
    }

    /// Scan already parsed intervals.
    pub fn calculate_intervals(
        &self,
        intervals: &[Interval],
        progress: &mut dyn ProgressObserver,
    ) -> Result<ConcurrencyScan, RecordError> {
        let items = intervals
            .iter()
            .enumerate()
            .map(|(idx, interval)| Ok((idx + 1, *interval)));
        self.scan(items, intervals.len(), progress)
    }

    /// Core scan loop.
    ///
    /// All scan state (parsed prefix, window bound, counts) lives in this
    /// call frame.
    fn scan<I>(
        &self,
        items: I,
        total: usize,
        progress: &mut dyn ProgressObserver,
    ) -> Result<ConcurrencyScan, RecordError>
    where
        I: Iterator<Item = Result<(usize, Interval), RecordError>>,
    {
        let step = update_interval(total);
        let mut parsed: Vec<Interval> = Vec::with_capacity(total);
        let mut counts: Vec<usize> = Vec::with_capacity(total);
        let mut tracker = WindowTracker::with_block_size(self.block_size);
        let mut validator = StartOrderValidator::new();
        let mut comparisons: u64 = 0;

        progress.on_state(ScanState::Idle, 0, total);
        let mut state = ScanState::Scanning;
        progress.on_state(state, 0, total);

        for item in items {
            if self.cancellation.check() == Control::Stop {
                state = ScanState::Cancelled;
                break;
            }

            let (line, interval) = item?;
            if self.check_order {
                validator.validate(interval.start, line)?;
            }

            parsed.push(interval);
            let position = parsed.len() - 1;
            let lower = tracker.advance(&parsed, position);
            let (count, compared) =
                count_overlapping_with_comparisons(&parsed[lower..position], &interval);

            counts.push(count);
            comparisons += compared as u64;

            let processed = counts.len();
            if processed % step == 0 {
                progress.on_progress(processed, total);
            }
        }

        if !state.is_terminal() {
            state = ScanState::Completed;
        }
        progress.on_state(state, counts.len(), total);

        let stats = ScanStats {
            records_total: total,
            records_scanned: counts.len(),
            comparisons,
            max_window: tracker.max_window(),
            final_lower_bound: tracker.lower_bound(),
            state,
        };

        Ok(ConcurrencyScan {
            counts,
            state,
            stats,
        })
    }
}

/// Output of one scan.
#[derive(Debug, Clone)]
pub struct ConcurrencyScan {
    /// One count per scanned record, in input order
    pub counts: Vec<usize>,
    /// Terminal state: `Completed` or `Cancelled`
    pub state: ScanState,
    pub stats: ScanStats,
}

impl ConcurrencyScan {
    pub fn is_cancelled(&self) -> bool {
        self.state == ScanState::Cancelled
    }
}

/// Statistics from a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanStats {
    /// Records handed to the engine
    pub records_total: usize,
    /// Records with a computed count
    pub records_scanned: usize,
    /// Candidate intervals compared across all queries
    pub comparisons: u64,
    /// Widest candidate window
    pub max_window: usize,
    /// Window lower bound when the scan ended
    pub final_lower_bound: usize,
    pub state: ScanState,
}

impl ScanStats {
    /// Average number of candidates compared per query.
    pub fn comparisons_per_record(&self) -> f64 {
        if self.records_scanned == 0 {
            0.0
        } else {
            self.comparisons as f64 / self.records_scanned as f64
        }
    }
}

impl fmt::Display for ScanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scanned: {}/{}, Comparisons: {} ({:.2}/record), Max window: {}, Lower bound: {}, State: {}",
            self.records_scanned,
            self.records_total,
            self.comparisons,
            self.comparisons_per_record(),
            self.max_window,
            self.final_lower_bound,
            self.state
        )
    }
}
