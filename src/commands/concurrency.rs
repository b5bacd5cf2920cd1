//! Query concurrency report.
//!
//! Reads a query log (`<start>|<end>` per line, sorted by start), computes
//! for every query how many other queries were running when it started,
//! and summarizes the counts.
//!
//! # Requirements
//!
//! Input MUST be sorted by start time. Unsorted input is rejected unless
//! `assume_sorted` is set, in which case counts are undefined.

use crate::engine::{
    CancellationToken, ConcurrencyEngine, ProgressObserver, ScanState, ScanStats,
};
use crate::error::{CommandError, Result};
use crate::progress::ProgressBarObserver;
use crate::records::{LineSelection, QueryLogReader, RawRecord};
use crate::report::{OutputFormat, Report, ReportTemplates};
use crate::stats::ConcurrencyStats;
use crate::window::DEFAULT_BLOCK_SIZE;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// Concurrency report configuration.
#[derive(Debug, Clone)]
pub struct ConcurrencyCommand {
    /// Window of lines to keep (all lines when `None`)
    pub selection: Option<LineSelection>,
    pub format: OutputFormat,
    pub templates: ReportTemplates,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
    /// Skip start-order validation
    pub assume_sorted: bool,
    /// Window tracker jump size
    pub block_size: usize,
    cancellation: CancellationToken,
}

impl Default for ConcurrencyCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl ConcurrencyCommand {
    pub fn new() -> Self {
        Self {
            selection: None,
            format: OutputFormat::Text,
            templates: ReportTemplates::default(),
            show_progress: false,
            assume_sorted: false,
            block_size: DEFAULT_BLOCK_SIZE,
            cancellation: CancellationToken::new(),
        }
    }

    /// Only process a window of lines.
    pub fn with_selection(mut self, selection: LineSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_templates(mut self, templates: ReportTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_assume_sorted(mut self, assume_sorted: bool) -> Self {
        self.assume_sorted = assume_sorted;
        self
    }

    /// Token that interrupts a running calculation.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Compute statistics for a query log file.
    ///
    /// Cancelling while the file is read fails with `RecordError::Interrupted`.
    pub fn calculate<P: AsRef<Path>>(&self, input_path: P) -> Result<ConcurrencyRun> {
        let records = QueryLogReader::from_path(input_path)?
            .with_cancellation(self.cancellation.clone())
            .read_records(self.selection.as_ref())?;
        self.calculate_records(&records)
    }

    /// Compute statistics for a query log read from stdin.
    pub fn calculate_stdin(&self) -> Result<ConcurrencyRun> {
        let stdin = io::stdin();
        let records = QueryLogReader::new(stdin.lock())
            .with_cancellation(self.cancellation.clone())
            .read_records(self.selection.as_ref())?;
        self.calculate_records(&records)
    }

    /// Compute statistics for raw records already read, drawing the
    /// progress bar if enabled.
    pub fn calculate_records(&self, records: &[RawRecord]) -> Result<ConcurrencyRun> {
        let mut progress = ProgressBarObserver::new(records.len(), self.show_progress);
        self.calculate_records_with(records, &mut progress)
    }

    /// Compute statistics for raw records, reporting to `progress`.
    ///
    /// Fails with `StatsError::EmptyInput` when there is nothing to count,
    /// and with `CommandError::Interrupted` when the scan was cancelled
    /// before the first count.
    pub fn calculate_records_with(
        &self,
        records: &[RawRecord],
        progress: &mut dyn ProgressObserver,
    ) -> Result<ConcurrencyRun> {
        let start = Instant::now();

        let engine = ConcurrencyEngine::new()
            .with_block_size(self.block_size)
            .with_order_check(!self.assume_sorted)
            .with_cancellation(self.cancellation.clone());

        let scan = engine.calculate(records, progress)?;
        if scan.is_cancelled() && scan.counts.is_empty() {
            return Err(CommandError::Interrupted {
                total: scan.stats.records_total,
            });
        }

        let stats = ConcurrencyStats::from_counts(&scan.counts)?;

        Ok(ConcurrencyRun {
            counts: scan.counts,
            state: scan.state,
            scan: scan.stats,
            stats,
            elapsed: start.elapsed(),
        })
    }

    /// Write the report for a finished run.
    pub fn write_report<W: Write>(&self, run: &ConcurrencyRun, output: &mut W) -> Result<()> {
        run.report().write(output, self.format, &self.templates)?;
        Ok(())
    }
}

/// Outcome of one concurrency calculation.
#[derive(Debug, Clone)]
pub struct ConcurrencyRun {
    /// Per-query concurrency, in input order
    pub counts: Vec<usize>,
    pub state: ScanState,
    pub scan: ScanStats,
    pub stats: ConcurrencyStats,
    /// Time spent scanning and aggregating
    pub elapsed: Duration,
}

impl ConcurrencyRun {
    pub fn is_cancelled(&self) -> bool {
        self.state == ScanState::Cancelled
    }

    pub fn report(&self) -> Report<'_> {
        Report::new(&self.stats, self.elapsed, self.is_cancelled())
    }
}
