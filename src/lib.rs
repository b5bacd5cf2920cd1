// Clippy allows for the whole crate
#![allow(clippy::should_implement_trait)]

//! Query concurrency statistics.
//!
//! This library computes, for every query in a start-sorted log of
//! `(start, end)` execution intervals, how many other queries were running
//! at the instant it started, and summarizes those counts.
//!
//! # Features
//!
//! - **Windowed scan**: a monotonic lower bound keeps each query's scan
//!   to the intervals that can still be running
//! - **Cooperative cancellation**: an interrupted scan still reports the
//!   counts computed so far
//! - **Exact quantiles**: linear-interpolation percentiles and a dense
//!   histogram over every concurrency value
//!
//! # Example
//!
//! ```rust
//! use query_concurrency::engine::{ConcurrencyEngine, NoProgress};
//! use query_concurrency::records::parse_intervals;
//! use query_concurrency::stats::ConcurrencyStats;
//!
//! let intervals = parse_intervals("0|10\n1|5\n2|20\n").unwrap();
//! let scan = ConcurrencyEngine::new()
//!     .calculate_intervals(&intervals, &mut NoProgress)
//!     .unwrap();
//! assert_eq!(scan.counts, vec![0, 1, 2]);
//!
//! let stats = ConcurrencyStats::from_counts(&scan.counts).unwrap();
//! assert_eq!(stats.max, 2);
//! ```

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod interval;
pub mod overlap;
pub mod progress;
pub mod records;
pub mod report;
pub mod stats;
pub mod validation;
pub mod window;

// Re-export commonly used types
pub use engine::{CancellationToken, ConcurrencyEngine, ConcurrencyScan, ScanState};
pub use interval::Interval;
pub use records::{parse_record, read_records, RecordError};
pub use stats::{ConcurrencyStats, StatsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{ConcurrencyCommand, ConcurrencyRun};
    pub use crate::engine::{
        CancellationToken, ConcurrencyEngine, ConcurrencyScan, NoProgress, ProgressObserver,
        ScanState,
    };
    pub use crate::interval::Interval;
    pub use crate::records::{parse_intervals, read_records, LineSelection, StartPosition};
    pub use crate::report::{OutputFormat, ReportTemplates};
    pub use crate::stats::ConcurrencyStats;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_basic_workflow() {
        use crate::engine::{ConcurrencyEngine, NoProgress};
        use crate::records::parse_intervals;
        use crate::stats::ConcurrencyStats;

        let intervals = parse_intervals("0|10\n1|5\n2|20\n6|7\n").unwrap();
        let scan = ConcurrencyEngine::new()
            .calculate_intervals(&intervals, &mut NoProgress)
            .unwrap();

        // Query 3 starts while queries 0, 2 are running; query 1 has ended
        assert_eq!(scan.counts, vec![0, 1, 2, 2]);

        let stats = ConcurrencyStats::from_counts(&scan.counts).unwrap();
        assert_eq!(stats.max, 2);
        assert_eq!(stats.count_of_max, 2);
        assert_eq!(stats.histogram.total(), 4);
    }
}
