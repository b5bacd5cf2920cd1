//! Core interval type for query execution spans.

use std::fmt;

/// Timestamps are fractional seconds (typically epoch floats).
pub type Timestamp = f64;

/// The execution span of one query.
///
/// Intervals are immutable once parsed. Well-formed intervals satisfy
/// `start <= end`; the parser rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Interval {
    /// Create a new interval.
    #[inline]
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Check if this interval was running at the instant `other` started.
    ///
    /// Both bounds are strict: a query that starts at the same instant, or
    /// that ends exactly when `other` starts, is not counted.
    #[inline]
    pub fn covers_start_of(&self, other: &Interval) -> bool {
        self.start < other.start && self.end > other.start
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers_start_of() {
        let long = Interval::new(0.0, 10.0);
        let inner = Interval::new(1.0, 5.0);
        let same_start = Interval::new(0.0, 3.0);
        let after = Interval::new(10.0, 12.0);

        assert!(long.covers_start_of(&inner));
        assert!(!inner.covers_start_of(&long));
        assert!(!long.covers_start_of(&same_start)); // Same start, not counted
        assert!(!long.covers_start_of(&after)); // Ends at the start instant
        assert!(!long.covers_start_of(&long)); // Never covers itself
    }

    #[test]
    fn test_display() {
        assert_eq!(Interval::new(1.5, 2.0).to_string(), "1.5|2");
    }
}
