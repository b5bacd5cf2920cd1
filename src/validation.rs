//! Start-order validation.
//!
//! The concurrency engine relies on the input being sorted by start time
//! and never sorts on its own. The validator here runs inside the scan
//! loop so that unsorted logs fail loudly instead of producing wrong counts.

use crate::interval::{Interval, Timestamp};
use crate::records::RecordError;

/// Verify that intervals are non-decreasing by start.
///
/// Returns Ok(()) if sorted, Err naming the first out-of-order position
/// (1-based) otherwise.
pub fn verify_sorted(intervals: &[Interval]) -> Result<(), RecordError> {
    let mut validator = StartOrderValidator::new();
    for (idx, interval) in intervals.iter().enumerate() {
        validator.validate(interval.start, idx + 1)?;
    }
    Ok(())
}

/// Inline start-order validator for use within scanning loops.
#[derive(Debug, Default)]
pub struct StartOrderValidator {
    prev_start: Option<Timestamp>,
}

impl StartOrderValidator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate that a record starting at `start` keeps the order.
    #[inline]
    pub fn validate(&mut self, start: Timestamp, line: usize) -> Result<(), RecordError> {
        if let Some(previous) = self.prev_start {
            if start < previous {
                return Err(RecordError::Unsorted {
                    line,
                    start,
                    previous,
                });
            }
        }

        self.prev_start = Some(start);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_ok() {
        let intervals = [
            Interval::new(1.0, 5.0),
            Interval::new(1.0, 2.0), // Equal starts are fine
            Interval::new(3.0, 4.0),
        ];
        assert!(verify_sorted(&intervals).is_ok());
        assert!(verify_sorted(&[]).is_ok());
    }

    #[test]
    fn test_unsorted_reports_position() {
        let intervals = [
            Interval::new(1.0, 5.0),
            Interval::new(3.0, 4.0),
            Interval::new(2.0, 9.0),
        ];
        match verify_sorted(&intervals) {
            Err(RecordError::Unsorted {
                line,
                start,
                previous,
            }) => {
                assert_eq!(line, 3);
                assert_eq!(start, 2.0);
                assert_eq!(previous, 3.0);
            }
            other => panic!("expected unsorted error, got {:?}", other),
        }
    }

    #[test]
    fn test_validator_tracks_previous_start() {
        let mut v = StartOrderValidator::new();
        v.validate(10.0, 1).unwrap();
        v.validate(10.0, 2).unwrap();
        assert!(matches!(
            v.validate(5.0, 3),
            Err(RecordError::Unsorted { line: 3, .. })
        ));
    }
}
