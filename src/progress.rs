//! Terminal progress bar for concurrency scans.

use crate::engine::{ProgressObserver, ScanState};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const BAR_TEMPLATE: &str = "Progress: [{bar:50}] {percent}% {pos}/{len} ({elapsed_precise})";

/// Progress observer drawing an `indicatif` bar on stderr.
pub struct ProgressBarObserver {
    bar: ProgressBar,
    finished: bool,
}

impl ProgressBarObserver {
    /// Create a bar for `total` records; hidden unless `visible`.
    pub fn new(total: usize, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(Some(total as u64), target);
        if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self {
            bar,
            finished: false,
        }
    }

    /// Records reported so far.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_state(&mut self, state: ScanState, processed: usize, total: usize) {
        match state {
            ScanState::Completed => {
                self.bar.set_position(processed as u64);
                self.bar.finish();
                self.finished = true;
            }
            ScanState::Cancelled => {
                self.bar.set_position(processed as u64);
                self.bar.abandon();
                self.finished = true;
            }
            ScanState::Idle => self.bar.set_length(total as u64),
            ScanState::Scanning => {}
        }
    }

    fn on_progress(&mut self, processed: usize, _total: usize) {
        self.bar.set_position(processed as u64);
    }
}

impl Drop for ProgressBarObserver {
    fn drop(&mut self) {
        // Scan aborted by an error
        if !self.finished {
            self.bar.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ConcurrencyEngine;
    use crate::interval::Interval;

    #[test]
    fn test_hidden_bar_tracks_position() {
        let intervals: Vec<Interval> = (0..250)
            .map(|i| Interval::new(i as f64, i as f64 + 2.0))
            .collect();

        let mut observer = ProgressBarObserver::new(intervals.len(), false);
        ConcurrencyEngine::new()
            .calculate_intervals(&intervals, &mut observer)
            .unwrap();
        assert_eq!(observer.position(), 250);
        assert!(observer.finished);
    }

    #[test]
    fn test_cancelled_bar_keeps_partial_position() {
        let mut observer = ProgressBarObserver::new(0, false);
        observer.on_state(ScanState::Idle, 0, 10);
        assert_eq!(observer.bar.length(), Some(10));
        observer.on_progress(3, 10);
        observer.on_state(ScanState::Cancelled, 3, 10);
        assert_eq!(observer.position(), 3);
        assert!(observer.finished);
    }
}
