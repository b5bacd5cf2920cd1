//! Aggregation of per-query concurrency counts.
//!
//! Quantiles use linear interpolation between closest ranks: for `n`
//! sorted values and percentile `p`, the virtual index is
//! `(n - 1) * p / 100` and the result interpolates between the values at
//! its floor and the next index. The interpolation is evaluated from the
//! nearer endpoint, which makes results identical to NumPy's default
//! `percentile` method.

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use thiserror::Error;

pub const Q1_PERCENTILE: f64 = 25.0;
pub const MEDIAN_PERCENTILE: f64 = 50.0;
pub const Q3_PERCENTILE: f64 = 75.0;
pub const P95_PERCENTILE: f64 = 95.0;
pub const P98_PERCENTILE: f64 = 98.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("no data: there are no concurrency counts to aggregate")]
    EmptyInput,
}

/// Dense histogram over `0..=max`; bucket `v` holds how many counts equal `v`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    buckets: Vec<usize>,
}

impl Histogram {
    /// Build from counts. Every value in `0..=max` gets a bucket.
    pub fn from_counts(counts: &[usize]) -> Self {
        let max = counts.iter().copied().max();
        let mut buckets = match max {
            Some(max) => vec![0; max + 1],
            None => Vec::new(),
        };
        for &c in counts {
            buckets[c] += 1;
        }
        Self { buckets }
    }

    /// Number of counts equal to `value`.
    pub fn get(&self, value: usize) -> usize {
        self.buckets.get(value).copied().unwrap_or(0)
    }

    /// Number of buckets (`max + 1`).
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Sum of all bucket counts.
    pub fn total(&self) -> usize {
        self.buckets.iter().sum()
    }

    /// `(value, occurrences)` pairs in increasing value order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.buckets.iter().copied().enumerate()
    }
}

impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.buckets.len()))?;
        for pair in self.iter() {
            seq.serialize_element(&pair)?;
        }
        seq.end()
    }
}

/// Summary of a completed (or cancelled) scan's count sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcurrencyStats {
    pub max: usize,
    #[serde(rename = "num_of_max")]
    pub count_of_max: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub p95: f64,
    pub p98: f64,
    #[serde(rename = "avg")]
    pub mean: f64,
    #[serde(rename = "count")]
    pub total_count: usize,
    #[serde(rename = "buckets")]
    pub histogram: Histogram,
}

impl ConcurrencyStats {
    /// Aggregate a count sequence.
    ///
    /// Fails with [`StatsError::EmptyInput`] if `counts` is empty.
    pub fn from_counts(counts: &[usize]) -> Result<Self, StatsError> {
        if counts.is_empty() {
            return Err(StatsError::EmptyInput);
        }

        let mut sorted = counts.to_vec();
        sorted.sort_unstable();

        let max = sorted[sorted.len() - 1];
        let histogram = Histogram::from_counts(counts);
        let sum: u64 = counts.iter().map(|&c| c as u64).sum();

        Ok(Self {
            max,
            count_of_max: histogram.get(max),
            q1: percentile_sorted(&sorted, Q1_PERCENTILE),
            median: percentile_sorted(&sorted, MEDIAN_PERCENTILE),
            q3: percentile_sorted(&sorted, Q3_PERCENTILE),
            p95: percentile_sorted(&sorted, P95_PERCENTILE),
            p98: percentile_sorted(&sorted, P98_PERCENTILE),
            mean: sum as f64 / counts.len() as f64,
            total_count: counts.len(),
            histogram,
        })
    }
}

/// Percentile `p` (0..=100) of ascending `sorted`, by linear interpolation.
///
/// `sorted` must be non-empty.
fn percentile_sorted(sorted: &[usize], p: f64) -> f64 {
    let last = sorted.len() - 1;
    let virtual_index = last as f64 * (p / 100.0);
    let lower = virtual_index.floor();
    let gamma = virtual_index - lower;

    let lo = (lower.max(0.0) as usize).min(last);
    let hi = (lo + 1).min(last);
    lerp(sorted[lo] as f64, sorted[hi] as f64, gamma)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}
