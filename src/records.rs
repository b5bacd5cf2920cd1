//! Query log parsing.
//!
//! A query log is line oriented, one query per line as `<start>|<end>`,
//! both fields numeric timestamps. Lines are read as raw records first so
//! that a window of lines (beginning, end, or a random contiguous slice)
//! can be selected before anything is parsed.

use crate::engine::CancellationToken;
use crate::interval::{Interval, Timestamp};
use memchr::memchr;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Field delimiter between start and end timestamps.
pub const DELIMITER: u8 = b'|';

/// Errors that can occur while reading a query log.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed record at line {line} ('{record}'): {reason}")]
    Malformed {
        line: usize,
        record: String,
        reason: MalformedReason,
    },

    #[error("Input not sorted: start {start} at line {line} comes after {previous}")]
    Unsorted {
        line: usize,
        start: Timestamp,
        previous: Timestamp,
    },

    #[error("Interrupted: user cancelled while reading input after {lines_read} lines")]
    Interrupted { lines_read: usize },
}

pub type Result<T> = std::result::Result<T, RecordError>;

/// Why a single record could not be turned into an interval.
#[derive(Debug, Clone, PartialEq)]
pub enum MalformedReason {
    MissingDelimiter,
    ExtraFields(usize),
    InvalidTimestamp { field: &'static str, value: String },
    StartAfterEnd { start: Timestamp, end: Timestamp },
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDelimiter => write!(f, "missing '|' delimiter"),
            Self::ExtraFields(n) => write!(f, "expected 2 fields, got {}", n),
            Self::InvalidTimestamp { field, value } => {
                write!(f, "invalid {} timestamp '{}'", field, value)
            }
            Self::StartAfterEnd { start, end } => {
                write!(f, "start ({}) > end ({})", start, end)
            }
        }
    }
}

/// Parse one raw record into an interval.
///
/// Surrounding whitespace (including a trailing newline) is ignored on
/// both fields. Non-finite values are rejected.
pub fn parse_record(record: &str) -> std::result::Result<Interval, MalformedReason> {
    let bytes = record.as_bytes();
    let split = memchr(DELIMITER, bytes).ok_or(MalformedReason::MissingDelimiter)?;

    let start_field = &record[..split];
    let end_field = &record[split + 1..];

    if memchr(DELIMITER, end_field.as_bytes()).is_some() {
        let fields = bytes.iter().filter(|&&b| b == DELIMITER).count() + 1;
        return Err(MalformedReason::ExtraFields(fields));
    }

    let start = parse_timestamp(start_field, "start")?;
    let end = parse_timestamp(end_field, "end")?;

    if start > end {
        return Err(MalformedReason::StartAfterEnd { start, end });
    }

    Ok(Interval::new(start, end))
}

#[inline]
fn parse_timestamp(
    field: &str,
    name: &'static str,
) -> std::result::Result<Timestamp, MalformedReason> {
    let trimmed = field.trim();
    match trimmed.parse::<Timestamp>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(MalformedReason::InvalidTimestamp {
            field: name,
            value: trimmed.to_string(),
        }),
    }
}

/// A raw record together with its 1-based line number in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub line: usize,
    pub text: String,
}

impl RawRecord {
    /// Parse this record, attaching the line number to any failure.
    pub fn parse(&self) -> Result<Interval> {
        parse_record(&self.text).map_err(|reason| RecordError::Malformed {
            line: self.line,
            record: self.text.clone(),
            reason,
        })
    }
}

/// Which part of the log to keep when only `num_lines` lines are wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    Beginning,
    End,
    Random,
}

impl StartPosition {
    /// Parse a start position from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beginning" | "begin" | "start" => Some(Self::Beginning),
            "end" => Some(Self::End),
            "random" => Some(Self::Random),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginning => "beginning",
            Self::End => "end",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for StartPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A window of lines to take from the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSelection {
    pub num_lines: usize,
    pub position: StartPosition,
    /// Seed for `Random`; `None` seeds from system entropy.
    pub seed: Option<u64>,
}

impl LineSelection {
    pub fn new(num_lines: usize, position: StartPosition) -> Self {
        Self {
            num_lines,
            position,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Compute the half-open range of line indices to keep out of `total`.
    pub fn range(&self, total: usize) -> std::ops::Range<usize> {
        if self.num_lines >= total {
            return 0..total;
        }
        match self.position {
            StartPosition::Beginning => 0..self.num_lines,
            StartPosition::End => total - self.num_lines..total,
            StartPosition::Random => {
                let mut rng = match self.seed {
                    Some(seed) => SmallRng::seed_from_u64(seed),
                    None => SmallRng::from_entropy(),
                };
                let offset = rng.gen_range(0..=total - self.num_lines);
                offset..offset + self.num_lines
            }
        }
    }
}

/// A query log reader producing raw records.
pub struct QueryLogReader<R: Read> {
    reader: BufReader<R>,
    cancellation: Option<CancellationToken>,
}

impl QueryLogReader<File> {
    /// Open a query log from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> QueryLogReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(64 * 1024, reader),
            cancellation: None,
        }
    }

    /// Stop reading with [`RecordError::Interrupted`] once `token` is set.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Read every line, keep the selected window, and drop blank lines.
    ///
    /// Line numbers are counted from the start of the input, starting at 1.
    /// The cancellation token is checked before each line is stored.
    pub fn read_records(self, selection: Option<&LineSelection>) -> Result<Vec<RawRecord>> {
        let Self {
            reader,
            cancellation,
        } = self;

        let mut lines: Vec<String> = Vec::new();
        for line in reader.lines() {
            if cancellation
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
            {
                return Err(RecordError::Interrupted {
                    lines_read: lines.len(),
                });
            }
            lines.push(line?);
        }

        let range = match selection {
            Some(sel) => sel.range(lines.len()),
            None => 0..lines.len(),
        };

        Ok(lines
            .into_iter()
            .enumerate()
            .skip(range.start)
            .take(range.len())
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(idx, text)| RawRecord {
                line: idx + 1,
                text,
            })
            .collect())
    }
}

/// Read raw records from a query log file.
pub fn read_records<P: AsRef<Path>>(
    path: P,
    selection: Option<&LineSelection>,
) -> Result<Vec<RawRecord>> {
    QueryLogReader::from_path(path)?.read_records(selection)
}

/// Parse intervals from a string (useful for testing).
pub fn parse_intervals(content: &str) -> Result<Vec<Interval>> {
    QueryLogReader::new(content.as_bytes())
        .read_records(None)?
        .iter()
        .map(RawRecord::parse)
        .collect()
}
