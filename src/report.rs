//! Report rendering for aggregated concurrency statistics.
//!
//! Two formats are supported: a templated human-readable text report and
//! a JSON object. Text templates use `{name}` placeholders; unknown
//! placeholders are left as they are.

use crate::stats::ConcurrencyStats;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

/// Output format of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    /// Parse output format from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Templates for the text report.
///
/// - `stats_string`: `{q1}` `{median}` `{q3}` `{p95}` `{p98}` `{max}`
///   `{num_of_max}` `{avg}` `{count}`
/// - `bucket_count_string`: `{0}` bucket value (two digits), `{1}` count
/// - `script_time_string`: `{time_diff}`
/// - `full_output_string`: `{stats}` `{buckets}` `{script_time}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportTemplates {
    pub stats_string: String,
    pub bucket_count_string: String,
    pub script_time_string: String,
    pub full_output_string: String,
}

impl Default for ReportTemplates {
    fn default() -> Self {
        Self {
            stats_string: concat!(
                "Q1 Conn       : {q1}\n",
                "Median Conn   : {median}\n",
                "Q3 Conn       : {q3}\n",
                "95th % Conn   : {p95}\n",
                "98th % Conn   : {p98}\n",
                "Max Conn      : {max}\n",
                "Num of MAX    : {num_of_max}\n",
                "Average Conn  : {avg}\n",
                "Query Count   : {count}"
            )
            .to_string(),
            bucket_count_string: "Count of ({0}) : {1}".to_string(),
            script_time_string: "Script Time: {time_diff}".to_string(),
            full_output_string: concat!(
                "---RESULT---\n",
                "{stats}",
                "\n\n",
                "---BUCKETS---\n",
                "{buckets}",
                "\n\n",
                "{script_time}"
            )
            .to_string(),
        }
    }
}

/// Everything the output layer needs about one run.
#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    #[serde(flatten)]
    pub stats: &'a ConcurrencyStats,
    #[serde(rename = "time_diff", serialize_with = "serialize_elapsed")]
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl<'a> Report<'a> {
    pub fn new(stats: &'a ConcurrencyStats, elapsed: Duration, cancelled: bool) -> Self {
        Self {
            stats,
            elapsed,
            cancelled,
        }
    }

    /// Render the text report.
    pub fn render_text(&self, templates: &ReportTemplates) -> String {
        let s = self.stats;
        let stats = fill(
            &templates.stats_string,
            &[
                ("q1", s.q1.to_string()),
                ("median", s.median.to_string()),
                ("q3", s.q3.to_string()),
                ("p95", s.p95.to_string()),
                ("p98", s.p98.to_string()),
                ("max", s.max.to_string()),
                ("num_of_max", s.count_of_max.to_string()),
                ("avg", s.mean.to_string()),
                ("count", s.total_count.to_string()),
            ],
        );

        let mut count_buf = itoa::Buffer::new();
        let buckets = s
            .histogram
            .iter()
            .map(|(value, count)| {
                fill(
                    &templates.bucket_count_string,
                    &[
                        ("0", format!("{:02}", value)),
                        ("1", count_buf.format(count).to_string()),
                    ],
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let script_time = fill(
            &templates.script_time_string,
            &[("time_diff", format_elapsed(self.elapsed))],
        );

        fill(
            &templates.full_output_string,
            &[
                ("stats", stats),
                ("buckets", buckets),
                ("script_time", script_time),
            ],
        )
    }

    /// Write the report in the requested format, followed by a newline.
    pub fn write<W: Write>(
        &self,
        writer: &mut W,
        format: OutputFormat,
        templates: &ReportTemplates,
    ) -> io::Result<()> {
        match format {
            OutputFormat::Text => writeln!(writer, "{}", self.render_text(templates))?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut *writer, self).map_err(io::Error::from)?;
                writeln!(writer)?;
            }
        }
        writer.flush()
    }
}

fn serialize_elapsed<S: serde::Serializer>(elapsed: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_elapsed(*elapsed))
}

/// Format a duration as `H:MM:SS.ffffff`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        elapsed.subsec_micros()
    )
}

/// Replace `{key}` placeholders in `template`.
pub fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = match after.find('}') {
            Some(close) => close,
            None => {
                out.push_str(&rest[open..]);
                return out;
            }
        };

        let key = &after[..close];
        match values.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats() -> ConcurrencyStats {
        ConcurrencyStats::from_counts(&[0, 1, 2]).unwrap()
    }

    #[test]
    fn test_fill() {
        let values = [("a", "1".to_string()), ("bb", "two".to_string())];
        assert_eq!(fill("{a}-{bb}", &values), "1-two");
        assert_eq!(fill("{a} {missing}", &values), "1 {missing}");
        assert_eq!(fill("no placeholders", &values), "no placeholders");
        assert_eq!(fill("open {a", &values), "open {a");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_micros(1_234_567)), "0:00:01.234567");
        assert_eq!(format_elapsed(Duration::from_secs(3_725)), "1:02:05.000000");
    }

    #[test]
    fn test_text_report() {
        let stats = sample_stats();
        let report = Report::new(&stats, Duration::from_millis(1500), false);
        let text = report.render_text(&ReportTemplates::default());

        assert!(text.starts_with("---RESULT---\n"), "{}", text);
        assert!(text.contains("Q1 Conn       : 0.5\n"), "{}", text);
        assert!(text.contains("Median Conn   : 1\n"), "{}", text);
        assert!(text.contains("Max Conn      : 2\n"), "{}", text);
        assert!(text.contains("Query Count   : 3"), "{}", text);
        assert!(
            text.contains("---BUCKETS---\nCount of (00) : 1\nCount of (01) : 1\nCount of (02) : 1\n"),
            "{}",
            text
        );
        assert!(text.ends_with("Script Time: 0:00:01.500000"), "{}", text);
    }

    #[test]
    fn test_custom_templates() {
        let stats = sample_stats();
        let report = Report::new(&stats, Duration::ZERO, false);
        let templates = ReportTemplates {
            stats_string: "max={max}".to_string(),
            bucket_count_string: "{0}:{1}".to_string(),
            script_time_string: String::new(),
            full_output_string: "{stats}|{buckets}".to_string(),
        };
        assert_eq!(report.render_text(&templates), "max=2|00:1\n01:1\n02:1");
    }

    #[test]
    fn test_json_report() {
        let stats = sample_stats();
        let report = Report::new(&stats, Duration::from_secs(2), true);

        let mut out = Vec::new();
        report
            .write(&mut out, OutputFormat::Json, &ReportTemplates::default())
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["max"], 2);
        assert_eq!(value["num_of_max"], 1);
        assert_eq!(value["median"], 1.0);
        assert_eq!(value["count"], 3);
        assert_eq!(value["time_diff"], "0:00:02.000000");
        assert_eq!(value["cancelled"], true);
        assert_eq!(value["buckets"], serde_json::json!([[0, 1], [1, 1], [2, 1]]));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }
}
