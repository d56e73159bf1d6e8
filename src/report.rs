//! Session report generation.
//!
//! A [`Report`] is computed from a copy of the session log and counters plus
//! the session timestamps. Missing timestamps render as `N/A`. Rendering is
//! plain paginated text; [`Report::to_json`] exposes the same data to other
//! front ends.

use crate::{
    event::{CategoryCounters, DetectionCategory},
    session::LogEntry,
    Error, Result,
};
use chrono::{DateTime, TimeDelta, Utc};
use log::info;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const TITLE: &str = "Student Malpractice Detection Report";
const FOOTER: &str = "Report generated by Student Malpractice Detection System";
const NO_EVENTS: &str = "No malpractice events detected during this session.";
const UNKNOWN: &str = "N/A";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RULE_WIDTH: usize = 64;

/// Derived session figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub total_events: usize,

    /// Zero unless both timestamps are known and the session has positive length
    pub events_per_minute: f64,

    pub most_common: Option<DetectionCategory>,
    pub average_confidence: f64,
}

impl SessionStats {
    /// Compute statistics over a session log
    ///
    /// Ties for the most common category go to whichever category reached the
    /// shared count first while walking the log in order.
    #[must_use]
    pub fn compute(entries: &[LogEntry], duration: Option<TimeDelta>) -> Self {
        let mut stats = Self {
            total_events: entries.len(),
            events_per_minute: 0.0,
            most_common: None,
            average_confidence: 0.0,
        };
        if entries.is_empty() {
            return stats;
        }

        if let Some(duration) = duration {
            let minutes = duration.num_milliseconds() as f64 / 60_000.0;
            if minutes > 0.0 {
                stats.events_per_minute = entries.len() as f64 / minutes;
            }
        }

        let mut running = CategoryCounters::default();
        let mut best_count = 0;
        let mut confidence_sum = 0.0;
        for entry in entries {
            let category = entry.event.category();
            let count = running.increment(category);
            if count > best_count {
                best_count = count;
                stats.most_common = Some(category);
            }
            confidence_sum += entry.event.confidence();
        }
        stats.average_confidence = confidence_sum / entries.len() as f64;

        stats
    }
}

/// One line of the detection summary table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub label: String,
    pub count: u64,

    /// Share of all events, in percent
    pub percentage: f64,
}

/// One line of the detailed events table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRow {
    /// 1-based position in the session log
    pub index: usize,
    pub time: DateTime<Utc>,
    pub category: DetectionCategory,
    pub confidence: f64,
}

/// Session report contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,

    /// Per-category rows in detector order; the total row is rendered separately
    pub summary: Vec<SummaryRow>,
    pub events: Vec<EventRow>,
    pub stats: SessionStats,
}

impl Report {
    /// Build a report from a session log
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`] if the counters disagree with the log.
    pub fn generate(
        entries: &[LogEntry],
        counters: &CategoryCounters,
        started_at: Option<DateTime<Utc>>,
        ended_at: Option<DateTime<Utc>>,
        generated_at: DateTime<Utc>,
    ) -> Result<Self> {
        let total = entries.len() as u64;
        if counters.total() != total {
            return Err(Error::Report(format!(
                "counters total {} does not match {} logged events",
                counters.total(),
                total
            )));
        }

        let summary = counters
            .iter()
            .map(|(category, count)| SummaryRow {
                label: category.label().to_string(),
                count,
                percentage: percentage(count, total),
            })
            .collect();

        let events = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| EventRow {
                index: i + 1,
                time: entry.event.timestamp(),
                category: entry.event.category(),
                confidence: entry.event.confidence(),
            })
            .collect();

        let duration = session_duration(started_at, ended_at);
        Ok(Self {
            started_at,
            ended_at,
            generated_at,
            summary,
            events,
            stats: SessionStats::compute(entries, duration),
        })
    }

    /// Session length, if both ends are known and ordered
    #[must_use]
    pub fn duration(&self) -> Option<TimeDelta> {
        session_duration(self.started_at, self.ended_at)
    }

    /// Number of pages when rendered with `rows_per_page` event rows per page
    #[must_use]
    pub fn page_count(&self, rows_per_page: usize) -> usize {
        if rows_per_page == 0 {
            return 0;
        }
        self.events.len().div_ceil(rows_per_page).max(1)
    }

    /// Render as paginated plain text, pages separated by form feeds
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`] if `rows_per_page` is zero.
    pub fn render_text(&self, rows_per_page: usize) -> Result<String> {
        if rows_per_page == 0 {
            return Err(Error::Report("rows per page must be positive".to_string()));
        }
        let pages = self.page_count(rows_per_page);
        let mut out = String::new();

        self.write_front_matter(&mut out)?;

        if self.events.is_empty() {
            writeln!(out, "{NO_EVENTS}").map_err(layout_error)?;
            writeln!(out).map_err(layout_error)?;
            writeln!(out, "{FOOTER}").map_err(layout_error)?;
            write_page_footer(&mut out, 1, pages)?;
            return Ok(out);
        }

        for (page, rows) in self.events.chunks(rows_per_page).enumerate() {
            if page > 0 {
                out.push('\u{c}');
                out.push('\n');
            }
            writeln!(out, "Detailed Events Log").map_err(layout_error)?;
            writeln!(out, "{:<10} {:<24} {:>10} {:>8}", "Time", "Detection Type", "Confidence", "Event #")
                .map_err(layout_error)?;
            writeln!(out, "{}", "-".repeat(RULE_WIDTH)).map_err(layout_error)?;
            for row in rows {
                writeln!(
                    out,
                    "{:<10} {:<24} {:>10.2} {:>8}",
                    row.time.format("%H:%M:%S"),
                    row.category.label(),
                    row.confidence,
                    row.index
                )
                .map_err(layout_error)?;
            }
            if page + 1 == pages {
                writeln!(out).map_err(layout_error)?;
                writeln!(out, "{FOOTER}").map_err(layout_error)?;
            }
            write_page_footer(&mut out, page + 1, pages)?;
        }

        Ok(out)
    }

    fn write_front_matter(&self, out: &mut String) -> Result<()> {
        let total = self.stats.total_events;
        writeln!(out, "{TITLE}").map_err(layout_error)?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH)).map_err(layout_error)?;
        writeln!(out).map_err(layout_error)?;

        writeln!(out, "Session Information").map_err(layout_error)?;
        writeln!(out, "{:<24}{}", "Session Start:", format_timestamp(self.started_at)).map_err(layout_error)?;
        writeln!(out, "{:<24}{}", "Session End:", format_timestamp(self.ended_at)).map_err(layout_error)?;
        writeln!(out, "{:<24}{}", "Duration:", format_duration(self.duration())).map_err(layout_error)?;
        writeln!(out, "{:<24}{total}", "Total Events Detected:").map_err(layout_error)?;
        writeln!(out, "{:<24}{}", "Report Generated:", self.generated_at.format(DATE_FORMAT))
            .map_err(layout_error)?;
        writeln!(out).map_err(layout_error)?;

        writeln!(out, "Detection Summary").map_err(layout_error)?;
        writeln!(out, "{:<28} {:>8} {:>12}", "Detection Type", "Count", "Percentage").map_err(layout_error)?;
        writeln!(out, "{}", "-".repeat(50)).map_err(layout_error)?;
        for row in &self.summary {
            writeln!(out, "{:<28} {:>8} {:>11.1}%", row.label, row.count, row.percentage).map_err(layout_error)?;
        }
        writeln!(out, "{:<28} {:>8} {:>11.1}%", "Total Events", total, 100.0).map_err(layout_error)?;
        writeln!(out).map_err(layout_error)?;

        writeln!(out, "Session Statistics").map_err(layout_error)?;
        writeln!(out, "{:<24}{:.2}", "Events per Minute:", self.stats.events_per_minute).map_err(layout_error)?;
        writeln!(
            out,
            "{:<24}{}",
            "Most Common:",
            self.stats.most_common.map_or(UNKNOWN, DetectionCategory::label)
        )
        .map_err(layout_error)?;
        writeln!(out, "{:<24}{:.2}", "Average Confidence:", self.stats.average_confidence).map_err(layout_error)?;
        writeln!(out).map_err(layout_error)?;
        Ok(())
    }

    /// Report file name derived from the generation time
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("proctor_report_{}.txt", self.generated_at.format("%Y%m%d_%H%M%S"))
    }

    /// Render and write the report into `dir`, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the file cannot be written.
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P, rows_per_page: usize) -> Result<PathBuf> {
        let text = self.render_text(rows_per_page)?;
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, text)?;
        info!("Report generated: {}", path.display());
        Ok(path)
    }

    /// JSON form of the report
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Percentage of `count` in `total`, 0 when there are no events
#[must_use]
pub fn percentage(count: u64, total: u64) -> f64 {
    count as f64 / total.max(1) as f64 * 100.0
}

/// `H:MM:SS`, sub-second part dropped; `N/A` when unknown
#[must_use]
pub fn format_duration(duration: Option<TimeDelta>) -> String {
    match duration {
        Some(d) => {
            let secs = d.num_seconds();
            format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
        None => UNKNOWN.to_string(),
    }
}

fn session_duration(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<TimeDelta> {
    match (start, end) {
        (Some(start), Some(end)) if end >= start => Some(end - start),
        _ => None,
    }
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(|| UNKNOWN.to_string(), |t| t.format(DATE_FORMAT).to_string())
}

fn write_page_footer(out: &mut String, page: usize, pages: usize) -> Result<()> {
    writeln!(out, "{:>width$}", format!("Page {page} of {pages}"), width = RULE_WIDTH).map_err(layout_error)
}

fn layout_error(e: std::fmt::Error) -> Error {
    Error::Report(format!("layout failed: {e}"))
}
