//! Session event log and counters.

use crate::{
    constants::RECENT_ALERTS,
    event::{CategoryCounters, DetectionEvent},
};
use serde::Serialize;

/// One accepted detection as recorded in the session log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    #[serde(flatten)]
    pub event: DetectionEvent,

    /// Count of this entry's category once it was recorded
    #[serde(rename = "count")]
    pub category_count: u64,

    /// Live view colour of the category
    pub color: &'static str,
}

/// Append-only event log with per-category counters
#[derive(Debug, Clone, Default)]
pub struct SessionAggregator {
    log: Vec<LogEntry>,
    counters: CategoryCounters,
}

impl SessionAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear log and counters
    pub fn reset(&mut self) {
        self.log.clear();
        self.counters = CategoryCounters::default();
    }

    /// Append an event and bump its category counter
    pub fn record(&mut self, event: DetectionEvent) {
        let category_count = self.counters.increment(event.category());
        log::info!(
            "Recorded {} (confidence {:.2}, #{category_count})",
            event.category(),
            event.confidence()
        );
        let color = event.category().hex_color();
        self.log.push(LogEntry {
            event,
            category_count,
            color,
        });
    }

    /// The last `n` entries in chronological order
    #[must_use]
    pub fn recent_events(&self, n: usize) -> &[LogEntry] {
        &self.log[self.log.len().saturating_sub(n)..]
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.log
    }

    #[must_use]
    pub const fn counters(&self) -> &CategoryCounters {
        &self.counters
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.log.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Counters and log length, copied out
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            counts: self.counters,
            total_events: self.log.len(),
        }
    }

    /// Payload for the poll-based live view
    #[must_use]
    pub fn alert_feed(&self) -> AlertFeed {
        AlertFeed {
            alerts: self.recent_events(RECENT_ALERTS).to_vec(),
            counts: self.counters,
            total_events: self.log.len(),
        }
    }
}

/// Immutable counters view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub counts: CategoryCounters,
    pub total_events: usize,
}

/// Most recent alerts plus counters, as served to the live view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertFeed {
    pub alerts: Vec<LogEntry>,
    pub counts: CategoryCounters,
    pub total_events: usize,
}

impl AlertFeed {
    /// JSON body for the live view
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
