//! Per-category suppression of repeated detections.

use crate::event::DetectionCategory;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;

/// Remembers when each category last fired and rejects refires inside the interval
#[derive(Debug, Clone)]
pub struct CooldownGate {
    interval: TimeDelta,
    last_fired: HashMap<DetectionCategory, DateTime<Utc>>,
}

impl CooldownGate {
    #[must_use]
    pub fn new(interval: TimeDelta) -> Self {
        Self {
            interval,
            last_fired: HashMap::new(),
        }
    }

    /// Build from a cooldown in seconds (millisecond resolution)
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_secs(seconds: f64) -> Self {
        Self::new(TimeDelta::milliseconds((seconds * 1000.0).round() as i64))
    }

    #[must_use]
    pub const fn interval(&self) -> TimeDelta {
        self.interval
    }

    /// Accept and record `now` if the category never fired or its interval has elapsed
    pub fn should_fire(&mut self, category: DetectionCategory, now: DateTime<Utc>) -> bool {
        let ready = self
            .last_fired
            .get(&category)
            .map_or(true, |&last| now - last >= self.interval);

        if ready {
            self.last_fired.insert(category, now);
        } else {
            log::debug!("{category} suppressed by cooldown");
        }
        ready
    }

    /// Last accepted time of `category`
    #[must_use]
    pub fn last_fired(&self, category: DetectionCategory) -> Option<DateTime<Utc>> {
        self.last_fired.get(&category).copied()
    }

    /// Forget all categories
    pub fn reset(&mut self) {
        self.last_fired.clear();
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::from_secs(crate::constants::DEFAULT_COOLDOWN_SECS)
    }
}
