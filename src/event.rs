//! Detection events and per-category bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of suspicious behaviour a detector reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DetectionCategory {
    /// Pinch/writing or pointing hand gesture
    #[serde(rename = "hand_gestures")]
    HandGesture,
    /// Phone-shaped object in view
    #[serde(rename = "mobile_phone")]
    MobilePhone,
    /// Mouth movement between consecutive frames
    #[serde(rename = "talking")]
    Talking,
}

impl DetectionCategory {
    /// All categories in detector order
    pub const ALL: [Self; 3] = [Self::HandGesture, Self::MobilePhone, Self::Talking];

    /// Stable identifier used in logs and serialized output
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::HandGesture => "hand_gestures",
            Self::MobilePhone => "mobile_phone",
            Self::Talking => "talking",
        }
    }

    /// Human readable name for reports
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HandGesture => "Hand Gestures",
            Self::MobilePhone => "Mobile Phone Usage",
            Self::Talking => "Talking/Mouth Movement",
        }
    }

    /// Overlay colour as BGR components
    #[must_use]
    pub const fn overlay_color(self) -> (f64, f64, f64) {
        match self {
            Self::HandGesture => (0.0, 0.0, 255.0),
            Self::MobilePhone => (255.0, 0.0, 0.0),
            Self::Talking => (0.0, 255.0, 255.0),
        }
    }

    /// Colour used by the web view
    #[must_use]
    pub const fn hex_color(self) -> &'static str {
        match self {
            Self::HandGesture => "#ff4757",
            Self::MobilePhone => "#3742fa",
            Self::Talking => "#ffa502",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::HandGesture => 0,
            Self::MobilePhone => 1,
            Self::Talking => 2,
        }
    }
}

impl fmt::Display for DetectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Pixel-space box, `(x_min, y_min)` inclusive to `(x_max, y_max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Build from an origin and extent
    #[must_use]
    pub const fn from_rect(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.y_max - self.y_min
    }
}

/// A single accepted or candidate detection. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    category: DetectionCategory,
    confidence: f64,
    bbox: BoundingBox,
    timestamp: DateTime<Utc>,
}

impl DetectionEvent {
    /// Create an event; confidence is clamped into `[0, 1]` (NaN becomes 0).
    #[must_use]
    pub fn new(category: DetectionCategory, confidence: f64, bbox: BoundingBox, timestamp: DateTime<Utc>) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        Self {
            category,
            confidence,
            bbox,
            timestamp,
        }
    }

    #[must_use]
    pub const fn category(&self) -> DetectionCategory {
        self.category
    }

    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    #[must_use]
    pub const fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Caption drawn next to the overlay box
    #[must_use]
    pub fn overlay_label(&self) -> String {
        match self.category {
            DetectionCategory::HandGesture => "SUSPICIOUS GESTURE".to_string(),
            DetectionCategory::MobilePhone => format!("MOBILE PHONE ({:.2})", self.confidence),
            DetectionCategory::Talking => "TALKING DETECTED".to_string(),
        }
    }
}

/// Running count per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounters {
    counts: [u64; 3],
}

impl CategoryCounters {
    #[must_use]
    pub const fn get(&self, category: DetectionCategory) -> u64 {
        self.counts[category.index()]
    }

    /// Increment and return the new count
    pub fn increment(&mut self, category: DetectionCategory) -> u64 {
        let slot = &mut self.counts[category.index()];
        *slot += 1;
        *slot
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(category, count)` pairs in detector order
    pub fn iter(&self) -> impl Iterator<Item = (DetectionCategory, u64)> + '_ {
        DetectionCategory::ALL.iter().map(|&c| (c, self.get(c)))
    }
}

impl Serialize for CategoryCounters {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(DetectionCategory::ALL.len()))?;
        for (category, count) in self.iter() {
            map.serialize_entry(category.key(), &count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_confidence_clamped() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bbox = BoundingBox::new(0, 0, 1, 1);
        assert_eq!(DetectionEvent::new(DetectionCategory::Talking, 3.0, bbox, ts).confidence(), 1.0);
        assert_eq!(DetectionEvent::new(DetectionCategory::Talking, -1.0, bbox, ts).confidence(), 0.0);
        assert_eq!(DetectionEvent::new(DetectionCategory::Talking, f64::NAN, bbox, ts).confidence(), 0.0);
    }

    #[test]
    fn test_counters() {
        let mut counters = CategoryCounters::default();
        assert_eq!(counters.increment(DetectionCategory::Talking), 1);
        assert_eq!(counters.increment(DetectionCategory::Talking), 2);
        assert_eq!(counters.increment(DetectionCategory::MobilePhone), 1);
        assert_eq!(counters.get(DetectionCategory::HandGesture), 0);
        assert_eq!(counters.total(), 3);
    }

    #[test]
    fn test_counters_serialize_as_map() {
        let mut counters = CategoryCounters::default();
        counters.increment(DetectionCategory::HandGesture);
        let json = serde_json::to_string(&counters).unwrap();
        assert_eq!(json, r#"{"hand_gestures":1,"mobile_phone":0,"talking":0}"#);
    }

    #[test]
    fn test_web_colors() {
        assert_eq!(DetectionCategory::HandGesture.hex_color(), "#ff4757");
        assert_eq!(DetectionCategory::MobilePhone.hex_color(), "#3742fa");
        assert_eq!(DetectionCategory::Talking.hex_color(), "#ffa502");
    }

    #[test]
    fn test_overlay_labels() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bbox = BoundingBox::from_rect(10, 10, 40, 60);
        assert_eq!(bbox, BoundingBox::new(10, 10, 50, 70));
        let phone = DetectionEvent::new(DetectionCategory::MobilePhone, 0.75, bbox, ts);
        assert_eq!(phone.overlay_label(), "MOBILE PHONE (0.75)");
        assert_eq!(DetectionCategory::Talking.to_string(), "talking");
    }
}
