//! Talking detection from mouth landmark movement between frames.

use crate::{
    config::TalkingConfig,
    event::{DetectionCategory, DetectionEvent},
    frame::FrameSize,
    landmarks::LandmarkSet,
    utils::{distance, padded_pixel_bounds},
};
use chrono::{DateTime, Utc};

/// Mean per-landmark displacement between two mouth sets.
///
/// Sets of different (or zero) length have no defined movement and yield 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mouth_movement(current: &LandmarkSet, previous: &LandmarkSet) -> f64 {
    if current.len() != previous.len() || current.is_empty() {
        return 0.0;
    }

    let total: f64 = current
        .points()
        .iter()
        .zip(previous.points())
        .map(|(c, p)| distance(c, p))
        .sum();
    total / current.len() as f64
}

/// Stateful detector; remembers the previous frame's mouth
#[derive(Debug, Clone, Default)]
pub struct TalkingDetector {
    config: TalkingConfig,
    previous_mouth: Option<LandmarkSet>,
}

impl TalkingDetector {
    #[must_use]
    pub const fn new(config: TalkingConfig) -> Self {
        Self {
            config,
            previous_mouth: None,
        }
    }

    /// Mouth retained from the last frame a face was found in
    #[must_use]
    pub const fn previous_mouth(&self) -> Option<&LandmarkSet> {
        self.previous_mouth.as_ref()
    }

    /// Drop the retained mouth so the next frame starts fresh
    pub fn reset(&mut self) {
        self.previous_mouth = None;
    }

    /// Compare each face's mouth with the retained one, then retain it
    pub fn detect(&mut self, size: FrameSize, faces: &[LandmarkSet], now: DateTime<Utc>) -> Vec<DetectionEvent> {
        let mut events = Vec::new();

        for face in faces {
            let mouth = match face.mouth() {
                Ok(mouth) => mouth,
                Err(e) => {
                    log::warn!("Skipping face: {e}");
                    continue;
                }
            };

            if let Some(previous) = &self.previous_mouth {
                let movement = mouth_movement(&mouth, previous);
                if movement > self.config.movement_threshold {
                    if let Some(bbox) = padded_pixel_bounds(mouth.points(), size, self.config.padding) {
                        let confidence = (movement * self.config.confidence_scale).min(1.0);
                        log::debug!("Mouth movement {movement:.4} -> confidence {confidence:.2}");
                        events.push(DetectionEvent::new(DetectionCategory::Talking, confidence, bbox, now));
                    }
                }
            }

            self.previous_mouth = Some(mouth);
        }

        events
    }
}
