use crate::{
    config::HandConfig,
    constants::{INDEX_FINGER_TIP, MIDDLE_FINGER_TIP, THUMB_TIP, WRIST},
    event::{DetectionCategory, DetectionEvent},
    frame::FrameSize,
    landmarks::LandmarkSet,
    utils::{distance, padded_pixel_bounds},
    Result,
};
use chrono::{DateTime, Utc};

/// Recognised suspicious gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandGesture {
    /// Thumb and index fingertip together, as when holding a pen
    Pinch,
    /// Index finger extended while the middle finger is curled
    Pointing,
}

/// Two-rule hand gesture classifier
#[derive(Debug, Clone, Default)]
pub struct HandGestureDetector {
    config: HandConfig,
}

impl HandGestureDetector {
    #[must_use]
    pub const fn new(config: HandConfig) -> Self {
        Self { config }
    }

    /// Classify one 21-point hand
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedLandmarks`] if the set is not a full hand.
    pub fn classify(&self, hand: &LandmarkSet) -> Result<Option<HandGesture>> {
        hand.ensure_hand()?;

        let wrist = hand.point(WRIST)?;
        let thumb_tip = hand.point(THUMB_TIP)?;
        let index_tip = hand.point(INDEX_FINGER_TIP)?;
        let middle_tip = hand.point(MIDDLE_FINGER_TIP)?;

        if distance(thumb_tip, index_tip) < self.config.pinch_distance {
            return Ok(Some(HandGesture::Pinch));
        }

        let index_reach = distance(index_tip, wrist);
        let middle_reach = distance(middle_tip, wrist);
        if index_reach > self.config.pointing_index_min && middle_reach < self.config.pointing_middle_max {
            return Ok(Some(HandGesture::Pointing));
        }

        Ok(None)
    }

    /// One event per suspicious hand; malformed hands are skipped
    #[must_use]
    pub fn detect(&self, size: FrameSize, hands: &[LandmarkSet], now: DateTime<Utc>) -> Vec<DetectionEvent> {
        let mut events = Vec::new();

        for (idx, hand) in hands.iter().enumerate() {
            match self.classify(hand) {
                Ok(Some(gesture)) => {
                    if let Some(bbox) = padded_pixel_bounds(hand.points(), size, self.config.padding) {
                        log::debug!("Hand {idx}: {gesture:?} gesture at {bbox:?}");
                        events.push(DetectionEvent::new(
                            DetectionCategory::HandGesture,
                            self.config.confidence,
                            bbox,
                            now,
                        ));
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Skipping hand {idx}: {e}"),
            }
        }

        events
    }
}
