//! Per-frame orchestration of the detectors, the cooldown gate and overlays.

use crate::{
    config::Config,
    cooldown::CooldownGate,
    detectors::{ContourExtractor, HandGestureDetector, PhoneShapeDetector, TalkingDetector},
    event::{DetectionCategory, DetectionEvent},
    frame::Canvas,
    landmarks::LandmarkProvider,
    Result,
};
use chrono::{DateTime, Utc};

/// Annotated frame plus the detections that passed the cooldown gate
#[derive(Debug)]
pub struct FrameOutcome<F> {
    pub frame: F,
    pub detections: Vec<DetectionEvent>,
}

/// Runs hand, phone and talking detection on each frame, in that order
pub struct FrameProcessor<F> {
    landmarks: Box<dyn LandmarkProvider<F>>,
    contours: Box<dyn ContourExtractor<F>>,
    hand: HandGestureDetector,
    phone: PhoneShapeDetector,
    talking: TalkingDetector,
    cooldown: CooldownGate,
    frames_processed: u64,
}

impl<F: Canvas> FrameProcessor<F> {
    /// Create a processor from configuration and the two vision capabilities
    #[must_use]
    pub fn new(
        config: &Config,
        landmarks: Box<dyn LandmarkProvider<F>>,
        contours: Box<dyn ContourExtractor<F>>,
    ) -> Self {
        Self {
            landmarks,
            contours,
            hand: HandGestureDetector::new(config.hand.clone()),
            phone: PhoneShapeDetector::new(config.phone.clone()),
            talking: TalkingDetector::new(config.talking.clone()),
            cooldown: CooldownGate::from_secs(config.cooldown.seconds),
            frames_processed: 0,
        }
    }

    /// Detect, gate and annotate one frame
    ///
    /// Detector failures are logged and count as "no detection".
    ///
    /// # Errors
    ///
    /// Returns an error only if drawing the overlays fails.
    pub fn process(&mut self, mut frame: F, now: DateTime<Utc>) -> Result<FrameOutcome<F>> {
        let size = frame.frame_size();

        let hand_events = match self.landmarks.detect_hands(&frame) {
            Ok(hands) => self.hand.detect(size, &hands, now),
            Err(e) => {
                log::warn!("Hand tracking failed: {e}");
                Vec::new()
            }
        };

        let phone_events: Vec<DetectionEvent> = match self.contours.external_contours(&frame) {
            Ok(contours) => self.phone.detect(&contours, now).into_iter().collect(),
            Err(e) => {
                log::warn!("Contour extraction failed: {e}");
                Vec::new()
            }
        };

        let talking_events = match self.landmarks.detect_faces(&frame) {
            Ok(faces) => self.talking.detect(size, &faces, now),
            Err(e) => {
                log::warn!("Face tracking failed: {e}");
                Vec::new()
            }
        };

        self.landmarks.finish_frame();

        let mut detections = Vec::new();
        for (category, events) in [
            (DetectionCategory::HandGesture, hand_events),
            (DetectionCategory::MobilePhone, phone_events),
            (DetectionCategory::Talking, talking_events),
        ] {
            if !events.is_empty() && self.cooldown.should_fire(category, now) {
                detections.extend(events);
            }
        }

        for event in &detections {
            frame.draw_detection(event)?;
        }

        self.frames_processed += 1;
        frame.draw_caption(&format!("Frame: {}", self.frames_processed))?;

        Ok(FrameOutcome { frame, detections })
    }
}

impl<F> FrameProcessor<F> {
    /// Clear cooldown and talking state for a new session
    pub fn reset(&mut self) {
        self.cooldown.reset();
        self.talking.reset();
        self.frames_processed = 0;
    }

    #[must_use]
    pub const fn cooldown(&self) -> &CooldownGate {
        &self.cooldown
    }

    #[must_use]
    pub const fn talking(&self) -> &TalkingDetector {
        &self.talking
    }

    #[must_use]
    pub const fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::{INDEX_FINGER_TIP, THUMB_TIP, WRIST},
        detectors::{Contour, NoContours},
        event::BoundingBox,
        frame::{BlankFrame, Overlay},
        landmarks::{Landmark, LandmarkSet},
        Error,
    };
    use chrono::{TimeDelta, TimeZone};

    struct Fixed {
        hands: Vec<LandmarkSet>,
        fail_faces: bool,
    }

    impl LandmarkProvider<BlankFrame> for Fixed {
        fn detect_hands(&mut self, _frame: &BlankFrame) -> Result<Vec<LandmarkSet>> {
            Ok(self.hands.clone())
        }

        fn detect_faces(&mut self, _frame: &BlankFrame) -> Result<Vec<LandmarkSet>> {
            if self.fail_faces {
                Err(Error::ModelError("face model offline".to_string()))
            } else {
                Ok(Vec::new())
            }
        }
    }

    struct OnePhone;

    impl ContourExtractor<BlankFrame> for OnePhone {
        fn external_contours(&mut self, _frame: &BlankFrame) -> Result<Vec<Contour>> {
            Ok(vec![Contour {
                area: 3000.0,
                rect: BoundingBox::from_rect(200, 100, 45, 75),
            }])
        }
    }

    fn pinch_hand() -> LandmarkSet {
        let mut points = vec![Landmark::new(0.5, 0.5); 21];
        points[WRIST] = Landmark::new(0.5, 0.9);
        points[THUMB_TIP] = Landmark::new(0.40, 0.4);
        points[INDEX_FINGER_TIP] = Landmark::new(0.42, 0.4);
        LandmarkSet::new(points)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_detector_order_and_overlays() {
        let mut processor = FrameProcessor::new(
            &Config::default(),
            Box::new(Fixed {
                hands: vec![pinch_hand()],
                fail_faces: false,
            }),
            Box::new(OnePhone),
        );

        let outcome = processor.process(BlankFrame::new(640, 480), t0()).unwrap();
        let categories: Vec<_> = outcome.detections.iter().map(DetectionEvent::category).collect();
        assert_eq!(categories, vec![DetectionCategory::HandGesture, DetectionCategory::MobilePhone]);

        let drawn: Vec<_> = outcome.frame.drawn_detections().cloned().collect();
        assert_eq!(drawn, outcome.detections);
        assert_eq!(
            outcome.frame.overlays().last(),
            Some(&Overlay::Caption("Frame: 1".to_string()))
        );
    }

    #[test]
    fn test_suppressed_events_not_drawn() {
        let mut processor = FrameProcessor::new(
            &Config::default(),
            Box::new(Fixed {
                hands: vec![pinch_hand()],
                fail_faces: false,
            }),
            Box::new(NoContours),
        );

        processor.process(BlankFrame::new(640, 480), t0()).unwrap();
        let second = processor
            .process(BlankFrame::new(640, 480), t0() + TimeDelta::milliseconds(100))
            .unwrap();
        assert!(second.detections.is_empty());
        assert_eq!(second.frame.drawn_detections().count(), 0);
        assert_eq!(processor.frames_processed(), 2);
    }

    #[test]
    fn test_all_hands_of_accepted_frame_kept() {
        let mut processor = FrameProcessor::new(
            &Config::default(),
            Box::new(Fixed {
                hands: vec![pinch_hand(), pinch_hand()],
                fail_faces: false,
            }),
            Box::new(NoContours),
        );
        let outcome = processor.process(BlankFrame::new(640, 480), t0()).unwrap();
        assert_eq!(outcome.detections.len(), 2);
    }

    #[test]
    fn test_failing_provider_degrades() {
        let mut processor = FrameProcessor::new(
            &Config::default(),
            Box::new(Fixed {
                hands: vec![pinch_hand()],
                fail_faces: true,
            }),
            Box::new(NoContours),
        );
        let outcome = processor.process(BlankFrame::new(640, 480), t0()).unwrap();
        assert_eq!(outcome.detections.len(), 1);
    }

    #[test]
    fn test_reset_clears_cooldown() {
        let mut processor = FrameProcessor::new(
            &Config::default(),
            Box::new(Fixed {
                hands: vec![pinch_hand()],
                fail_faces: false,
            }),
            Box::new(NoContours),
        );
        processor.process(BlankFrame::new(640, 480), t0()).unwrap();
        processor.reset();
        assert!(processor.cooldown().last_fired(DetectionCategory::HandGesture).is_none());
        assert_eq!(processor.frames_processed(), 0);

        let outcome = processor.process(BlankFrame::new(640, 480), t0()).unwrap();
        assert_eq!(outcome.detections.len(), 1);
    }
}
