//! Heuristic detectors.
//!
//! Each detector turns landmarks (or contours) for one frame into zero or
//! more [`DetectionEvent`](crate::event::DetectionEvent)s. None of them
//! consult the cooldown gate; that is the frame processor's job.

/// Pinch/writing and pointing gestures from hand landmarks
pub mod hand_gesture;

/// Phone-shaped contour filter
pub mod phone;

/// Mouth movement between consecutive frames
pub mod talking;

pub use hand_gesture::{HandGesture, HandGestureDetector};
pub use phone::{Contour, ContourExtractor, NoContours, PhoneShapeDetector};
pub use talking::TalkingDetector;

#[cfg(feature = "opencv")]
pub use phone::EdgeContourExtractor;
