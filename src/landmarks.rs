//! Landmark types and the landmark provider capability.
//!
//! Landmark tracking itself is delegated to a [`LandmarkProvider`]. The
//! detectors only ever see normalized points, so they can be driven by a
//! vision model, by a recorded session, or by synthetic fixtures.

use crate::{
    constants::{MOUTH_INDICES, NUM_HAND_LANDMARKS},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Normalized 2D point, `x` and `y` typically in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same point moved by `(dx, dy)`
    #[must_use]
    pub fn shifted(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Ordered landmarks describing one anatomical region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    #[must_use]
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// Point at `index`, or a malformed-landmark error naming the region
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLandmarks`] when the set is too short.
    pub fn point(&self, index: usize) -> Result<&Landmark> {
        self.points.get(index).ok_or_else(|| {
            Error::MalformedLandmarks(format!("landmark {index} missing from set of {}", self.points.len()))
        })
    }

    /// Check that this is a full hand set
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLandmarks`] unless the set has exactly 21 points.
    pub fn ensure_hand(&self) -> Result<()> {
        if self.points.len() == NUM_HAND_LANDMARKS {
            Ok(())
        } else {
            Err(Error::MalformedLandmarks(format!(
                "expected {NUM_HAND_LANDMARKS} hand landmarks, got {}",
                self.points.len()
            )))
        }
    }

    /// Extract the 12-point lip outline from a face mesh
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLandmarks`] if any mouth index is out of range.
    pub fn mouth(&self) -> Result<Self> {
        MOUTH_INDICES
            .iter()
            .map(|&i| self.point(i).copied())
            .collect::<Result<Vec<_>>>()
            .map(Self::new)
    }

    /// Same set with every point moved by `(dx, dy)`
    #[must_use]
    pub fn shifted(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.points.iter().map(|p| p.shifted(dx, dy)).collect())
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    fn from(points: Vec<Landmark>) -> Self {
        Self::new(points)
    }
}

/// Landmark tracking capability
///
/// For each processed frame the pipeline calls [`detect_hands`](Self::detect_hands),
/// then [`detect_faces`](Self::detect_faces), then [`finish_frame`](Self::finish_frame).
pub trait LandmarkProvider<F>: Send {
    /// Hand landmark sets (21 points each) found in the frame
    ///
    /// # Errors
    ///
    /// Returns an error when tracking fails; the hand detector skips the frame.
    fn detect_hands(&mut self, frame: &F) -> Result<Vec<LandmarkSet>>;

    /// Face mesh landmark sets (468 points each) found in the frame
    ///
    /// # Errors
    ///
    /// Returns an error when tracking fails; the talking detector skips the frame.
    fn detect_faces(&mut self, frame: &F) -> Result<Vec<LandmarkSet>>;

    /// Called once both queries for a frame have been made
    fn finish_frame(&mut self) {}
}

/// Landmarks of one recorded frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameLandmarks {
    pub hands: Vec<LandmarkSet>,
    pub faces: Vec<LandmarkSet>,
}

/// Replays recorded landmarks, one entry per frame, cycling at the end
#[derive(Debug, Clone)]
pub struct RecordedLandmarks {
    frames: Vec<FrameLandmarks>,
    cursor: usize,
}

impl RecordedLandmarks {
    /// Build from in-memory frames
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty recording.
    pub fn new(frames: Vec<FrameLandmarks>) -> Result<Self> {
        if frames.is_empty() {
            return Err(Error::InvalidInput("landmark recording has no frames".to_string()));
        }
        Ok(Self { frames, cursor: 0 })
    }

    /// Load a JSON array of `{ "hands": [...], "faces": [...] }` objects
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or is empty.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let frames: Vec<FrameLandmarks> = serde_json::from_str(&content)?;
        log::info!(
            "Loaded {} recorded landmark frames from {}",
            frames.len(),
            path.as_ref().display()
        );
        Self::new(frames)
    }

    fn current(&self) -> &FrameLandmarks {
        &self.frames[self.cursor % self.frames.len()]
    }
}

impl<F> LandmarkProvider<F> for RecordedLandmarks {
    fn detect_hands(&mut self, _frame: &F) -> Result<Vec<LandmarkSet>> {
        Ok(self.current().hands.clone())
    }

    fn detect_faces(&mut self, _frame: &F) -> Result<Vec<LandmarkSet>> {
        Ok(self.current().faces.clone())
    }

    fn finish_frame(&mut self) {
        self.cursor = (self.cursor + 1) % self.frames.len();
    }
}
