//! Configuration management for the proctoring application

use crate::{
    constants::{
        CANNY_HIGH_THRESHOLD, CANNY_LOW_THRESHOLD, DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH,
        DEFAULT_COOLDOWN_SECS, DEFAULT_FRAME_INTERVAL_MS, DEFAULT_MIN_PRESENCE, DEFAULT_ROWS_PER_PAGE,
        HAND_BOX_PADDING, HAND_GESTURE_CONFIDENCE, MOUTH_BOX_PADDING, MOUTH_MOVEMENT_THRESHOLD, PHONE_AREA_MAX,
        PHONE_AREA_MIN, PHONE_ASPECT_MAX, PHONE_ASPECT_MIN, PHONE_CONFIDENCE, PINCH_DISTANCE_MAX,
        POINTING_INDEX_DISTANCE_MIN, POINTING_MIDDLE_DISTANCE_MAX, TALKING_CONFIDENCE_SCALE,
    },
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hand gesture thresholds
    pub hand: HandConfig,

    /// Phone shape window
    pub phone: PhoneConfig,

    /// Talking detection
    pub talking: TalkingConfig,

    /// Cooldown between detections of one category
    pub cooldown: CooldownConfig,

    /// Video capture
    pub capture: CaptureConfig,

    /// Landmark model files
    pub models: ModelConfig,

    /// Report output
    pub report: ReportConfig,
}

/// Hand gesture thresholds, in normalized coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    /// Thumb-index distance below which a pinch is reported
    pub pinch_distance: f64,

    /// Wrist-index distance above which the index counts as extended
    pub pointing_index_min: f64,

    /// Wrist-middle distance below which the middle finger counts as curled
    pub pointing_middle_max: f64,

    pub confidence: f64,

    /// Box padding in pixels
    pub padding: i32,
}

/// Phone shape window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneConfig {
    pub canny_low: f64,
    pub canny_high: f64,

    /// Exclusive contour area window in pixels²
    pub min_area: f64,
    pub max_area: f64,

    /// Exclusive width/height window
    pub min_aspect: f64,
    pub max_aspect: f64,

    pub confidence: f64,
}

/// Talking detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TalkingConfig {
    /// Mean mouth displacement above which talking is reported
    pub movement_threshold: f64,

    /// Confidence = min(movement * scale, 1)
    pub confidence_scale: f64,

    /// Box padding in pixels
    pub padding: i32,
}

/// Cooldown configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Seconds between two accepted detections of one category
    pub seconds: f64,
}

/// Video capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera index used when no video file is given
    pub camera_index: i32,

    /// Requested frame width
    pub width: i32,

    /// Requested frame height
    pub height: i32,

    /// Pause after each processed frame
    pub frame_interval_ms: u64,
}

/// Landmark model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the 21-point hand landmark ONNX model
    pub hand_landmarks: PathBuf,

    /// Path to the 468-point face mesh ONNX model
    pub face_mesh: PathBuf,

    /// Minimum presence score for a hand or face to be reported
    pub min_presence: f32,
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory reports are written to
    pub output_dir: PathBuf,

    /// Event rows per page
    pub rows_per_page: usize,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            pinch_distance: PINCH_DISTANCE_MAX,
            pointing_index_min: POINTING_INDEX_DISTANCE_MIN,
            pointing_middle_max: POINTING_MIDDLE_DISTANCE_MAX,
            confidence: HAND_GESTURE_CONFIDENCE,
            padding: HAND_BOX_PADDING,
        }
    }
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            canny_low: CANNY_LOW_THRESHOLD,
            canny_high: CANNY_HIGH_THRESHOLD,
            min_area: PHONE_AREA_MIN,
            max_area: PHONE_AREA_MAX,
            min_aspect: PHONE_ASPECT_MIN,
            max_aspect: PHONE_ASPECT_MAX,
            confidence: PHONE_CONFIDENCE,
        }
    }
}

impl Default for TalkingConfig {
    fn default() -> Self {
        Self {
            movement_threshold: MOUTH_MOVEMENT_THRESHOLD,
            confidence_scale: TALKING_CONFIDENCE_SCALE,
            padding: MOUTH_BOX_PADDING,
        }
    }
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            seconds: DEFAULT_COOLDOWN_SECS,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            width: DEFAULT_CAPTURE_WIDTH,
            height: DEFAULT_CAPTURE_HEIGHT,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

impl CaptureConfig {
    #[must_use]
    pub const fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hand_landmarks: PathBuf::from("assets/hand_landmark.onnx"),
            face_mesh: PathBuf::from("assets/face_mesh.onnx"),
            min_presence: DEFAULT_MIN_PRESENCE,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::ConfigError(format!("{name} must be between 0.0 and 1.0")))
    }
}

fn check_window(name: &str, min: f64, max: f64) -> Result<()> {
    if min >= 0.0 && min < max {
        Ok(())
    } else {
        Err(Error::ConfigError(format!(
            "{name} window must satisfy 0 <= min < max (got {min}..{max})"
        )))
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        // Hand thresholds
        if self.hand.pinch_distance <= 0.0 {
            return Err(Error::ConfigError("Pinch distance must be positive".to_string()));
        }
        if self.hand.pointing_index_min <= 0.0 || self.hand.pointing_middle_max <= 0.0 {
            return Err(Error::ConfigError("Pointing distances must be positive".to_string()));
        }
        check_unit("Hand gesture confidence", self.hand.confidence)?;

        // Phone window
        check_window("Canny threshold", self.phone.canny_low, self.phone.canny_high)?;
        check_window("Phone area", self.phone.min_area, self.phone.max_area)?;
        check_window("Phone aspect ratio", self.phone.min_aspect, self.phone.max_aspect)?;
        check_unit("Phone confidence", self.phone.confidence)?;

        // Talking
        if self.talking.movement_threshold < 0.0 {
            return Err(Error::ConfigError("Movement threshold must not be negative".to_string()));
        }
        if self.talking.confidence_scale <= 0.0 {
            return Err(Error::ConfigError("Confidence scale must be positive".to_string()));
        }

        if self.hand.padding < 0 || self.talking.padding < 0 {
            return Err(Error::ConfigError("Box padding must not be negative".to_string()));
        }

        if !self.cooldown.seconds.is_finite() || self.cooldown.seconds < 0.0 {
            return Err(Error::ConfigError("Cooldown must be a non-negative number of seconds".to_string()));
        }

        if self.capture.width <= 0 || self.capture.height <= 0 {
            return Err(Error::ConfigError("Capture size must be positive".to_string()));
        }

        if !(0.0..=1.0).contains(&self.models.min_presence) {
            return Err(Error::ConfigError("Minimum presence must be between 0.0 and 1.0".to_string()));
        }

        if self.report.rows_per_page == 0 {
            return Err(Error::ConfigError("Rows per page must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Exam Proctoring Configuration

# Hand gesture thresholds (normalized coordinates)
hand:
  pinch_distance: 0.05
  pointing_index_min: 0.2
  pointing_middle_max: 0.15
  confidence: 0.85
  padding: 20

# Phone shape window
phone:
  canny_low: 50.0
  canny_high: 150.0
  min_area: 1000.0
  max_area: 8000.0
  min_aspect: 0.4
  max_aspect: 0.8
  confidence: 0.75

# Talking detection
talking:
  movement_threshold: 0.01
  confidence_scale: 10.0
  padding: 30

cooldown:
  seconds: 2.0

# Video capture
capture:
  camera_index: 0
  width: 640
  height: 480
  frame_interval_ms: 100

# Landmark models
models:
  hand_landmarks: "assets/hand_landmark.onnx"
  face_mesh: "assets/face_mesh.onnx"
  min_presence: 0.7

# Report output
report:
  output_dir: "."
  rows_per_page: 40
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_example_matches_defaults() {
        let parsed: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        parsed.validate().unwrap();
        let defaults = Config::default();
        assert_eq!(parsed.hand.pinch_distance, defaults.hand.pinch_distance);
        assert_eq!(parsed.phone.max_area, defaults.phone.max_area);
        assert_eq!(parsed.talking.padding, defaults.talking.padding);
        assert_eq!(parsed.cooldown.seconds, defaults.cooldown.seconds);
        assert_eq!(parsed.capture.frame_interval(), Duration::from_millis(100));
        assert_eq!(parsed.report.rows_per_page, defaults.report.rows_per_page);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = serde_yaml::from_str("cooldown:\n  seconds: 5.0\nhand:\n  padding: 8\n").unwrap();
        assert_eq!(parsed.cooldown.seconds, 5.0);
        assert_eq!(parsed.hand.padding, 8);
        assert_eq!(parsed.hand.confidence, HAND_GESTURE_CONFIDENCE);
        assert_eq!(parsed.phone.min_area, PHONE_AREA_MIN);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = Config::default();
        config.phone.min_aspect = 0.9;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let mut config = Config::default();
        config.hand.confidence = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cooldown.seconds = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.report.rows_per_page = 0;
        assert!(config.validate().is_err());
    }
}
