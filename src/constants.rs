//! Constants used throughout the application

/// Number of landmarks in a tracked hand
pub const NUM_HAND_LANDMARKS: usize = 21;

/// Number of landmarks in a face mesh
pub const NUM_FACE_MESH_LANDMARKS: usize = 468;

/// Hand landmark indices
pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_FINGER_TIP: usize = 8;
pub const MIDDLE_FINGER_TIP: usize = 12;

/// Face mesh indices of the lip outline used for talking detection
pub const MOUTH_INDICES: [usize; 12] = [61, 84, 17, 314, 405, 320, 307, 375, 321, 308, 324, 318];

/// Hand gesture thresholds (normalized coordinate space)
pub const PINCH_DISTANCE_MAX: f64 = 0.05;
pub const POINTING_INDEX_DISTANCE_MIN: f64 = 0.2;
pub const POINTING_MIDDLE_DISTANCE_MAX: f64 = 0.15;
pub const HAND_GESTURE_CONFIDENCE: f64 = 0.85;
pub const HAND_BOX_PADDING: i32 = 20;

/// Phone shape filter
pub const CANNY_LOW_THRESHOLD: f64 = 50.0;
pub const CANNY_HIGH_THRESHOLD: f64 = 150.0;
pub const PHONE_AREA_MIN: f64 = 1000.0;
pub const PHONE_AREA_MAX: f64 = 8000.0;
pub const PHONE_ASPECT_MIN: f64 = 0.4;
pub const PHONE_ASPECT_MAX: f64 = 0.8;
pub const PHONE_CONFIDENCE: f64 = 0.75;

/// Talking detection
pub const MOUTH_MOVEMENT_THRESHOLD: f64 = 0.01;
pub const TALKING_CONFIDENCE_SCALE: f64 = 10.0;
pub const MOUTH_BOX_PADDING: i32 = 30;

/// Minimum seconds between two accepted detections of one category
pub const DEFAULT_COOLDOWN_SECS: f64 = 2.0;

/// Artificial pacing of the capture loop
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 100;

/// Requested capture resolution
pub const DEFAULT_CAPTURE_WIDTH: i32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: i32 = 480;

/// Number of log entries returned to the live view
pub const RECENT_ALERTS: usize = 10;

/// Event rows per report page
pub const DEFAULT_ROWS_PER_PAGE: usize = 40;

/// Minimum landmark model presence score
pub const DEFAULT_MIN_PRESENCE: f32 = 0.7;
