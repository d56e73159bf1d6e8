//! Exam proctoring library for webcam-based malpractice detection.
//!
//! This library watches a video stream for three kinds of suspicious behaviour:
//! - Hand gestures (a pinch/writing grip or a pointing finger) from hand landmarks
//! - Phone-shaped objects found by edge and contour analysis
//! - Talking, measured as mouth landmark movement between frames
//!
//! The pipeline consists of:
//! 1. A [`landmarks::LandmarkProvider`] supplying normalized hand and face landmarks
//! 2. The heuristic [`detectors`] turning landmarks and contours into events
//! 3. A per-category [`cooldown::CooldownGate`] suppressing repeats
//! 4. The [`session::SessionAggregator`] keeping the event log and counters
//! 5. The [`report::Report`] generator summarizing a session
//!
//! [`monitor::Monitor`] owns one session and drives the capture loop.
//!
//! # Examples
//!
//! ## Replaying recorded landmarks
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use exam_proctor::{
//!     clock::ManualClock,
//!     config::Config,
//!     detectors::NoContours,
//!     frame::BlankFrame,
//!     landmarks::{FrameLandmarks, RecordedLandmarks},
//!     monitor::Monitor,
//!     processor::FrameProcessor,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> exam_proctor::Result<()> {
//! let landmarks = RecordedLandmarks::new(vec![FrameLandmarks::default()])?;
//! let processor = FrameProcessor::new(&Config::default(), Box::new(landmarks), Box::new(NoContours));
//! let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()));
//! let monitor = Monitor::new(processor, clock);
//!
//! monitor.start();
//! monitor.process(BlankFrame::new(640, 480))?;
//! monitor.stop();
//!
//! let report = monitor.report()?;
//! assert_eq!(report.stats.total_events, 0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Live camera
//!
//! ```no_run
//! # #[cfg(feature = "onnx")]
//! # fn main() -> exam_proctor::Result<()> {
//! use exam_proctor::{
//!     clock::SystemClock,
//!     config::Config,
//!     detectors::EdgeContourExtractor,
//!     monitor::{Monitor, RunOptions},
//!     onnx::OnnxLandmarkProvider,
//!     processor::FrameProcessor,
//!     video::{CaptureSource, SourceSpec},
//! };
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let processor = FrameProcessor::new(
//!     &config,
//!     Box::new(OnnxLandmarkProvider::new(&config.models)?),
//!     Box::new(EdgeContourExtractor::new(&config.phone)),
//! );
//! let monitor = Monitor::new(processor, Arc::new(SystemClock));
//! let mut source = CaptureSource::open(&SourceSpec::Camera(0), &config.capture)?;
//!
//! monitor.start();
//! let options = RunOptions {
//!     frame_interval: config.capture.frame_interval(),
//!     max_frames: Some(300),
//! };
//! monitor.run(&mut source, &options, |_frame| Ok(()))?;
//! monitor.stop();
//! println!("{}", monitor.alerts().to_json()?);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "onnx"))]
//! # fn main() {}
//! ```

/// Error types and result handling
pub mod error;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

/// Injectable time source
pub mod clock;

/// Landmark types and providers
pub mod landmarks;

/// Detection events and counters
pub mod event;

/// Frame and overlay abstractions
pub mod frame;

/// Hand gesture, phone shape and talking detectors
pub mod detectors;

/// Per-category cooldown
pub mod cooldown;

/// Per-frame detection pipeline
pub mod processor;

/// Session event log
pub mod session;

/// Session lifecycle and capture loop
pub mod monitor;

/// Video sources
pub mod video;

/// Session reports
pub mod report;

/// `ONNX` Runtime landmark models
#[cfg(feature = "onnx")]
pub mod onnx;

/// Coordinate conversion helpers
pub mod utils;

pub use error::{Error, Result};
