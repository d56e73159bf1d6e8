//! Session controller and capture loop.
//!
//! A [`Monitor`] owns every piece of per-session state (detector state,
//! cooldowns, event log, counters, timestamps) behind one mutex. Lifecycle
//! calls (`start`, `stop`, `reset`) and frame processing all take that lock,
//! so a reset is never observed half done and nothing is aggregated after
//! `stop` returns. Other threads read through `snapshot`, `alerts` and
//! `report`, which copy data out.

use crate::{
    clock::Clock,
    event::CategoryCounters,
    frame::Canvas,
    processor::{FrameOutcome, FrameProcessor},
    report::Report,
    session::{AlertFeed, LogEntry, SessionAggregator, SessionSnapshot},
    video::{SourceKind, VideoSource},
    Error, Result,
};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Whether a session is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    Idle,
    Active,
}

/// Point-in-time view for status readers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitorSnapshot {
    pub status: MonitorStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub frames_processed: u64,
    #[serde(flatten)]
    pub session: SessionSnapshot,
}

/// Owned copy of a session's log, as handed to the report generator
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub entries: Vec<LogEntry>,
    pub counters: CategoryCounters,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Capture loop options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Pause after each processed frame
    pub frame_interval: Duration,

    /// Stop reading after this many processed frames
    pub max_frames: Option<u64>,
}

/// What a capture loop did before returning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub detections: u64,
    pub rewinds: u64,
}

struct MonitorState<F> {
    status: MonitorStatus,
    processor: FrameProcessor<F>,
    aggregator: SessionAggregator,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

/// Session lifecycle owner
pub struct Monitor<F> {
    state: Mutex<MonitorState<F>>,
    clock: Arc<dyn Clock>,
}

impl<F: Canvas> Monitor<F> {
    /// Create an idle monitor
    #[must_use]
    pub fn new(processor: FrameProcessor<F>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(MonitorState {
                status: MonitorStatus::Idle,
                processor,
                aggregator: SessionAggregator::new(),
                started_at: None,
                ended_at: None,
            }),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState<F>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin a new session with empty state
    pub fn start(&self) {
        let now = self.clock.now();
        let mut state = self.lock();
        state.processor.reset();
        state.aggregator.reset();
        state.started_at = Some(now);
        state.ended_at = None;
        state.status = MonitorStatus::Active;
        info!("Monitoring session started at {now}");
    }

    /// End the running session; returns `false` if none was running
    pub fn stop(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.lock();
        if state.status != MonitorStatus::Active {
            return false;
        }
        state.status = MonitorStatus::Idle;
        state.ended_at = Some(now);
        info!(
            "Monitoring session stopped at {now} with {} events",
            state.aggregator.len()
        );
        true
    }

    /// Stop and discard the session: log, counters, cooldowns, talking state and timestamps
    pub fn reset(&self) {
        let mut state = self.lock();
        state.status = MonitorStatus::Idle;
        state.processor.reset();
        state.aggregator.reset();
        state.started_at = None;
        state.ended_at = None;
        info!("Monitoring session reset");
    }

    #[must_use]
    pub fn status(&self) -> MonitorStatus {
        self.lock().status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status() == MonitorStatus::Active
    }

    /// Process one frame if a session is active, recording accepted detections
    ///
    /// Returns `Ok(None)` without touching the frame when the monitor is idle.
    ///
    /// # Errors
    ///
    /// Returns an error if annotating the frame fails.
    pub fn process(&self, frame: F) -> Result<Option<FrameOutcome<F>>> {
        let now = self.clock.now();
        let mut state = self.lock();
        if state.status != MonitorStatus::Active {
            return Ok(None);
        }

        let outcome = state.processor.process(frame, now)?;
        for event in &outcome.detections {
            state.aggregator.record(event.clone());
        }
        Ok(Some(outcome))
    }

    /// Pull frames from `source` until the session stops
    ///
    /// A live source that fails to deliver a frame ends the session. A file
    /// source rewinds; if it still yields nothing the session ends with an error.
    /// `on_frame` receives each annotated frame.
    ///
    /// # Errors
    ///
    /// Returns source, processing or callback errors. The session is stopped first.
    pub fn run<S, C>(&self, source: &mut S, options: &RunOptions, mut on_frame: C) -> Result<RunSummary>
    where
        S: VideoSource<F> + ?Sized,
        C: FnMut(&F) -> Result<()>,
    {
        let mut summary = RunSummary::default();
        let mut just_rewound = false;

        let result = loop {
            if !self.is_active() {
                break Ok(());
            }
            if options.max_frames.is_some_and(|max| summary.frames >= max) {
                break Ok(());
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => match source.kind() {
                    SourceKind::File if !just_rewound => {
                        debug!("End of video file, rewinding");
                        if let Err(e) = source.rewind() {
                            break Err(e);
                        }
                        just_rewound = true;
                        summary.rewinds += 1;
                        continue;
                    }
                    SourceKind::File => {
                        break Err(Error::VideoSource("video file yields no frames".to_string()));
                    }
                    SourceKind::Live => {
                        warn!("Failed to read frame from camera, ending session");
                        self.stop();
                        break Ok(());
                    }
                },
                Err(e) => break Err(e),
            };
            just_rewound = false;

            let outcome = match self.process(frame) {
                Ok(Some(outcome)) => outcome,
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            };
            summary.frames += 1;
            summary.detections += outcome.detections.len() as u64;

            if let Err(e) = on_frame(&outcome.frame) {
                break Err(e);
            }

            if !options.frame_interval.is_zero() {
                std::thread::sleep(options.frame_interval);
            }
        };

        if let Err(e) = &result {
            warn!("Capture loop failed: {e}");
            self.stop();
        }
        result.map(|()| summary)
    }
}

impl<F> Monitor<F> {
    fn read(&self) -> MutexGuard<'_, MonitorState<F>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Status, timestamps and counters
    #[must_use]
    pub fn snapshot(&self) -> MonitorSnapshot {
        let state = self.read();
        MonitorSnapshot {
            status: state.status,
            started_at: state.started_at,
            ended_at: state.ended_at,
            frames_processed: state.processor.frames_processed(),
            session: state.aggregator.snapshot(),
        }
    }

    /// Most recent alerts for the live view
    #[must_use]
    pub fn alerts(&self) -> AlertFeed {
        self.read().aggregator.alert_feed()
    }

    /// Copy of the full log for reporting
    #[must_use]
    pub fn record(&self) -> SessionRecord {
        let state = self.read();
        SessionRecord {
            entries: state.aggregator.entries().to_vec(),
            counters: *state.aggregator.counters(),
            started_at: state.started_at,
            ended_at: state.ended_at,
        }
    }

    /// Build a report from the current session without holding the lock while rendering
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`] if the session data is inconsistent.
    pub fn report(&self) -> Result<Report> {
        let record = self.record();
        Report::generate(
            &record.entries,
            &record.counters,
            record.started_at,
            record.ended_at,
            self.clock.now(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        config::Config,
        detectors::NoContours,
        event::DetectionCategory,
        frame::BlankFrame,
        landmarks::{FrameLandmarks, Landmark, LandmarkSet, RecordedLandmarks},
        video::FrameSequence,
    };
    use chrono::{TimeDelta, TimeZone};

    fn pinch() -> LandmarkSet {
        let mut points = vec![Landmark::new(0.5, 0.5); 21];
        points[0] = Landmark::new(0.5, 0.9);
        points[4] = Landmark::new(0.40, 0.40);
        points[8] = Landmark::new(0.41, 0.40);
        LandmarkSet::new(points)
    }

    fn monitor(clock: Arc<ManualClock>) -> Monitor<BlankFrame> {
        let landmarks = RecordedLandmarks::new(vec![FrameLandmarks {
            hands: vec![pinch()],
            faces: vec![],
        }])
        .unwrap();
        let processor = FrameProcessor::new(&Config::default(), Box::new(landmarks), Box::new(NoContours));
        Monitor::new(processor, clock)
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()))
    }

    #[test]
    fn test_idle_monitor_ignores_frames() {
        let monitor = monitor(clock());
        assert_eq!(monitor.status(), MonitorStatus::Idle);
        assert!(monitor.process(BlankFrame::new(640, 480)).unwrap().is_none());
        assert_eq!(monitor.snapshot().session.total_events, 0);
    }

    #[test]
    fn test_start_stop_timestamps() {
        let clock = clock();
        let monitor = monitor(clock.clone());
        monitor.start();
        clock.advance(TimeDelta::seconds(90));
        assert!(monitor.stop());
        assert!(!monitor.stop());

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.status, MonitorStatus::Idle);
        assert_eq!(snapshot.ended_at.unwrap() - snapshot.started_at.unwrap(), TimeDelta::seconds(90));
    }

    #[test]
    fn test_no_aggregation_after_stop() {
        let monitor = monitor(clock());
        monitor.start();
        monitor.process(BlankFrame::new(640, 480)).unwrap();
        monitor.stop();
        assert!(monitor.process(BlankFrame::new(640, 480)).unwrap().is_none());
        assert_eq!(monitor.snapshot().session.total_events, 1);
    }

    #[test]
    fn test_live_source_end_stops_session() {
        let clock = clock();
        let monitor = monitor(clock);
        monitor.start();
        let mut source = FrameSequence::new(vec![BlankFrame::new(640, 480); 3], SourceKind::Live);
        let summary = monitor.run(&mut source, &RunOptions::default(), |_| Ok(())).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(monitor.status(), MonitorStatus::Idle);
        assert!(monitor.snapshot().ended_at.is_some());
    }

    #[test]
    fn test_file_source_rewinds() {
        let monitor = monitor(clock());
        monitor.start();
        let mut source = FrameSequence::new(vec![BlankFrame::new(640, 480); 2], SourceKind::File);
        let options = RunOptions {
            max_frames: Some(5),
            ..RunOptions::default()
        };
        let summary = monitor.run(&mut source, &options, |_| Ok(())).unwrap();
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.rewinds, 2);
        assert!(monitor.is_active());
    }

    #[test]
    fn test_empty_file_source_errors() {
        let monitor = monitor(clock());
        monitor.start();
        let mut source = FrameSequence::<BlankFrame>::new(Vec::new(), SourceKind::File);
        let result = monitor.run(&mut source, &RunOptions::default(), |_| Ok(()));
        assert!(matches!(result, Err(Error::VideoSource(_))));
        assert!(!monitor.is_active());
    }

    #[test]
    fn test_callback_can_stop() {
        let monitor = monitor(clock());
        monitor.start();
        let mut source = FrameSequence::new(vec![BlankFrame::new(640, 480); 10], SourceKind::File);
        let summary = monitor
            .run(&mut source, &RunOptions::default(), |_| {
                monitor.stop();
                Ok(())
            })
            .unwrap();
        assert_eq!(summary.frames, 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let monitor = monitor(clock());
        monitor.start();
        monitor.process(BlankFrame::new(640, 480)).unwrap();
        monitor.reset();
        monitor.reset();

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.status, MonitorStatus::Idle);
        assert_eq!(snapshot.session.total_events, 0);
        assert_eq!(snapshot.frames_processed, 0);
        assert!(snapshot.started_at.is_none());

        monitor.start();
        let outcome = monitor.process(BlankFrame::new(640, 480)).unwrap().unwrap();
        assert_eq!(outcome.detections.len(), 1);
        assert_eq!(monitor.alerts().counts.get(DetectionCategory::HandGesture), 1);
    }
}
