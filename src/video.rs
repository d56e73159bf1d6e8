//! Video sources feeding the capture loop.

use crate::Result;

/// How a source behaves once it runs out of frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Camera: a failed read ends the session loop
    Live,
    /// Recorded file: end of stream rewinds to the first frame
    File,
}

/// Camera index or video file path, as chosen on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Camera(i32),
    File(std::path::PathBuf),
}

/// Producer of frames for the monitor loop
pub trait VideoSource<F>: Send {
    fn kind(&self) -> SourceKind;

    /// Next frame, or `None` at end of stream / on a failed read
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails outright.
    fn next_frame(&mut self) -> Result<Option<F>>;

    /// Seek back to the first frame
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot seek.
    fn rewind(&mut self) -> Result<()>;
}

/// In-memory frame list, used for replays and tests
#[derive(Debug, Clone)]
pub struct FrameSequence<F> {
    frames: Vec<F>,
    cursor: usize,
    kind: SourceKind,
}

impl<F: Clone> FrameSequence<F> {
    #[must_use]
    pub fn new(frames: Vec<F>, kind: SourceKind) -> Self {
        Self { frames, cursor: 0, kind }
    }
}

impl<F: Clone + Send> VideoSource<F> for FrameSequence<F> {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn next_frame(&mut self) -> Result<Option<F>> {
        let frame = self.frames.get(self.cursor).cloned();
        if frame.is_some() {
            self.cursor += 1;
        }
        Ok(frame)
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }
}

#[cfg(feature = "opencv")]
pub use capture::CaptureSource;

#[cfg(feature = "opencv")]
mod capture {
    use super::{SourceKind, SourceSpec, VideoSource};
    use crate::{config::CaptureConfig, Error, Result};
    use log::info;
    use opencv::{
        core::Mat,
        prelude::*,
        videoio::{self, VideoCapture, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH, CAP_PROP_POS_FRAMES},
    };

    /// `OpenCV` camera or file capture
    pub struct CaptureSource {
        capture: VideoCapture,
        kind: SourceKind,
    }

    impl CaptureSource {
        /// Open a camera or video file at the configured resolution
        ///
        /// # Errors
        ///
        /// Returns an error if the device or file cannot be opened.
        pub fn open(spec: &SourceSpec, config: &CaptureConfig) -> Result<Self> {
            let (mut capture, kind) = match spec {
                SourceSpec::Camera(index) => {
                    info!("Opening camera {index}");
                    (VideoCapture::new(*index, videoio::CAP_ANY)?, SourceKind::Live)
                }
                SourceSpec::File(path) => {
                    info!("Opening video file: {}", path.display());
                    let path = path
                        .to_str()
                        .ok_or_else(|| Error::VideoSource(format!("non UTF-8 path: {}", path.display())))?;
                    (VideoCapture::from_file(path, videoio::CAP_ANY)?, SourceKind::File)
                }
            };

            if !capture.is_opened()? {
                return Err(Error::VideoSource(format!("could not open {spec:?}")));
            }

            capture.set(CAP_PROP_FRAME_WIDTH, f64::from(config.width))?;
            capture.set(CAP_PROP_FRAME_HEIGHT, f64::from(config.height))?;

            Ok(Self { capture, kind })
        }
    }

    impl VideoSource<Mat> for CaptureSource {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        fn next_frame(&mut self) -> Result<Option<Mat>> {
            let mut frame = Mat::default();
            if !self.capture.read(&mut frame)? || frame.empty() {
                return Ok(None);
            }
            Ok(Some(frame))
        }

        fn rewind(&mut self) -> Result<()> {
            self.capture.set(CAP_PROP_POS_FRAMES, 0.0)?;
            Ok(())
        }
    }
}
