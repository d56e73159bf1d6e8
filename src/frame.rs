//! Frame abstraction used by the pipeline.
//!
//! With the `opencv` feature `Mat` is the production frame type.
//! [`BlankFrame`] has dimensions but no pixels and records the overlays drawn
//! on it, which is what headless replays and tests use.

use crate::{event::DetectionEvent, Result};

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: i32,
    pub height: i32,
}

impl FrameSize {
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Anything with pixel dimensions
pub trait Frame {
    fn frame_size(&self) -> FrameSize;
}

/// A frame that detections can be drawn onto
pub trait Canvas: Frame {
    /// Draw the bounding box and label of an accepted detection
    ///
    /// # Errors
    ///
    /// Returns an error if the drawing backend fails.
    fn draw_detection(&mut self, event: &DetectionEvent) -> Result<()>;

    /// Draw the per-frame status caption in the top-left corner
    ///
    /// # Errors
    ///
    /// Returns an error if the drawing backend fails.
    fn draw_caption(&mut self, text: &str) -> Result<()>;
}

/// One overlay drawn on a [`BlankFrame`]
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Detection(DetectionEvent),
    Caption(String),
}

/// Pixel-less frame that remembers what was drawn on it
#[derive(Debug, Clone, PartialEq)]
pub struct BlankFrame {
    size: FrameSize,
    overlays: Vec<Overlay>,
}

impl BlankFrame {
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            size: FrameSize::new(width, height),
            overlays: Vec::new(),
        }
    }

    #[must_use]
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// Detections drawn so far, in draw order
    pub fn drawn_detections(&self) -> impl Iterator<Item = &DetectionEvent> {
        self.overlays.iter().filter_map(|o| match o {
            Overlay::Detection(event) => Some(event),
            Overlay::Caption(_) => None,
        })
    }
}

impl Frame for BlankFrame {
    fn frame_size(&self) -> FrameSize {
        self.size
    }
}

impl Canvas for BlankFrame {
    fn draw_detection(&mut self, event: &DetectionEvent) -> Result<()> {
        self.overlays.push(Overlay::Detection(event.clone()));
        Ok(())
    }

    fn draw_caption(&mut self, text: &str) -> Result<()> {
        self.overlays.push(Overlay::Caption(text.to_string()));
        Ok(())
    }
}

#[cfg(feature = "opencv")]
mod mat {
    use super::{Canvas, Frame, FrameSize};
    use crate::{event::DetectionEvent, Result};
    use opencv::{
        core::{Mat, Point, Rect, Scalar},
        imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
        prelude::*,
    };

    impl Frame for Mat {
        fn frame_size(&self) -> FrameSize {
            FrameSize::new(self.cols(), self.rows())
        }
    }

    impl Canvas for Mat {
        fn draw_detection(&mut self, event: &DetectionEvent) -> Result<()> {
            let bbox = event.bbox();
            let (b, g, r) = event.category().overlay_color();
            let color = Scalar::new(b, g, r, 0.0);

            imgproc::rectangle(
                self,
                Rect::new(bbox.x_min, bbox.y_min, bbox.width(), bbox.height()),
                color,
                2,
                LINE_8,
                0,
            )?;
            imgproc::put_text(
                self,
                &event.overlay_label(),
                Point::new(bbox.x_min, bbox.y_min - 10),
                FONT_HERSHEY_SIMPLEX,
                0.7,
                color,
                2,
                LINE_8,
                false,
            )?;
            Ok(())
        }

        fn draw_caption(&mut self, text: &str) -> Result<()> {
            imgproc::put_text(
                self,
                text,
                Point::new(10, 30),
                FONT_HERSHEY_SIMPLEX,
                0.7,
                Scalar::new(255.0, 255.0, 255.0, 0.0),
                2,
                LINE_8,
                false,
            )?;
            Ok(())
        }
    }
}
