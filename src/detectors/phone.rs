//! Coarse "mobile phone" detector.
//!
//! Any external edge contour whose area and bounding-box aspect ratio fall in
//! a phone-like window is reported. There is no object-class verification,
//! so other rectangular objects of similar size trigger it as well.

use crate::{
    config::PhoneConfig,
    event::{BoundingBox, DetectionCategory, DetectionEvent},
    Result,
};
use chrono::{DateTime, Utc};

/// External contour summarised by its area and bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contour {
    pub area: f64,
    pub rect: BoundingBox,
}

/// Extracts external contours from a frame, in the backend's natural order
pub trait ContourExtractor<F>: Send {
    /// # Errors
    ///
    /// Returns an error if edge or contour extraction fails.
    fn external_contours(&mut self, frame: &F) -> Result<Vec<Contour>>;
}

/// Extractor for frames without pixel data
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContours;

impl<F> ContourExtractor<F> for NoContours {
    fn external_contours(&mut self, _frame: &F) -> Result<Vec<Contour>> {
        Ok(Vec::new())
    }
}

/// Size and aspect-ratio window filter
#[derive(Debug, Clone, Default)]
pub struct PhoneShapeDetector {
    config: PhoneConfig,
}

impl PhoneShapeDetector {
    #[must_use]
    pub const fn new(config: PhoneConfig) -> Self {
        Self { config }
    }

    /// Whether a contour falls inside both open windows
    #[must_use]
    pub fn matches(&self, contour: &Contour) -> bool {
        if !(contour.area > self.config.min_area && contour.area < self.config.max_area) {
            return false;
        }
        let height = contour.rect.height();
        if height <= 0 {
            return false;
        }
        let aspect = f64::from(contour.rect.width()) / f64::from(height);
        aspect > self.config.min_aspect && aspect < self.config.max_aspect
    }

    /// First matching contour wins; later contours are not examined
    #[must_use]
    pub fn detect(&self, contours: &[Contour], now: DateTime<Utc>) -> Option<DetectionEvent> {
        let found = contours.iter().find(|c| self.matches(c))?;
        log::debug!("Phone-shaped contour: area {:.0} at {:?}", found.area, found.rect);
        Some(DetectionEvent::new(
            DetectionCategory::MobilePhone,
            self.config.confidence,
            found.rect,
            now,
        ))
    }
}

#[cfg(feature = "opencv")]
pub use edge::EdgeContourExtractor;

#[cfg(feature = "opencv")]
mod edge {
    use super::{Contour, ContourExtractor};
    use crate::{config::PhoneConfig, event::BoundingBox, Result};
    use opencv::{
        core::{Mat, Point, Vector},
        imgproc,
        prelude::*,
    };

    /// Grayscale → Canny → external contours
    #[derive(Debug, Clone)]
    pub struct EdgeContourExtractor {
        low_threshold: f64,
        high_threshold: f64,
    }

    impl EdgeContourExtractor {
        #[must_use]
        pub fn new(config: &PhoneConfig) -> Self {
            Self {
                low_threshold: config.canny_low,
                high_threshold: config.canny_high,
            }
        }
    }

    impl ContourExtractor<Mat> for EdgeContourExtractor {
        fn external_contours(&mut self, frame: &Mat) -> Result<Vec<Contour>> {
            if frame.empty() {
                return Ok(Vec::new());
            }

            let gray = if frame.channels() == 1 {
                frame.try_clone()?
            } else {
                let mut gray = Mat::default();
                imgproc::cvt_color_def(frame, &mut gray, imgproc::COLOR_BGR2GRAY)?;
                gray
            };

            let mut edges = Mat::default();
            imgproc::canny_def(&gray, &mut edges, self.low_threshold, self.high_threshold)?;

            let mut contours = Vector::<Vector<Point>>::new();
            imgproc::find_contours_def(
                &edges,
                &mut contours,
                imgproc::RETR_EXTERNAL,
                imgproc::CHAIN_APPROX_SIMPLE,
            )?;

            let mut result = Vec::with_capacity(contours.len());
            for contour in contours.iter() {
                let area = imgproc::contour_area_def(&contour)?;
                let rect = imgproc::bounding_rect(&contour)?;
                result.push(Contour {
                    area,
                    rect: BoundingBox::from_rect(rect.x, rect.y, rect.width, rect.height),
                });
            }
            Ok(result)
        }
    }
}
