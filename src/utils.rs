//! Coordinate conversion helpers shared by the detectors.

use crate::{event::BoundingBox, frame::FrameSize, landmarks::Landmark};

/// Convert a normalized coordinate to a pixel index, truncating toward zero.
///
/// Non-finite inputs map to 0 and results saturate at the `i32` range.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // `as` saturates for out-of-range floats
pub fn to_pixel(normalized: f64, extent: i32) -> i32 {
    let value = normalized * f64::from(extent);
    if value.is_finite() {
        value.trunc() as i32
    } else {
        0
    }
}

/// Axis-aligned pixel bounds of `points`, padded by `padding` and clamped to the frame.
///
/// Returns `None` for an empty point set.
#[must_use]
pub fn padded_pixel_bounds(points: &[Landmark], size: FrameSize, padding: i32) -> Option<BoundingBox> {
    let mut pixels = points
        .iter()
        .map(|p| (to_pixel(p.x, size.width), to_pixel(p.y, size.height)));

    let (first_x, first_y) = pixels.next()?;
    let (mut x_min, mut y_min, mut x_max, mut y_max) = (first_x, first_y, first_x, first_y);
    for (x, y) in pixels {
        x_min = x_min.min(x);
        y_min = y_min.min(y);
        x_max = x_max.max(x);
        y_max = y_max.max(y);
    }

    let clamp_x = |x: i32| x.clamp(0, size.width.max(0));
    let clamp_y = |y: i32| y.clamp(0, size.height.max(0));
    Some(BoundingBox::new(
        clamp_x(x_min.saturating_sub(padding)),
        clamp_y(y_min.saturating_sub(padding)),
        clamp_x(x_max.saturating_add(padding)),
        clamp_y(y_max.saturating_add(padding)),
    ))
}

/// Euclidean distance between two landmarks in normalized space
#[must_use]
pub fn distance(a: &Landmark, b: &Landmark) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}
