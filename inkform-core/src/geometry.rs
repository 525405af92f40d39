//! Coordinates and sizes used by the drawing surface.

use serde::{Deserialize, Serialize};

/// A position in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box of a surface in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceRect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Displayed width in CSS pixels.
    pub width: f64,
    /// Displayed height in CSS pixels.
    pub height: f64,
}

impl SurfaceRect {
    /// Create a rectangle from its origin and size.
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Map a client coordinate into this rectangle's local space.
    #[must_use]
    pub fn to_local(&self, client: Point) -> Point {
        Point::new(client.x - self.left, client.y - self.top)
    }
}

/// Pixel dimensions of a surface's backing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackingSize {
    /// Width in device pixels.
    pub width: u32,
    /// Height in device pixels.
    pub height: u32,
}

impl BackingSize {
    /// Backing resolution for a surface displayed at `css_width` x `css_height`.
    ///
    /// Each axis is `round(css × device_pixel_ratio)`, never less than one pixel.
    #[must_use]
    pub fn for_display(css_width: f64, css_height: f64, device_pixel_ratio: f64) -> Self {
        let ratio = normalize_pixel_ratio(device_pixel_ratio);
        Self {
            width: scale_axis(css_width, ratio),
            height: scale_axis(css_height, ratio),
        }
    }
}

/// Clamp a device pixel ratio to something usable.
///
/// Non-finite, zero and negative ratios fall back to `1.0`.
#[must_use]
pub fn normalize_pixel_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_axis(css: f64, ratio: f64) -> u32 {
    let scaled = (css.max(0.0) * ratio).round();
    if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        (scaled as u32).max(1)
    }
}
