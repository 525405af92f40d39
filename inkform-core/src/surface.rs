//! The drawing surface seam.
//!
//! [`SignatureCapture`](crate::SignatureCapture) drives any type implementing
//! [`DrawingSurface`]: a browser canvas, a CPU raster, or a recording fake in
//! tests.

use serde::{Deserialize, Serialize};

use crate::{BackingSize, CaptureResult, Point, SurfaceRect};

/// How stroke ends are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    /// Flat end at the endpoint.
    Butt,
    /// Semicircular end.
    #[default]
    Round,
    /// Square end extending past the endpoint.
    Square,
}

/// How stroke corners are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    /// Sharp corner.
    Miter,
    /// Rounded corner.
    #[default]
    Round,
    /// Cut-off corner.
    Bevel,
}

impl LineCap {
    /// Canvas 2D keyword for this cap.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Butt => "butt",
            Self::Round => "round",
            Self::Square => "square",
        }
    }
}

impl LineJoin {
    /// Canvas 2D keyword for this join.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Miter => "miter",
            Self::Round => "round",
            Self::Bevel => "bevel",
        }
    }
}

/// Pen settings applied to every segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// Stroke color as a CSS hex string.
    pub color: String,
    /// Line width in CSS pixels.
    pub width: f64,
    /// Cap style.
    pub cap: LineCap,
    /// Join style.
    pub join: LineJoin,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            width: 2.0,
            cap: LineCap::Round,
            join: LineJoin::Round,
        }
    }
}

impl StrokeStyle {
    /// Parse the color into RGBA bytes.
    ///
    /// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa`; anything else yields opaque black.
    #[must_use]
    pub fn rgba(&self) -> [u8; 4] {
        parse_hex_color(&self.color).unwrap_or([0, 0, 0, 255])
    }
}

fn parse_hex_color(color: &str) -> Option<[u8; 4]> {
    let hex = color.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut out = [0, 0, 0, 255];
            for (slot, c) in out.iter_mut().zip(hex.chars()) {
                let v = c.to_digit(16)?;
                #[allow(clippy::cast_possible_truncation)]
                let v = (v * 17) as u8;
                *slot = v;
            }
            Some(out)
        }
        6 => Some([
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
            255,
        ]),
        8 => Some([
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
            channel(hex.get(6..8)?)?,
        ]),
        _ => None,
    }
}

/// A 2D drawing target with a separate backing resolution and display size.
///
/// Drawing coordinates are CSS pixels; implementations apply the scale passed
/// to [`DrawingSurface::configure`] so strokes land on the backing buffer at
/// device resolution.
pub trait DrawingSurface {
    /// The surface's current bounding box in client coordinates.
    ///
    /// Called on every input event, never cached by the caller.
    fn bounding_rect(&self) -> SurfaceRect;

    /// Reallocate the backing buffer and reset drawing state.
    ///
    /// Contents are cleared, the coordinate scale is set to `scale`, and the
    /// stroke style is applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the drawing context is unavailable.
    fn configure(
        &mut self,
        backing: BackingSize,
        scale: f64,
        style: &StrokeStyle,
    ) -> CaptureResult<()>;

    /// A stroke is starting; nothing may be painted over it until it ends.
    fn begin_stroke(&mut self) {}

    /// Stroke one straight segment immediately.
    fn stroke_segment(&mut self, from: Point, to: Point);

    /// Erase the entire surface to blank.
    fn clear(&mut self);

    /// Draw an encoded image scaled into a `width` x `height` CSS-pixel box
    /// at the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be decoded or drawn.
    fn paint_encoded(&mut self, encoded: &str, width: f64, height: f64) -> CaptureResult<()>;

    /// Encode the whole surface as a PNG data URL.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    fn to_data_url(&self) -> CaptureResult<String>;
}
