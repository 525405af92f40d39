//! CPU raster drawing surface.
//!
//! [`RasterSurface`] implements [`DrawingSurface`] on a tiny-skia pixmap. It
//! models a canvas element: a layout box in client coordinates plus a
//! backing buffer sized in device pixels.

use inkform_core::{
    BackingSize, CaptureError, CaptureResult, DrawingSurface, LineCap, LineJoin, Point,
    StrokeStyle, SurfaceRect,
};
use tiny_skia::{
    Color, FilterQuality, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::codec;
use crate::error::{RenderError, RenderResult};

/// Off-screen drawing surface backed by an RGBA pixmap.
pub struct RasterSurface {
    rect: SurfaceRect,
    pixmap: Pixmap,
    scale: f32,
    style: StrokeStyle,
}

impl RasterSurface {
    /// Create a surface whose layout box is `rect`.
    ///
    /// The backing buffer starts at the CSS size and is replaced on the first
    /// [`DrawingSurface::configure`] call.
    ///
    /// # Errors
    ///
    /// Returns an error if the pixmap cannot be allocated.
    pub fn new(rect: SurfaceRect) -> RenderResult<Self> {
        let initial = BackingSize::for_display(rect.width, rect.height, 1.0);
        let pixmap = allocate(initial).ok_or_else(|| {
            RenderError::Encode(format!(
                "Cannot allocate {}x{} pixmap",
                initial.width, initial.height
            ))
        })?;
        Ok(Self {
            rect,
            pixmap,
            scale: 1.0,
            style: StrokeStyle::default(),
        })
    }

    /// Create a surface at the viewport origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the pixmap cannot be allocated.
    pub fn with_size(width: f64, height: f64) -> RenderResult<Self> {
        Self::new(SurfaceRect::new(0.0, 0.0, width, height))
    }

    /// Move or resize the layout box, as a scroll or window resize would.
    ///
    /// The backing buffer is untouched until the next configure.
    pub fn set_layout(&mut self, rect: SurfaceRect) {
        self.rect = rect;
    }

    /// Current backing buffer size.
    #[must_use]
    pub fn backing_size(&self) -> BackingSize {
        BackingSize {
            width: self.pixmap.width(),
            height: self.pixmap.height(),
        }
    }

    /// Sample one pixel as straight (non-premultiplied) RGBA.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    /// Whether every pixel is fully transparent.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.pixmap.data().chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Raw premultiplied RGBA bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Encode the surface as PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
    }

    fn paint(&self) -> Paint<'static> {
        let [r, g, b, a] = self.style.rgba();
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        paint
    }

    #[allow(clippy::cast_possible_truncation)]
    fn stroke(&self) -> Stroke {
        Stroke {
            width: self.style.width as f32,
            line_cap: match self.style.cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            line_join: match self.style.join {
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
            },
            ..Stroke::default()
        }
    }
}

impl DrawingSurface for RasterSurface {
    fn bounding_rect(&self) -> SurfaceRect {
        self.rect
    }

    #[allow(clippy::cast_possible_truncation)]
    fn configure(
        &mut self,
        backing: BackingSize,
        scale: f64,
        style: &StrokeStyle,
    ) -> CaptureResult<()> {
        self.pixmap = allocate(backing).ok_or_else(|| {
            CaptureError::SurfaceUnavailable(format!(
                "Cannot allocate {}x{} pixmap",
                backing.width, backing.height
            ))
        })?;
        self.scale = scale as f32;
        self.style = style.clone();
        tracing::debug!(
            "Raster surface resized to {}x{} (scale {scale})",
            backing.width,
            backing.height
        );
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn stroke_segment(&mut self, from: Point, to: Point) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.x as f32, from.y as f32);
        pb.line_to(to.x as f32, to.y as f32);
        let Some(path) = pb.finish() else {
            return;
        };

        let paint = self.paint();
        let stroke = self.stroke();
        self.pixmap.stroke_path(
            &path,
            &paint,
            &stroke,
            Transform::from_scale(self.scale, self.scale),
            None,
        );
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn paint_encoded(&mut self, encoded: &str, width: f64, height: f64) -> CaptureResult<()> {
        let (img, _) = codec::decode_data_uri(encoded)?;
        let rgba = img.to_rgba8();
        let (src_w, src_h) = rgba.dimensions();

        let mut data = rgba.into_raw();
        premultiply(&mut data);
        let size = IntSize::from_wh(src_w, src_h)
            .ok_or_else(|| CaptureError::Decode("Image has no pixels".to_string()))?;
        let source = Pixmap::from_vec(data, size)
            .ok_or_else(|| CaptureError::Decode("Invalid pixel buffer".to_string()))?;

        // Fit the image into the CSS box, then map CSS pixels to device pixels.
        let transform = Transform::from_scale(self.scale, self.scale).pre_scale(
            width as f32 / src_w as f32,
            height as f32 / src_h as f32,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
        Ok(())
    }

    fn to_data_url(&self) -> CaptureResult<String> {
        let png = self.encode_png()?;
        Ok(codec::encode_data_uri("image/png", &png))
    }
}

fn allocate(size: BackingSize) -> Option<Pixmap> {
    Pixmap::new(size.width, size.height)
}

#[allow(clippy::cast_possible_truncation)]
fn premultiply(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for channel in &mut px[..3] {
            *channel = ((u16::from(*channel) * a + 127) / 255) as u8;
        }
    }
}
