//! Browser canvas drawing surface.

use std::cell::Cell;
use std::rc::Rc;

use inkform_core::{
    BackingSize, CaptureError, CaptureResult, DrawingSurface, Point, StrokeStyle, SurfaceRect,
};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

/// [`DrawingSurface`] over an `HTMLCanvasElement` 2D context.
///
/// Image restores are asynchronous. Each one records the surface generation
/// when it starts and is dropped on load if a stroke has started or drawn,
/// or the surface was cleared or resized, since.
pub struct DomSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    scale: f64,
    generation: Rc<Cell<u64>>,
}

impl DomSurface {
    /// Wrap a canvas element.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::SurfaceUnavailable`] if the canvas has no 2D
    /// context.
    pub fn new(canvas: HtmlCanvasElement) -> CaptureResult<Self> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| CaptureError::SurfaceUnavailable("Failed to get 2D context".into()))?
            .ok_or_else(|| CaptureError::SurfaceUnavailable("2D context not available".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| {
                CaptureError::SurfaceUnavailable("Failed to cast to 2D context".into())
            })?;
        Ok(Self {
            canvas,
            ctx,
            scale: 1.0,
            generation: Rc::new(Cell::new(0)),
        })
    }

    /// The wrapped canvas element.
    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn invalidate_pending(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
    }
}

impl DrawingSurface for DomSurface {
    fn bounding_rect(&self) -> SurfaceRect {
        let rect = self.canvas.get_bounding_client_rect();
        SurfaceRect::new(rect.left(), rect.top(), rect.width(), rect.height())
    }

    fn configure(
        &mut self,
        backing: BackingSize,
        scale: f64,
        style: &StrokeStyle,
    ) -> CaptureResult<()> {
        self.invalidate_pending();
        // Resizing the backing store also resets the context state.
        self.canvas.set_width(backing.width);
        self.canvas.set_height(backing.height);
        self.ctx
            .set_transform(scale, 0.0, 0.0, scale, 0.0, 0.0)
            .map_err(|_| CaptureError::SurfaceUnavailable("Failed to set transform".into()))?;
        self.ctx.set_stroke_style_str(&style.color);
        self.ctx.set_line_width(style.width);
        self.ctx.set_line_cap(style.cap.as_str());
        self.ctx.set_line_join(style.join.as_str());
        self.scale = scale;
        Ok(())
    }

    fn begin_stroke(&mut self) {
        self.invalidate_pending();
    }

    fn stroke_segment(&mut self, from: Point, to: Point) {
        self.invalidate_pending();
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.stroke();
    }

    fn clear(&mut self) {
        self.invalidate_pending();
        self.ctx.clear_rect(
            0.0,
            0.0,
            f64::from(self.canvas.width()) / self.scale,
            f64::from(self.canvas.height()) / self.scale,
        );
    }

    fn paint_encoded(&mut self, encoded: &str, width: f64, height: f64) -> CaptureResult<()> {
        let image = HtmlImageElement::new()
            .map_err(|_| CaptureError::SurfaceUnavailable("Cannot create image element".into()))?;

        let expected = self.generation.get();
        let generation = Rc::clone(&self.generation);
        let ctx = self.ctx.clone();
        let loaded = image.clone();
        let onload = Closure::once_into_js(move || {
            if generation.get() != expected {
                tracing::debug!("Discarding stale signature image");
                return;
            }
            if ctx
                .draw_image_with_html_image_element_and_dw_and_dh(&loaded, 0.0, 0.0, width, height)
                .is_err()
            {
                tracing::warn!("Failed to draw signature image");
            }
        });
        image.set_onload(Some(onload.unchecked_ref()));
        image.set_src(encoded);
        Ok(())
    }

    fn to_data_url(&self) -> CaptureResult<String> {
        self.canvas
            .to_data_url()
            .map_err(|e| CaptureError::Encode(format!("{e:?}")))
    }
}

impl Drop for DomSurface {
    fn drop(&mut self) {
        self.invalidate_pending();
    }
}
