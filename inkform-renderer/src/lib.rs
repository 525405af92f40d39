//! # Inkform Renderer
//!
//! Pixel work for Inkform: a CPU raster [`DrawingSurface`](inkform_core::DrawingSurface)
//! for signatures and adaptive JPEG compression for photo attachments.
//!
//! ## Pipelines
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Signature                                   │
//! │   input ─► SignatureCapture ─► RasterSurface│
//! │                       └──► PNG data URL     │
//! ├─────────────────────────────────────────────┤
//! │ Photo                                       │
//! │   file ─► decode ─► resize ─► JPEG q-search │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod compress;
pub mod error;
pub mod surface;

pub use codec::ImageFormat;
pub use compress::{
    target_dimensions, CompressedImage, CompressionOptions, ImageCompressor, Preset,
    QualitySearch, SourceFile,
};
pub use error::{RenderError, RenderResult};
pub use surface::RasterSurface;

use inkform_core::{SignatureCapture, SignatureConfig, SurfaceRect};

/// Create a signature capture already bound to a raster surface at `rect`.
///
/// # Errors
///
/// Returns an error if the surface cannot be allocated.
pub fn raster_signature(
    config: SignatureConfig,
    rect: SurfaceRect,
    initial_value: Option<&str>,
) -> RenderResult<SignatureCapture<RasterSurface>> {
    let surface = RasterSurface::new(rect)?;
    let mut capture = SignatureCapture::new(config);
    capture.initialize(surface, initial_value);
    Ok(capture)
}
