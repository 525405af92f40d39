//! Adaptive photo compression.
//!
//! Photos attached to record forms are downscaled to a bounded width and then
//! re-encoded as JPEG at decreasing quality until they fit a byte budget or
//! reach a quality floor.
//!
//! ```text
//! decode ──► resize (never upscale) ──► encode @ q ──► fits? ──► done
//!                                          ▲            │ no
//!                                          └─ q - 0.1 ◄─┘ (clamped to floor; stop after floor)
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::SystemTime;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, RgbImage};
use serde::{Deserialize, Serialize};

use crate::codec::{self, ImageFormat};
use crate::error::{RenderError, RenderResult};

/// Quality decrement between attempts.
pub const QUALITY_STEP: f64 = 0.1;

/// Tolerance for comparing stepped quality values against the floor.
const QUALITY_EPSILON: f64 = 1e-6;

/// MIME type of every compressed output.
pub const OUTPUT_MIME: &str = "image/jpeg";

/// Tuning for one compression call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionOptions {
    /// Maximum output width in pixels. Height follows the aspect ratio.
    pub max_width_px: u32,
    /// First JPEG quality tried, in `(0, 1]`.
    pub start_quality: f64,
    /// Byte budget in kilobytes (1 KB = 1024 bytes).
    pub max_size_kb: f64,
    /// Lowest quality the search may reach.
    pub quality_floor: f64,
}

impl CompressionOptions {
    /// Small inline photos embedded in generated documents.
    #[must_use]
    pub const fn aggressive() -> Self {
        Self {
            max_width_px: 400,
            start_quality: 0.5,
            max_size_kb: 50.0,
            quality_floor: 0.1,
        }
    }

    /// Full-size photo attachments.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            max_width_px: 1920,
            start_quality: 0.85,
            max_size_kb: 300.0,
            quality_floor: 0.1,
        }
    }

    /// Check that the options describe a terminating search.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidOptions`] describing the first bad field.
    pub fn validate(&self) -> RenderResult<()> {
        if self.max_width_px == 0 {
            return Err(RenderError::InvalidOptions(
                "max_width_px must be positive".to_string(),
            ));
        }
        if !self.max_size_kb.is_finite() || self.max_size_kb <= 0.0 {
            return Err(RenderError::InvalidOptions(format!(
                "max_size_kb must be a positive number, got {}",
                self.max_size_kb
            )));
        }
        if !(self.start_quality > 0.0 && self.start_quality <= 1.0) {
            return Err(RenderError::InvalidOptions(format!(
                "start_quality must be in (0, 1], got {}",
                self.start_quality
            )));
        }
        if !(self.quality_floor > 0.0 && self.quality_floor <= self.start_quality) {
            return Err(RenderError::InvalidOptions(format!(
                "quality_floor must be in (0, {}], got {}",
                self.start_quality, self.quality_floor
            )));
        }
        Ok(())
    }
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Named option sets used by the forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// 400 px, quality 0.5, 50 KB.
    Aggressive,
    /// 1920 px, quality 0.85, 300 KB.
    #[default]
    Standard,
}

impl Preset {
    /// The options for this preset.
    #[must_use]
    pub const fn options(self) -> CompressionOptions {
        match self {
            Self::Aggressive => CompressionOptions::aggressive(),
            Self::Standard => CompressionOptions::standard(),
        }
    }
}

impl FromStr for Preset {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aggressive" => Ok(Self::Aggressive),
            "standard" => Ok(Self::Standard),
            other => Err(RenderError::InvalidOptions(format!(
                "unknown preset '{other}' (expected aggressive or standard)"
            ))),
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aggressive => write!(f, "aggressive"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

/// The sequence of qualities tried by one compression call.
///
/// Yields `start, start - 0.1, start - 0.2, …` and always ends at exactly
/// `floor`. When the span is not a multiple of the step, the last decrement
/// is shortened to land on the floor. Each value is computed from its
/// index, and a value within rounding distance of the floor is reported as
/// the floor itself.
#[derive(Debug, Clone)]
pub struct QualitySearch {
    start: f64,
    floor: f64,
    next_step: u32,
    steps: u32,
}

impl QualitySearch {
    /// Create a search from `start` down to `floor`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(start: f64, floor: f64) -> Self {
        let span = ((start - floor) / QUALITY_STEP - QUALITY_EPSILON).ceil();
        let steps = if span.is_finite() && span > 0.0 {
            span.min(f64::from(u32::MAX - 1)) as u32 + 1
        } else {
            1
        };
        Self {
            start,
            floor,
            next_step: 0,
            steps,
        }
    }

    /// Maximum number of attempts: `ceil((start - floor) / 0.1) + 1`.
    #[must_use]
    pub fn attempt_bound(&self) -> u32 {
        self.steps
    }
}

impl Iterator for QualitySearch {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next_step >= self.steps {
            return None;
        }
        let quality = self.start - f64::from(self.next_step) * QUALITY_STEP;
        self.next_step += 1;
        if quality - self.floor < QUALITY_EPSILON {
            Some(self.floor)
        } else {
            Some(quality)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.steps - self.next_step) as usize;
        (remaining, Some(remaining))
    }
}

/// Output dimensions for a `width` x `height` source under `max_width`.
///
/// Never upscales. Wider sources are scaled so the width is exactly
/// `max_width` and the height is `round(height * max_width / width)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scaled = (f64::from(height) * f64::from(max_width) / f64::from(width)).round();
    (max_width, (scaled as u32).max(1))
}

/// A user-selected file awaiting compression.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Original file name, carried through to the output.
    pub name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Wrap in-memory file contents.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if the file cannot be read.
    pub async fn read(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }
}

/// The result of a compression call.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    /// Name of the source file.
    pub file_name: String,
    /// Always [`OUTPUT_MIME`].
    pub mime_type: &'static str,
    /// Encoded JPEG bytes.
    pub bytes: Vec<u8>,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Quality of the returned encoding.
    pub quality: f64,
    /// Number of encodings performed.
    pub attempts: u32,
    /// Detected format of the source.
    pub source_format: ImageFormat,
    /// When this output was produced.
    pub last_modified: SystemTime,
}

impl CompressedImage {
    /// Size in kilobytes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }

    /// The output as a data URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        codec::encode_data_uri(self.mime_type, &self.bytes)
    }
}

/// Compresses photos to fit a byte budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompressor {
    options: CompressionOptions,
}

impl ImageCompressor {
    /// Create a compressor with explicit options.
    #[must_use]
    pub const fn new(options: CompressionOptions) -> Self {
        Self { options }
    }

    /// Create a compressor from a named preset.
    #[must_use]
    pub const fn with_preset(preset: Preset) -> Self {
        Self::new(preset.options())
    }

    /// The options in use.
    #[must_use]
    pub const fn options(&self) -> &CompressionOptions {
        &self.options
    }

    /// Compress on a blocking worker thread.
    ///
    /// Independent calls share no state and may run concurrently.
    ///
    /// # Errors
    ///
    /// See [`ImageCompressor::compress_blocking`]; also returns
    /// [`RenderError::Task`] if the worker is cancelled or panics.
    pub async fn compress(&self, source: SourceFile) -> RenderResult<CompressedImage> {
        let compressor = *self;
        tokio::task::spawn_blocking(move || compressor.compress_blocking(&source))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))?
    }

    /// Compress several files concurrently, returning results in input order.
    pub async fn compress_all(
        &self,
        sources: Vec<SourceFile>,
    ) -> Vec<RenderResult<CompressedImage>> {
        let handles: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let compressor = *self;
                tokio::task::spawn_blocking(move || compressor.compress_blocking(&source))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(
                handle
                    .await
                    .map_err(|e| RenderError::Task(e.to_string()))
                    .and_then(|r| r),
            );
        }
        results
    }

    /// Decode, downscale and re-encode `source` until it fits the budget.
    ///
    /// If the budget cannot be met, the encoding at the lowest quality the
    /// search reaches is returned as-is.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidOptions`] for bad options,
    /// [`RenderError::Decode`] if the source is not an image, and
    /// [`RenderError::Encode`] if JPEG encoding fails.
    pub fn compress_blocking(&self, source: &SourceFile) -> RenderResult<CompressedImage> {
        let options = &self.options;
        options.validate()?;

        let (img, source_format) = codec::decode_image(&source.bytes)?;
        let (src_w, src_h) = (img.width(), img.height());
        let (width, height) = target_dimensions(src_w, src_h, options.max_width_px);

        let resized = if (width, height) == (src_w, src_h) {
            img
        } else {
            tracing::debug!(
                file = %source.name,
                "Resizing {src_w}x{src_h} -> {width}x{height}"
            );
            img.resize_exact(width, height, FilterType::Triangle)
        };
        let rgb = flatten_onto_white(&resized);

        let mut best: Option<(Vec<u8>, f64, u32)> = None;
        for (index, quality) in QualitySearch::new(options.start_quality, options.quality_floor)
            .enumerate()
        {
            let bytes = encode_jpeg(&rgb, quality)?;
            #[allow(clippy::cast_precision_loss)]
            let size_kb = bytes.len() as f64 / 1024.0;
            #[allow(clippy::cast_possible_truncation)]
            let attempt = index as u32 + 1;
            tracing::debug!(
                file = %source.name,
                attempt,
                quality,
                size_kb,
                "JPEG encode attempt"
            );

            let fits = size_kb <= options.max_size_kb;
            best = Some((bytes, quality, attempt));
            if fits {
                break;
            }
        }

        let (bytes, quality, attempts) =
            best.ok_or_else(|| RenderError::Encode("No encode attempts were made".to_string()))?;

        #[allow(clippy::cast_precision_loss)]
        let final_kb = bytes.len() as f64 / 1024.0;
        if final_kb > options.max_size_kb {
            tracing::warn!(
                file = %source.name,
                "Budget of {} KB not reached at quality floor; returning {final_kb:.1} KB",
                options.max_size_kb
            );
        } else {
            tracing::debug!(
                file = %source.name,
                "Compressed to {final_kb:.1} KB at quality {quality:.2} after {attempts} attempt(s)"
            );
        }

        Ok(CompressedImage {
            file_name: source.name.clone(),
            mime_type: OUTPUT_MIME,
            bytes,
            width,
            height,
            quality,
            attempts,
            source_format,
            last_modified: SystemTime::now(),
        })
    }
}

/// Map a `(0, 1]` quality onto the encoder's `1..=100` scale.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn jpeg_quality(quality: f64) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn encode_jpeg(rgb: &RgbImage, quality: f64) -> RenderResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality));
    encoder
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| RenderError::Encode(format!("JPEG encoding failed: {e}")))?;
    Ok(bytes)
}

/// Drop the alpha channel, compositing translucent pixels over white.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in rgb.pixels_mut().zip(rgba.pixels()) {
        let alpha = f32::from(src[3]) / 255.0;
        let inv = 255.0 * (1.0 - alpha);
        for c in 0..3 {
            dst[c] = f32::from(src[c]).mul_add(alpha, inv).round() as u8;
        }
    }
    rgb
}
