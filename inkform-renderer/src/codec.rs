//! Image decoding and data URI helpers.
//!
//! Decodes images from raw bytes and from base64 or percent-encoded data
//! URIs, and builds data URIs from encoded bytes.

use base64::Engine;
use image::DynamicImage;

use crate::error::{RenderError, RenderResult};

/// Source encoding reported alongside a compression result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG.
    Png,
    /// JPEG.
    Jpeg,
    /// WebP.
    WebP,
    /// GIF.
    Gif,
    /// Any other format the decoder accepts.
    Other,
}

impl ImageFormat {
    /// Sniff the container signature of `data`.
    #[must_use]
    pub fn detect(data: &[u8]) -> Self {
        match image::guess_format(data) {
            Ok(image::ImageFormat::Png) => Self::Png,
            Ok(image::ImageFormat::Jpeg) => Self::Jpeg,
            Ok(image::ImageFormat::WebP) => Self::WebP,
            Ok(image::ImageFormat::Gif) => Self::Gif,
            _ => Self::Other,
        }
    }

    /// MIME type for this format.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Other => "application/octet-stream",
        }
    }
}

/// Decode an image from raw bytes.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the bytes are not a supported image.
pub fn decode_image(data: &[u8]) -> RenderResult<(DynamicImage, ImageFormat)> {
    let img = image::load_from_memory(data).map_err(|e| RenderError::Decode(e.to_string()))?;
    Ok((img, ImageFormat::detect(data)))
}

/// Split a data URI into its MIME type and decoded payload.
///
/// Supports formats like: `data:image/png;base64,iVBORw0KGgo...`
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the data URI is malformed.
pub fn parse_data_uri(uri: &str) -> RenderResult<(String, Vec<u8>)> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Decode("Not a data URI".to_string()))?;

    // Find the comma separating metadata from data
    let (metadata, encoded_data) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Decode("Invalid data URI: missing comma".to_string()))?;

    let mime = metadata
        .split(';')
        .next()
        .filter(|m| !m.is_empty())
        .unwrap_or("text/plain")
        .to_string();

    let bytes = if metadata.split(';').any(|part| part == "base64") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded_data.trim())
            .map_err(|e| RenderError::Decode(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(encoded_data)?
    };

    Ok((mime, bytes))
}

/// Decode the image carried by a data URI.
///
/// # Errors
///
/// Returns an error if the data URI is malformed or the image cannot be decoded.
pub fn decode_data_uri(uri: &str) -> RenderResult<(DynamicImage, ImageFormat)> {
    let (_, bytes) = parse_data_uri(uri)?;
    decode_image(&bytes)
}

/// Build a base64 data URI.
#[must_use]
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Percent-decoding for non-base64 data URI payloads.
fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Decode("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}
