//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rasterizing or compressing images.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Source bytes could not be read as an image.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// A raster buffer could not be created or encoded.
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// Compression options are out of range.
    #[error("Invalid compression options: {0}")]
    InvalidOptions(String),

    /// Reading the source file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The background compression task did not complete.
    #[error("Compression task failed: {0}")]
    Task(String),
}

impl From<RenderError> for inkform_core::CaptureError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Decode(msg) => Self::Decode(msg),
            other => Self::Encode(other.to_string()),
        }
    }
}
