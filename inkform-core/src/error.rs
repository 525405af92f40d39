//! Error types for signature capture.

use thiserror::Error;

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors a drawing surface can report back to the capture state machine.
///
/// None of these reach the user directly: [`crate::SignatureCapture`] logs
/// them and carries on, since a missing or half-mounted surface is a
/// lifecycle race rather than a user-facing failure.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The surface or its drawing context is not available.
    #[error("Drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// An encoded image could not be decoded for a repaint.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The surface contents could not be encoded.
    #[error("Failed to encode surface: {0}")]
    Encode(String),

    /// Recorded input could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
