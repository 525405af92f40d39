//! # Inkform Core
//!
//! Signature capture for field record forms, independent of any particular
//! drawing backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               inkform-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Input Events    │  SignatureCapture        │
//! │  - Mouse         │  - Idle/Drawing states   │
//! │  - Touch         │  - Echo suppression      │
//! ├─────────────────────────────────────────────┤
//! │  Geometry        │  DrawingSurface trait    │
//! │  - Backing size  │  - Browser canvas        │
//! │  - Client → CSS  │  - CPU raster            │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod event;
pub mod geometry;
pub mod signature;
pub mod surface;

pub use error::{CaptureError, CaptureResult};
pub use event::{InputEvent, PointerPhase, TouchEvent, TouchPhase, TouchPoint};
pub use geometry::{BackingSize, Point, SurfaceRect};
pub use signature::{SignatureCapture, SignatureConfig, StrokeState};
pub use surface::{DrawingSurface, LineCap, LineJoin, StrokeStyle};

/// Inkform core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
