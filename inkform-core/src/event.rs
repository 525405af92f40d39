//! Input events for signature drawing.
//!
//! Mouse and touch input both arrive here in client coordinates and are
//! funnelled into the same begin/extend/end stroke sequence.

use serde::{Deserialize, Serialize};

use crate::Point;

/// Phase of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    /// Touch started (finger down).
    Start,
    /// Touch moved (finger dragging).
    Move,
    /// Touch ended (finger up).
    End,
    /// Touch cancelled (e.g., palm rejection).
    Cancel,
}

/// A single touch point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Touch identifier (for multi-touch).
    pub id: u32,
    /// X position in client coordinates.
    pub client_x: f64,
    /// Y position in client coordinates.
    pub client_y: f64,
}

impl TouchPoint {
    /// Create a touch point.
    #[must_use]
    pub const fn new(id: u32, client_x: f64, client_y: f64) -> Self {
        Self {
            id,
            client_x,
            client_y,
        }
    }

    /// Client position as a point.
    #[must_use]
    pub const fn client(&self) -> Point {
        Point::new(self.client_x, self.client_y)
    }
}

/// A touch event with one or more touch points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    /// Phase of this touch event.
    pub phase: TouchPhase,
    /// All current touch points.
    pub touches: Vec<TouchPoint>,
}

impl TouchEvent {
    /// Create a new touch event.
    #[must_use]
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>) -> Self {
        Self { phase, touches }
    }

    /// Get the primary (first) touch point.
    #[must_use]
    pub fn primary_touch(&self) -> Option<&TouchPoint> {
        self.touches.first()
    }
}

/// Phase of a mouse/pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
    /// Pointer left the surface.
    Leave,
}

/// All input events a signature surface reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Mouse event.
    Pointer {
        /// Event phase.
        phase: PointerPhase,
        /// X coordinate in client space.
        client_x: f64,
        /// Y coordinate in client space.
        client_y: f64,
    },

    /// Touch event.
    Touch(TouchEvent),
}

impl InputEvent {
    /// Shorthand for a pointer event.
    #[must_use]
    pub const fn pointer(phase: PointerPhase, client_x: f64, client_y: f64) -> Self {
        Self::Pointer {
            phase,
            client_x,
            client_y,
        }
    }

    /// Shorthand for a single-finger touch event.
    #[must_use]
    pub fn touch(phase: TouchPhase, client_x: f64, client_y: f64) -> Self {
        Self::Touch(TouchEvent::new(
            phase,
            vec![TouchPoint::new(0, client_x, client_y)],
        ))
    }

    /// Parse a recorded event sequence from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a list of events.
    pub fn parse_recording(json: &str) -> crate::CaptureResult<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }
}
