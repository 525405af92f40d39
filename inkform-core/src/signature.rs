//! Freehand signature capture.
//!
//! [`SignatureCapture`] owns a [`DrawingSurface`] for its lifetime and turns
//! pointer and touch input into immediately-drawn stroke segments. Finished
//! strokes are published as PNG data URLs through the change callback; the
//! same encoding can be fed back in through [`SignatureCapture::set_value`]
//! to restore a previous signature.

use serde::{Deserialize, Serialize};

use crate::geometry::normalize_pixel_ratio;
use crate::{
    BackingSize, DrawingSurface, InputEvent, Point, PointerPhase, StrokeStyle, TouchPhase,
};

/// Callback invoked with the encoded image after each completed stroke.
pub type ChangeCallback = Box<dyn Fn(&str)>;

/// Callback invoked when the user clears the signature.
pub type ClearCallback = Box<dyn Fn()>;

/// Configuration for a signature field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureConfig {
    /// Display label. Only used in log output.
    pub label: String,
    /// Pen settings.
    pub stroke: StrokeStyle,
    /// Ratio between device pixels and CSS pixels for the target display.
    pub device_pixel_ratio: f64,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            label: "Signature".to_string(),
            stroke: StrokeStyle::default(),
            device_pixel_ratio: 1.0,
        }
    }
}

impl SignatureConfig {
    /// Set the device pixel ratio.
    #[must_use]
    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Stroke state machine: `Idle -> Drawing -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StrokeState {
    /// No stroke in progress.
    #[default]
    Idle,
    /// A stroke is in progress.
    Drawing {
        /// Surface-relative position of the previous input sample.
        last_point: Point,
    },
}

/// Signature capture bound to a drawing surface.
///
/// Every operation is a silent no-op while no surface is bound.
pub struct SignatureCapture<S> {
    config: SignatureConfig,
    surface: Option<S>,
    stroke: StrokeState,
    /// Last known encoded image, either supplied from outside or emitted by
    /// the latest stroke. An echo of an emitted value compares equal and is
    /// ignored.
    value: Option<String>,
    on_change: Option<ChangeCallback>,
    on_clear: Option<ClearCallback>,
}

impl<S: DrawingSurface> SignatureCapture<S> {
    /// Create an unbound capture with the given configuration.
    #[must_use]
    pub fn new(config: SignatureConfig) -> Self {
        Self {
            config,
            surface: None,
            stroke: StrokeState::Idle,
            value: None,
            on_change: None,
            on_clear: None,
        }
    }

    /// Set the callback fired after each completed stroke.
    pub fn set_on_change<F>(&mut self, callback: F)
    where
        F: Fn(&str) + 'static,
    {
        self.on_change = Some(Box::new(callback));
    }

    /// Set the callback fired when the signature is cleared.
    pub fn set_on_clear<F>(&mut self, callback: F)
    where
        F: Fn() + 'static,
    {
        self.on_clear = Some(Box::new(callback));
    }

    /// Bind to a surface and paint the initial value, if any.
    ///
    /// Runs at most once per bound surface: returns `false` (dropping
    /// `surface`) if a surface is already bound.
    pub fn initialize(&mut self, surface: S, initial_value: Option<&str>) -> bool {
        if self.surface.is_some() {
            tracing::debug!(label = %self.config.label, "Signature surface already initialized");
            return false;
        }

        self.value = non_empty(initial_value).map(str::to_owned);
        self.surface = Some(surface);
        self.stroke = StrokeState::Idle;
        self.setup_surface();
        true
    }

    /// Window resize handler.
    ///
    /// Recomputes the backing resolution and repaints the current value, unless
    /// a stroke is in progress.
    pub fn on_resize(&mut self) {
        if self.is_drawing() {
            tracing::trace!(label = %self.config.label, "Resize ignored mid-stroke");
            return;
        }
        self.setup_surface();
    }

    /// Start a stroke at a client-space position.
    pub fn begin_stroke(&mut self, client: Point) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.begin_stroke();
        let point = surface.bounding_rect().to_local(client);
        self.stroke = StrokeState::Drawing { last_point: point };
    }

    /// Extend the current stroke to a client-space position.
    pub fn extend_stroke(&mut self, client: Point) {
        let StrokeState::Drawing { last_point } = self.stroke else {
            return;
        };
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let point = surface.bounding_rect().to_local(client);
        surface.stroke_segment(last_point, point);
        tracing::trace!(
            "Segment ({}, {}) -> ({}, {})",
            last_point.x,
            last_point.y,
            point.x,
            point.y
        );
        self.stroke = StrokeState::Drawing { last_point: point };
    }

    /// Finish the current stroke and publish the surface as a data URL.
    pub fn end_stroke(&mut self) {
        let was_drawing = self.is_drawing();
        self.stroke = StrokeState::Idle;
        if !was_drawing {
            return;
        }
        let Some(surface) = self.surface.as_ref() else {
            return;
        };

        match surface.to_data_url() {
            Ok(data_url) => {
                tracing::debug!(
                    label = %self.config.label,
                    bytes = data_url.len(),
                    "Signature stroke committed"
                );
                if let Some(ref callback) = self.on_change {
                    callback(&data_url);
                }
                self.value = Some(data_url);
            }
            Err(e) => {
                tracing::warn!(label = %self.config.label, "Failed to encode signature: {e}");
            }
        }
    }

    /// Erase the signature and notify the clear callback.
    pub fn clear(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.clear();
        self.stroke = StrokeState::Idle;
        self.value = None;
        tracing::debug!(label = %self.config.label, "Signature cleared");
        if let Some(ref callback) = self.on_clear {
            callback();
        }
    }

    /// External value change notification.
    ///
    /// A value equal to the last known one (including the echo of a value this
    /// capture just emitted) is ignored. While a stroke is in progress the
    /// value is recorded but not painted.
    pub fn set_value(&mut self, value: Option<&str>) {
        let value = non_empty(value);
        if value == self.value.as_deref() {
            return;
        }
        self.value = value.map(str::to_owned);
        if self.is_drawing() {
            tracing::debug!(label = %self.config.label, "Value change deferred mid-stroke");
            return;
        }
        self.repaint();
    }

    /// Repaint the surface from `value`, replacing its contents.
    ///
    /// The surface is cleared first, so restoring the same image repeatedly
    /// leaves identical pixels. Ignored while a stroke is in progress.
    pub fn restore(&mut self, value: &str) {
        if self.is_drawing() || self.surface.is_none() {
            return;
        }
        self.value = non_empty(Some(value)).map(str::to_owned);
        self.repaint();
    }

    /// Route a raw input event to the stroke state machine.
    ///
    /// Returns `true` when the caller should suppress the platform's default
    /// gesture handling (scrolling, text selection) for this event.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        if self.surface.is_none() {
            return false;
        }

        match event {
            InputEvent::Pointer {
                phase,
                client_x,
                client_y,
            } => {
                let client = Point::new(*client_x, *client_y);
                match phase {
                    PointerPhase::Down => {
                        self.begin_stroke(client);
                        true
                    }
                    PointerPhase::Move => {
                        let drawing = self.is_drawing();
                        self.extend_stroke(client);
                        drawing
                    }
                    PointerPhase::Up | PointerPhase::Leave => {
                        self.end_stroke();
                        false
                    }
                }
            }
            InputEvent::Touch(touch) => match touch.phase {
                TouchPhase::Start => {
                    if let Some(primary) = touch.primary_touch() {
                        self.begin_stroke(primary.client());
                    }
                    true
                }
                TouchPhase::Move => {
                    let drawing = self.is_drawing();
                    if let Some(primary) = touch.primary_touch() {
                        self.extend_stroke(primary.client());
                    }
                    drawing
                }
                TouchPhase::End | TouchPhase::Cancel => {
                    self.end_stroke();
                    false
                }
            },
        }
    }

    /// Release the surface. Later operations are no-ops until re-initialized.
    pub fn dispose(&mut self) -> Option<S> {
        self.stroke = StrokeState::Idle;
        let surface = self.surface.take();
        if surface.is_some() {
            tracing::debug!(label = %self.config.label, "Signature surface disposed");
        }
        surface
    }

    /// Whether a stroke is in progress.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        matches!(self.stroke, StrokeState::Drawing { .. })
    }

    /// Current stroke state.
    #[must_use]
    pub fn stroke_state(&self) -> StrokeState {
        self.stroke
    }

    /// Whether a surface is bound.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    /// Last known encoded image.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    /// The bound surface.
    #[must_use]
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Mutable access to the bound surface.
    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    fn setup_surface(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let rect = surface.bounding_rect();
        let ratio = normalize_pixel_ratio(self.config.device_pixel_ratio);
        let backing = BackingSize::for_display(rect.width, rect.height, ratio);

        if let Err(e) = surface.configure(backing, ratio, &self.config.stroke) {
            tracing::warn!(label = %self.config.label, "Surface setup skipped: {e}");
            return;
        }
        tracing::debug!(
            label = %self.config.label,
            "Surface configured at {}x{} (css {}x{}, ratio {ratio})",
            backing.width,
            backing.height,
            rect.width,
            rect.height
        );

        if let Some(value) = self.value.as_deref() {
            if let Err(e) = surface.paint_encoded(value, rect.width, rect.height) {
                tracing::warn!(label = %self.config.label, "Failed to restore signature: {e}");
            }
        }
    }

    fn repaint(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.clear();
        let Some(value) = self.value.as_deref() else {
            return;
        };
        let rect = surface.bounding_rect();
        if let Err(e) = surface.paint_encoded(value, rect.width, rect.height) {
            tracing::warn!(label = %self.config.label, "Failed to restore signature: {e}");
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
