//! # Inkform WASM Application
//!
//! Browser bindings for the signature field.
//!
//! ## Usage
//!
//! Build for WASM:
//! ```bash
//! wasm-pack build --target web inkform-app
//! ```
//!
//! Then import in JavaScript:
//! ```javascript
//! import init, { SignaturePad } from './pkg/inkform_app.js';
//!
//! await init();
//! const pad = new SignaturePad(
//!     'signature-canvas',
//!     record.signature ?? null,
//!     (dataUrl) => { record.signature = dataUrl; },
//!     () => { record.signature = null; },
//! );
//!
//! // Later, when the form is reloaded or reset:
//! pad.setValue(otherRecord.signature ?? null);
//! pad.dispose();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dom;

use std::cell::RefCell;
use std::rc::Rc;

use inkform_core::{
    InputEvent, PointerPhase, SignatureCapture, SignatureConfig, TouchEvent, TouchPhase,
    TouchPoint,
};
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, EventTarget, HtmlCanvasElement, MouseEvent};

pub use dom::DomSurface;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    tracing::info!("Inkform WASM initialized");
}

type CaptureHandle = Rc<RefCell<SignatureCapture<DomSurface>>>;

/// A registered DOM listener, kept alive until removed.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    fn remove(&self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

/// Mouse event names and their pointer phases.
const MOUSE_EVENTS: [(&str, PointerPhase); 4] = [
    ("mousedown", PointerPhase::Down),
    ("mousemove", PointerPhase::Move),
    ("mouseup", PointerPhase::Up),
    ("mouseleave", PointerPhase::Leave),
];

/// Touch event names and their phases.
const TOUCH_EVENTS: [(&str, TouchPhase); 4] = [
    ("touchstart", TouchPhase::Start),
    ("touchmove", TouchPhase::Move),
    ("touchend", TouchPhase::End),
    ("touchcancel", TouchPhase::Cancel),
];

/// A signature field bound to a canvas element.
#[wasm_bindgen]
pub struct SignaturePad {
    capture: CaptureHandle,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl SignaturePad {
    /// Bind to the canvas with id `canvas_id`.
    ///
    /// `on_change` receives a PNG data URL after every completed stroke;
    /// `on_clear` is called when the signature is cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas element is not found or has no 2D
    /// context.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        initial_value: Option<String>,
        on_change: Option<js_sys::Function>,
        on_clear: Option<js_sys::Function>,
    ) -> Result<SignaturePad, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object"))?;

        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("Canvas element '{canvas_id}' not found")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("Element is not a canvas"))?;
        let surface =
            DomSurface::new(canvas.clone()).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let config = SignatureConfig::default()
            .with_label(canvas_id)
            .with_device_pixel_ratio(window.device_pixel_ratio());
        let mut capture = SignatureCapture::new(config);
        if let Some(callback) = on_change {
            capture.set_on_change(move |data_url| {
                if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(data_url)) {
                    tracing::warn!("on_change callback threw: {e:?}");
                }
            });
        }
        if let Some(callback) = on_clear {
            capture.set_on_clear(move || {
                if let Err(e) = callback.call0(&JsValue::NULL) {
                    tracing::warn!("on_clear callback threw: {e:?}");
                }
            });
        }
        capture.initialize(surface, initial_value.as_deref());

        let capture = Rc::new(RefCell::new(capture));
        let mut pad = Self {
            capture,
            listeners: Vec::new(),
        };
        pad.register_listeners(&canvas, &window)?;
        Ok(pad)
    }

    /// Apply an externally supplied value.
    ///
    /// Re-entrant calls from inside `on_change` are the echo of the value just
    /// emitted and are ignored.
    #[wasm_bindgen(js_name = setValue)]
    pub fn set_value(&self, value: Option<String>) {
        match self.capture.try_borrow_mut() {
            Ok(mut capture) => capture.set_value(value.as_deref()),
            Err(_) => tracing::debug!("Ignoring re-entrant setValue"),
        }
    }

    /// Erase the signature and fire `on_clear`.
    pub fn clear(&self) {
        match self.capture.try_borrow_mut() {
            Ok(mut capture) => capture.clear(),
            Err(_) => tracing::debug!("Ignoring re-entrant clear"),
        }
    }

    /// Whether a stroke is in progress.
    #[wasm_bindgen(js_name = isDrawing)]
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.capture.try_borrow().is_ok_and(|c| c.is_drawing())
    }

    /// The last known signature data URL.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        self.capture
            .try_borrow()
            .ok()
            .and_then(|c| c.value().map(str::to_owned))
    }

    /// Unregister all listeners and release the canvas.
    pub fn dispose(&mut self) {
        for listener in self.listeners.drain(..) {
            listener.remove();
        }
        if let Ok(mut capture) = self.capture.try_borrow_mut() {
            capture.dispose();
        }
    }
}

impl SignaturePad {
    fn register_listeners(
        &mut self,
        canvas: &HtmlCanvasElement,
        window: &web_sys::Window,
    ) -> Result<(), JsValue> {
        let canvas_target: &EventTarget = canvas.as_ref();

        for (kind, phase) in MOUSE_EVENTS {
            let capture = Rc::clone(&self.capture);
            let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
                let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                let input = InputEvent::pointer(
                    phase,
                    f64::from(mouse.client_x()),
                    f64::from(mouse.client_y()),
                );
                if dispatch(&capture, &input) {
                    event.prevent_default();
                }
            });
            self.listen(canvas_target, kind, closure, None)?;
        }

        // Non-passive so preventDefault can stop scrolling while signing.
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        for (kind, phase) in TOUCH_EVENTS {
            let capture = Rc::clone(&self.capture);
            let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
                let Some(touch) = event.dyn_ref::<web_sys::TouchEvent>() else {
                    return;
                };
                let input = InputEvent::Touch(to_touch_event(phase, touch));
                if dispatch(&capture, &input) {
                    event.prevent_default();
                }
            });
            self.listen(canvas_target, kind, closure, Some(&options))?;
        }

        let capture = Rc::clone(&self.capture);
        let on_resize = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            if let Ok(mut capture) = capture.try_borrow_mut() {
                capture.on_resize();
            }
        });
        self.listen(window.as_ref(), "resize", on_resize, None)?;
        Ok(())
    }

    fn listen(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        closure: Closure<dyn FnMut(web_sys::Event)>,
        options: Option<&AddEventListenerOptions>,
    ) -> Result<(), JsValue> {
        let callback = closure.as_ref().unchecked_ref();
        match options {
            Some(options) => target
                .add_event_listener_with_callback_and_add_event_listener_options(
                    kind, callback, options,
                )?,
            None => target.add_event_listener_with_callback(kind, callback)?,
        }
        self.listeners.push(Listener {
            target: target.clone(),
            kind,
            closure,
        });
        Ok(())
    }
}

impl Drop for SignaturePad {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Route one input event, returning whether the default action should be
/// suppressed.
fn dispatch(capture: &CaptureHandle, input: &InputEvent) -> bool {
    capture
        .try_borrow_mut()
        .is_ok_and(|mut capture| capture.handle_input(input))
}

fn to_touch_event(phase: TouchPhase, event: &web_sys::TouchEvent) -> TouchEvent {
    let list = event.touches();
    let touches = (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|t| {
            TouchPoint::new(
                t.identifier().unsigned_abs(),
                f64::from(t.client_x()),
                f64::from(t.client_y()),
            )
        })
        .collect();
    TouchEvent::new(phase, touches)
}
