//! Integration tests for signature capture on the raster surface.
//!
//! Covers backing resolution, restore idempotence, repaint suppression during
//! a stroke, clearing, and the full stroke-to-PNG round trip.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use inkform_core::{
    BackingSize, InputEvent, Point, PointerPhase, SignatureCapture, SignatureConfig, SurfaceRect,
    TouchPhase,
};
use inkform_renderer::codec::decode_data_uri;
use inkform_renderer::{raster_signature, RasterSurface};

fn signature(css_w: f64, css_h: f64, ratio: f64) -> SignatureCapture<RasterSurface> {
    raster_signature(
        SignatureConfig::default().with_device_pixel_ratio(ratio),
        SurfaceRect::new(0.0, 0.0, css_w, css_h),
        None,
    )
    .expect("signature")
}

/// Draw a diagonal stroke and return the emitted data URL.
fn draw_diagonal(sig: &mut SignatureCapture<RasterSurface>) -> String {
    let emitted = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&emitted);
    sig.set_on_change(move |url| *sink.borrow_mut() = Some(url.to_string()));

    sig.begin_stroke(Point::new(10.0, 10.0));
    sig.extend_stroke(Point::new(50.0, 50.0));
    sig.end_stroke();

    let url = emitted.borrow().clone();
    url.expect("on_change fired")
}

fn backing(sig: &SignatureCapture<RasterSurface>) -> BackingSize {
    sig.surface().expect("bound").backing_size()
}

fn pixels(sig: &SignatureCapture<RasterSurface>) -> Vec<u8> {
    sig.surface().expect("bound").data().to_vec()
}

// ==========================================================================
// Backing resolution
// ==========================================================================

#[test]
fn test_backing_resolution_tracks_pixel_ratio() {
    for ratio in [1.0, 1.5, 2.0, 3.0] {
        let sig = signature(301.0, 121.0, ratio);
        let size = backing(&sig);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let expected = (
            (301.0 * ratio).round() as u32,
            (121.0 * ratio).round() as u32,
        );
        assert_eq!((size.width, size.height), expected, "ratio {ratio}");
    }
}

#[test]
fn test_resize_recomputes_backing_and_keeps_signature() {
    let mut sig = signature(200.0, 100.0, 2.0);
    draw_diagonal(&mut sig);

    if let Some(surface) = sig.surface_mut() {
        surface.set_layout(SurfaceRect::new(0.0, 0.0, 300.0, 150.0));
    }
    sig.on_resize();

    assert_eq!(
        backing(&sig),
        BackingSize {
            width: 600,
            height: 300
        }
    );
    assert!(!sig.surface().expect("bound").is_blank());
}

// ==========================================================================
// Restore
// ==========================================================================

#[test]
fn test_restore_is_idempotent() {
    let mut source = signature(120.0, 60.0, 2.0);
    let url = draw_diagonal(&mut source);

    let mut once = signature(120.0, 60.0, 2.0);
    once.restore(&url);

    let mut twice = signature(120.0, 60.0, 2.0);
    twice.restore(&url);
    twice.restore(&url);

    assert!(!once.surface().expect("bound").is_blank());
    assert_eq!(pixels(&once), pixels(&twice));
}

#[test]
fn test_initial_value_is_painted_into_css_box() {
    let mut source = signature(120.0, 60.0, 1.0);
    let url = draw_diagonal(&mut source);

    // Same CSS box at a higher ratio: the image is scaled up to fill it.
    let restored = raster_signature(
        SignatureConfig::default().with_device_pixel_ratio(2.0),
        SurfaceRect::new(0.0, 0.0, 120.0, 60.0),
        Some(&url),
    )
    .expect("signature");

    let surface = restored.surface().expect("bound");
    // CSS (30, 30) sits on the stroke; device coordinates are doubled.
    let ink = surface.pixel(60, 60).expect("in bounds");
    assert!(ink[3] > 0, "expected restored ink, got {ink:?}");
    let corner = surface.pixel(230, 10).expect("in bounds");
    assert_eq!(corner[3], 0);
}

#[test]
fn test_undecodable_value_leaves_surface_blank() {
    let mut sig = signature(50.0, 50.0, 1.0);
    sig.set_value(Some("data:image/png;base64,bm90IGFuIGltYWdl"));
    assert!(sig.surface().expect("bound").is_blank());
}

// ==========================================================================
// No repaint during a stroke
// ==========================================================================

#[test]
fn test_value_change_and_resize_do_not_touch_active_stroke() {
    let mut other = signature(100.0, 100.0, 2.0);
    let other_url = draw_diagonal(&mut other);

    let mut sig = signature(100.0, 100.0, 2.0);
    sig.begin_stroke(Point::new(80.0, 10.0));
    sig.extend_stroke(Point::new(20.0, 90.0));
    let before = pixels(&sig);

    sig.set_value(Some(&other_url));
    if let Some(surface) = sig.surface_mut() {
        surface.set_layout(SurfaceRect::new(0.0, 0.0, 400.0, 400.0));
    }
    sig.on_resize();

    assert!(sig.is_drawing());
    assert_eq!(pixels(&sig), before);
    assert_eq!(
        backing(&sig),
        BackingSize {
            width: 200,
            height: 200
        }
    );
}

// ==========================================================================
// Clear
// ==========================================================================

#[test]
fn test_clear_empties_canvas_and_fires_once() {
    let cleared = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&cleared);

    let mut sig = signature(100.0, 40.0, 2.0);
    sig.set_on_clear(move || counter.set(counter.get() + 1));
    draw_diagonal(&mut sig);
    assert!(!sig.surface().expect("bound").is_blank());

    sig.clear();

    let surface = sig.surface().expect("bound");
    assert!(surface.is_blank());
    assert_eq!(surface.pixel(20, 20), Some([0, 0, 0, 0]));
    assert_eq!(cleared.get(), 1);
    assert!(sig.value().is_none());
}

// ==========================================================================
// Round trip
// ==========================================================================

#[test]
fn test_stroke_round_trip_produces_device_resolution_png() {
    let mut sig = signature(300.0, 120.0, 2.0);
    let url = draw_diagonal(&mut sig);

    assert!(url.starts_with("data:image/png;base64,"));
    assert!(url.len() > "data:image/png;base64,".len());

    let (img, _) = decode_data_uri(&url).expect("decodable PNG");
    assert_eq!((img.width(), img.height()), (600, 240));

    // The stroke midpoint, CSS (30, 30), is inked at device (60, 60).
    let rgba = img.to_rgba8();
    assert!(rgba.get_pixel(60, 60)[3] > 0);
    assert_eq!(rgba.get_pixel(590, 230)[3], 0);
}

#[test]
fn test_offset_surface_uses_client_coordinates() {
    let mut sig = raster_signature(
        SignatureConfig::default(),
        SurfaceRect::new(100.0, 500.0, 100.0, 100.0),
        None,
    )
    .expect("signature");

    let events = [
        InputEvent::touch(TouchPhase::Start, 110.0, 550.0),
        InputEvent::touch(TouchPhase::Move, 190.0, 550.0),
        InputEvent::touch(TouchPhase::End, 190.0, 550.0),
    ];
    for event in &events {
        sig.handle_input(event);
    }

    let surface = sig.surface().expect("bound");
    assert!(surface.pixel(50, 50).expect("in bounds")[3] > 200);
    assert_eq!(surface.pixel(50, 5).expect("in bounds")[3], 0);
    assert!(sig.value().is_some());
}

#[test]
fn test_replayed_recording_matches_direct_calls() {
    let recording = r#"[
        {"type":"Pointer","data":{"phase":"down","client_x":10.0,"client_y":10.0}},
        {"type":"Pointer","data":{"phase":"move","client_x":50.0,"client_y":50.0}},
        {"type":"Pointer","data":{"phase":"up","client_x":50.0,"client_y":50.0}}
    ]"#;
    let events = InputEvent::parse_recording(recording).expect("recording");

    let mut replayed = signature(80.0, 80.0, 2.0);
    for event in &events {
        replayed.handle_input(event);
    }

    let mut direct = signature(80.0, 80.0, 2.0);
    direct.handle_input(&InputEvent::pointer(PointerPhase::Down, 10.0, 10.0));
    direct.extend_stroke(Point::new(50.0, 50.0));
    direct.end_stroke();

    assert_eq!(pixels(&replayed), pixels(&direct));
    assert_eq!(replayed.value(), direct.value());
}
