//! `inkform sign`: replay a recorded input session into a signature PNG.

use anyhow::Context;
use inkform_core::{InputEvent, SurfaceRect};
use inkform_renderer::codec::encode_data_uri;
use inkform_renderer::{raster_signature, RasterSurface};

use crate::args::SignArgs;

/// Replay `recording` (a JSON array of input events) onto a fresh surface.
///
/// A recording that ends mid-stroke is finished as if the pointer had been
/// released.
///
/// # Errors
///
/// Returns an error if the recording is not valid JSON or the surface cannot
/// be allocated.
pub fn render(args: &SignArgs, recording: &str) -> anyhow::Result<RasterSurface> {
    let events = InputEvent::parse_recording(recording).context("Invalid stroke recording")?;
    let rect = SurfaceRect::new(0.0, 0.0, args.width, args.height);
    let mut capture = raster_signature(args.config(), rect, None)?;

    for event in &events {
        capture.handle_input(event);
    }
    if capture.is_drawing() {
        tracing::warn!("Recording ended mid-stroke; finishing it");
        capture.end_stroke();
    }
    if capture.value().is_none() {
        tracing::warn!("Recording produced no strokes");
    }
    tracing::debug!(events = events.len(), "Replayed recording");

    capture
        .dispose()
        .context("Signature surface was released during replay")
}

/// Run `inkform sign`.
///
/// # Errors
///
/// Returns an error if the recording cannot be read or parsed, or the output
/// cannot be written.
pub async fn run(args: &SignArgs) -> anyhow::Result<()> {
    let recording = tokio::fs::read_to_string(&args.strokes)
        .await
        .with_context(|| format!("Failed to read {}", args.strokes.display()))?;
    let surface = render(args, &recording)?;
    let png = surface.encode_png()?;

    if args.data_url {
        println!("{}", encode_data_uri("image/png", &png));
        return Ok(());
    }

    tokio::fs::write(&args.out, &png)
        .await
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    let size = surface.backing_size();
    tracing::info!(
        "Wrote {} ({}x{}, {} bytes)",
        args.out.display(),
        size.width,
        size.height,
        png.len()
    );
    Ok(())
}
