//! `inkform compress`: batch photo compression.

use std::path::{Path, PathBuf};

use anyhow::bail;
use inkform_renderer::{CompressedImage, ImageCompressor, SourceFile};

use crate::args::CompressArgs;

/// One successfully written output.
#[derive(Debug, Clone)]
pub struct Written {
    /// Input path.
    pub input: PathBuf,
    /// Path the JPEG was written to.
    pub output: PathBuf,
    /// The compression result.
    pub image: CompressedImage,
}

/// Compress every input and write the results.
///
/// Every input is attempted. A read, compress or write failure is logged and
/// counted, and the error afterwards reports how many inputs failed.
///
/// # Errors
///
/// Returns an error for invalid options, or if any input could not be read,
/// compressed or written.
pub async fn run(args: &CompressArgs) -> anyhow::Result<Vec<Written>> {
    let options = args.options();
    options.validate()?;
    if args.out.is_some() && args.inputs.len() > 1 {
        bail!("--out can only be used with a single input");
    }

    let mut failed = 0_usize;
    let mut readable = Vec::with_capacity(args.inputs.len());
    let mut sources = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        match SourceFile::read(input).await {
            Ok(source) => {
                readable.push(input);
                sources.push(source);
            }
            Err(e) => {
                tracing::error!("Failed to read {}: {e}", input.display());
                failed += 1;
            }
        }
    }

    tracing::info!(
        files = sources.len(),
        preset = %args.preset,
        max_width_px = options.max_width_px,
        max_size_kb = options.max_size_kb,
        "Compressing"
    );
    let results = ImageCompressor::new(options).compress_all(sources).await;

    let mut written = Vec::new();
    for (input, result) in readable.into_iter().zip(results) {
        let image = match result {
            Ok(image) => image,
            Err(e) => {
                tracing::error!("Failed to compress {}: {e}", input.display());
                failed += 1;
                continue;
            }
        };

        let output = args
            .out
            .clone()
            .unwrap_or_else(|| default_output_path(input));
        if let Err(e) = tokio::fs::write(&output, &image.bytes).await {
            tracing::error!("Failed to write {}: {e}", output.display());
            failed += 1;
            continue;
        }
        tracing::info!(
            "{} -> {} ({}x{}, {:.1} KB, quality {:.2}, {} attempt(s))",
            input.display(),
            output.display(),
            image.width,
            image.height,
            image.size_kb(),
            image.quality,
            image.attempts
        );
        written.push(Written {
            input: input.clone(),
            output,
            image,
        });
    }

    if args.json {
        for item in &written {
            println!("{}", summary(item));
        }
    }

    if failed > 0 {
        bail!("{failed} of {} file(s) failed", args.inputs.len());
    }
    Ok(written)
}

/// `<stem>.compressed.jpg` next to `input`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "image".to_string(), |s| s.to_string_lossy().into_owned());
    input.with_file_name(format!("{stem}.compressed.jpg"))
}

/// JSON summary of one written output.
#[must_use]
pub fn summary(item: &Written) -> serde_json::Value {
    serde_json::json!({
        "input": item.input.display().to_string(),
        "output": item.output.display().to_string(),
        "file_name": item.image.file_name,
        "mime_type": item.image.mime_type,
        "source_format": item.image.source_format.mime(),
        "width": item.image.width,
        "height": item.image.height,
        "bytes": item.image.bytes.len(),
        "quality": item.image.quality,
        "attempts": item.image.attempts,
    })
}
