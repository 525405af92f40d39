//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use inkform_core::{SignatureConfig, StrokeStyle};
use inkform_renderer::{CompressionOptions, Preset};

/// Inkform: photo compression and signature rendering for record forms.
#[derive(Debug, Parser)]
#[command(name = "inkform", version, about)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Downscale and re-encode photos as JPEG under a size budget.
    Compress(CompressArgs),
    /// Render a recorded pointer/touch session to a signature PNG.
    Sign(SignArgs),
}

/// Arguments for `inkform compress`.
#[derive(Debug, Args)]
pub struct CompressArgs {
    /// Image files to compress.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output path. Only valid with a single input; defaults to
    /// `<stem>.compressed.jpg` next to each input.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Named option set.
    #[arg(long, env = "INKFORM_PRESET", default_value_t = Preset::Standard)]
    pub preset: Preset,

    /// Override the preset's maximum width in pixels.
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Override the preset's starting quality, in (0, 1].
    #[arg(long)]
    pub quality: Option<f64>,

    /// Override the preset's size budget in kilobytes.
    #[arg(long)]
    pub max_size_kb: Option<f64>,

    /// Override the lowest quality the search may reach.
    #[arg(long)]
    pub floor: Option<f64>,

    /// Print one JSON summary line per written file.
    #[arg(long)]
    pub json: bool,
}

impl CompressArgs {
    /// The preset's options with command-line overrides applied.
    #[must_use]
    pub fn options(&self) -> CompressionOptions {
        let preset = self.preset.options();
        CompressionOptions {
            max_width_px: self.max_width.unwrap_or(preset.max_width_px),
            start_quality: self.quality.unwrap_or(preset.start_quality),
            max_size_kb: self.max_size_kb.unwrap_or(preset.max_size_kb),
            quality_floor: self.floor.unwrap_or(preset.quality_floor),
        }
    }
}

/// Arguments for `inkform sign`.
#[derive(Debug, Args)]
pub struct SignArgs {
    /// JSON array of recorded input events.
    #[arg(long)]
    pub strokes: PathBuf,

    /// Surface width in CSS pixels.
    #[arg(long, default_value_t = 300.0)]
    pub width: f64,

    /// Surface height in CSS pixels.
    #[arg(long, default_value_t = 120.0)]
    pub height: f64,

    /// Device pixel ratio of the target display.
    #[arg(long, default_value_t = 2.0)]
    pub dpr: f64,

    /// Pen color as `#rgb`, `#rrggbb` or `#rrggbbaa`.
    #[arg(long, default_value = "#000000")]
    pub color: String,

    /// Pen width in CSS pixels.
    #[arg(long, default_value_t = 2.0)]
    pub line_width: f64,

    /// Output PNG path.
    #[arg(short, long, default_value = "signature.png")]
    pub out: PathBuf,

    /// Print the PNG as a data URL instead of writing a file.
    #[arg(long)]
    pub data_url: bool,
}

impl SignArgs {
    /// Signature configuration for these arguments.
    #[must_use]
    pub fn config(&self) -> SignatureConfig {
        let label = self
            .strokes
            .file_stem()
            .map_or_else(|| "signature".to_string(), |s| s.to_string_lossy().into_owned());
        SignatureConfig {
            stroke: StrokeStyle {
                color: self.color.clone(),
                width: self.line_width,
                ..StrokeStyle::default()
            },
            ..SignatureConfig::default()
        }
        .with_label(label)
        .with_device_pixel_ratio(self.dpr)
    }
}
