//! End-to-end tests for the `compress` and `sign` commands.

use std::io::Cursor;
use std::path::PathBuf;

use clap::Parser;
use image::{DynamicImage, Rgb, RgbImage};
use inkform_cli::{compress, sign, Cli, Command, CompressArgs, SignArgs};

fn write_png(path: &std::path::Path, width: u32, height: u32) {
    #[allow(clippy::cast_possible_truncation)]
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, image::ImageFormat::Png)
        .expect("encode png");
    std::fs::write(path, cursor.into_inner()).expect("write png");
}

fn compress_args(argv: &[&str]) -> CompressArgs {
    let cli = Cli::parse_from(argv);
    match cli.command {
        Command::Compress(args) => args,
        Command::Sign(_) => panic!("expected compress"),
    }
}

fn sign_args(argv: &[&str]) -> SignArgs {
    let cli = Cli::parse_from(argv);
    match cli.command {
        Command::Sign(args) => args,
        Command::Compress(_) => panic!("expected sign"),
    }
}

// ==========================================================================
// compress
// ==========================================================================

#[tokio::test]
async fn test_compress_writes_jpeg_next_to_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("dock.png");
    write_png(&input, 900, 600);
    let input_arg = input.to_string_lossy().into_owned();

    let args = compress_args(&["inkform", "compress", &input_arg, "--preset", "aggressive"]);
    let written = compress::run(&args).await.expect("compress");

    assert_eq!(written.len(), 1);
    let output = dir.path().join("dock.compressed.jpg");
    assert_eq!(written[0].output, output);

    let img = image::open(&output).expect("output decodes");
    assert_eq!((img.width(), img.height()), (400, 267));
    assert_eq!(written[0].image.file_name, "dock.png");
}

#[tokio::test]
async fn test_compress_explicit_out_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("a.png");
    let out = dir.path().join("nested-name.jpg");
    write_png(&input, 64, 48);

    let args = compress_args(&[
        "inkform",
        "compress",
        &input.to_string_lossy(),
        "--out",
        &out.to_string_lossy(),
        "--max-width",
        "32",
    ]);
    compress::run(&args).await.expect("compress");

    let img = image::open(&out).expect("output decodes");
    assert_eq!((img.width(), img.height()), (32, 24));
}

#[tokio::test]
async fn test_compress_rejects_out_with_many_inputs() {
    let args = compress_args(&["inkform", "compress", "a.png", "b.png", "--out", "x.jpg"]);
    let err = compress::run(&args).await.expect_err("ambiguous --out");
    assert!(err.to_string().contains("--out"));
}

#[tokio::test]
async fn test_compress_rejects_invalid_overrides() {
    let args = compress_args(&["inkform", "compress", "a.png", "--quality", "1.5"]);
    assert!(compress::run(&args).await.is_err());
}

#[tokio::test]
async fn test_compress_reports_partial_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = dir.path().join("good.png");
    let bad = dir.path().join("bad.png");
    write_png(&good, 20, 20);
    std::fs::write(&bad, b"definitely not a png").expect("write");

    let args = compress_args(&[
        "inkform",
        "compress",
        &good.to_string_lossy(),
        &bad.to_string_lossy(),
    ]);
    let err = compress::run(&args).await.expect_err("one input is bad");

    assert!(err.to_string().contains("1 of 2"));
    assert!(dir.path().join("good.compressed.jpg").exists());
    assert!(!dir.path().join("bad.compressed.jpg").exists());
}

#[tokio::test]
async fn test_compress_continues_past_unreadable_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = dir.path().join("good.png");
    let missing = dir.path().join("missing.png");
    write_png(&good, 20, 20);

    let args = compress_args(&[
        "inkform",
        "compress",
        &missing.to_string_lossy(),
        &good.to_string_lossy(),
    ]);
    let err = compress::run(&args).await.expect_err("one input is missing");

    assert!(err.to_string().contains("1 of 2"), "got {err:#}");
    assert!(dir.path().join("good.compressed.jpg").exists());
}

#[tokio::test]
async fn test_compress_counts_failed_writes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("a.png");
    let out = dir.path().join("no-such-dir").join("a.jpg");
    write_png(&input, 16, 16);

    let args = compress_args(&[
        "inkform",
        "compress",
        &input.to_string_lossy(),
        "--out",
        &out.to_string_lossy(),
    ]);
    let err = compress::run(&args).await.expect_err("unwritable output");

    assert!(err.to_string().contains("1 of 1"), "got {err:#}");
    assert!(!out.exists());
}

#[test]
fn test_summary_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("s.png");
    write_png(&input, 10, 10);
    let source = inkform_renderer::SourceFile::new("s.png", std::fs::read(&input).expect("read"));
    let image = inkform_renderer::ImageCompressor::default()
        .compress_blocking(&source)
        .expect("compress");

    let summary = compress::summary(&compress::Written {
        input: input.clone(),
        output: PathBuf::from("s.compressed.jpg"),
        image,
    });
    assert_eq!(summary["mime_type"], "image/jpeg");
    assert_eq!(summary["source_format"], "image/png");
    assert_eq!(summary["width"], 10);
    assert_eq!(summary["attempts"], 1);
}

// ==========================================================================
// sign
// ==========================================================================

const RECORDING: &str = r#"[
    {"type":"Pointer","data":{"phase":"down","client_x":20.0,"client_y":60.0}},
    {"type":"Pointer","data":{"phase":"move","client_x":150.0,"client_y":30.0}},
    {"type":"Pointer","data":{"phase":"move","client_x":280.0,"client_y":90.0}},
    {"type":"Pointer","data":{"phase":"up","client_x":280.0,"client_y":90.0}}
]"#;

#[test]
fn test_render_recording_at_device_resolution() {
    let args = sign_args(&["inkform", "sign", "--strokes", "rec.json"]);
    let surface = sign::render(&args, RECORDING).expect("render");

    let size = surface.backing_size();
    assert_eq!((size.width, size.height), (600, 240));
    assert!(!surface.is_blank());
    // First segment passes through CSS (85, 45).
    assert!(surface.pixel(170, 90).expect("in bounds")[3] > 0);
}

#[test]
fn test_render_finishes_open_stroke() {
    let open = r#"[
        {"type":"Touch","data":{"phase":"start","touches":[{"id":0,"client_x":10.0,"client_y":10.0}]}},
        {"type":"Touch","data":{"phase":"move","touches":[{"id":0,"client_x":90.0,"client_y":10.0}]}}
    ]"#;
    let args = sign_args(&[
        "inkform", "sign", "--strokes", "rec.json", "--width", "100", "--height", "20", "--dpr",
        "1",
    ]);
    let surface = sign::render(&args, open).expect("render");
    assert!(surface.pixel(50, 10).expect("in bounds")[3] > 0);
}

#[test]
fn test_render_uses_pen_color() {
    let args = sign_args(&[
        "inkform",
        "sign",
        "--strokes",
        "rec.json",
        "--dpr",
        "1",
        "--color",
        "#ff0000",
        "--line-width",
        "6",
    ]);
    let surface = sign::render(&args, RECORDING).expect("render");
    let px = surface.pixel(20, 60).expect("in bounds");
    assert!(px[0] > 200 && px[1] < 50 && px[2] < 50, "got {px:?}");
    assert!(px[3] > 200);
}

#[test]
fn test_render_rejects_malformed_recording() {
    let args = sign_args(&["inkform", "sign", "--strokes", "rec.json"]);
    assert!(sign::render(&args, "{not json").is_err());
}

#[tokio::test]
async fn test_sign_writes_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let strokes = dir.path().join("rec.json");
    let out = dir.path().join("sig.png");
    std::fs::write(&strokes, RECORDING).expect("write recording");

    let args = sign_args(&[
        "inkform",
        "sign",
        "--strokes",
        &strokes.to_string_lossy(),
        "--out",
        &out.to_string_lossy(),
    ]);
    sign::run(&args).await.expect("sign");

    let img = image::open(&out).expect("png decodes");
    assert_eq!((img.width(), img.height()), (600, 240));
}
