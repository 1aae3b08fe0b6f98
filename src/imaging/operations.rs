//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, decide size and format, and call the backend.
//!
//! ## Decision table
//!
//! | Input | Output |
//! |---|---|
//! | size < `passthrough_below` | unchanged bytes, name and MIME |
//! | PNG, size ≤ `png_max` | PNG, width capped at `max_width` |
//! | PNG, size > `png_max` | JPEG at `quality` |
//! | anything else | JPEG at `quality` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{calculate_target_dimensions, kib};
use super::params::{OutputFormat, Quality, RenderParams};
use crate::config::ImagesConfig;
use crate::types::UploadFile;
use std::path::Path;
use thiserror::Error;

/// A failed compression, tagged with the file it belongs to.
///
/// Each stage failure is a distinct variant; none of them fall back to the
/// original bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompressError {
    #[error("{file}: could not decode image: {reason}")]
    Decode { file: String, reason: String },
    #[error("{file}: could not render image: {reason}")]
    Render { file: String, reason: String },
    #[error("{file}: could not encode image: {reason}")]
    Encode { file: String, reason: String },
}

impl CompressError {
    fn from_backend(file: &str, err: BackendError) -> Self {
        let file = file.to_string();
        match err {
            BackendError::Decode(reason) => CompressError::Decode { file, reason },
            BackendError::Render(reason) => CompressError::Render { file, reason },
            BackendError::Encode(reason) => CompressError::Encode { file, reason },
        }
    }

    pub fn file(&self) -> &str {
        match self {
            CompressError::Decode { file, .. }
            | CompressError::Render { file, .. }
            | CompressError::Encode { file, .. } => file,
        }
    }
}

/// Thresholds and encoder settings for compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionConfig {
    pub max_width: u32,
    pub quality: Quality,
    /// Files strictly smaller than this many bytes are returned untouched.
    pub passthrough_below: usize,
    /// PNGs up to this many bytes stay PNG; larger ones become JPEG.
    pub png_max: usize,
}

impl CompressionConfig {
    pub fn from_images_config(images: &ImagesConfig) -> Self {
        Self {
            max_width: images.max_width,
            quality: Quality::new(images.quality),
            passthrough_below: kib(images.passthrough_below_kib),
            png_max: kib(images.png_max_kib),
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::from_images_config(&ImagesConfig::default())
    }
}

/// What the compressor did to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compression {
    /// Below the passthrough threshold; bytes are the input's.
    Unchanged,
    Reencoded {
        format: OutputFormat,
        original: Dimensions,
        width: u32,
        height: u32,
    },
}

/// A compressed file plus a record of what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedFile {
    pub file: UploadFile,
    pub original_size: usize,
    pub compression: Compression,
}

/// Pick the output format for a file that will be re-encoded.
pub fn choose_format(file: &UploadFile, config: &CompressionConfig) -> OutputFormat {
    if file.is_png() && file.size() <= config.png_max {
        OutputFormat::Png
    } else {
        OutputFormat::Jpeg
    }
}

/// Replace (or append) the filename extension to match `format`.
///
/// `"villa.jpeg"` → `"villa.jpg"`, `"plan.png"` → `"plan.jpg"` for JPEG output,
/// `"scan"` → `"scan.jpg"`.
pub fn rename_for_format(name: &str, format: OutputFormat) -> String {
    Path::new(name)
        .with_extension(format.extension())
        .to_string_lossy()
        .into_owned()
}

/// Plan the render for a file of known dimensions without executing it.
pub fn plan_render(
    file: &UploadFile,
    original: Dimensions,
    config: &CompressionConfig,
) -> RenderParams {
    let (width, height) =
        calculate_target_dimensions((original.width, original.height), config.max_width);
    RenderParams {
        width,
        height,
        format: choose_format(file, config),
        quality: config.quality,
    }
}

/// Compress one file.
///
/// Small files pass through untouched. Everything else is decoded, capped at
/// `max_width` (never upscaled) and re-encoded as JPEG or PNG.
pub fn compress(
    backend: &impl ImageBackend,
    file: &UploadFile,
    config: &CompressionConfig,
) -> Result<CompressedFile, CompressError> {
    if file.size() < config.passthrough_below {
        return Ok(CompressedFile {
            file: file.clone(),
            original_size: file.size(),
            compression: Compression::Unchanged,
        });
    }

    let original = backend
        .identify(&file.data)
        .map_err(|e| CompressError::from_backend(&file.name, e))?;
    let params = plan_render(file, original, config);
    let data = backend
        .render(&file.data, &params)
        .map_err(|e| CompressError::from_backend(&file.name, e))?;

    Ok(CompressedFile {
        file: UploadFile {
            name: rename_for_format(&file.name, params.format),
            mime: params.format.mime().to_string(),
            data,
        },
        original_size: file.size(),
        compression: Compression::Reencoded {
            format: params.format,
            original,
            width: params.width,
            height: params.height,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MOCK_OUTPUT, MockBackend, RecordedOp};
    use crate::imaging::rust_backend::RustBackend;
    use crate::test_helpers::{jpeg_bytes, noisy_jpeg_bytes, png_bytes};

    fn sized(name: &str, mime: &str, size: usize) -> UploadFile {
        UploadFile::new(name, mime, vec![0u8; size])
    }

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    // =========================================================================
    // Format and naming
    // =========================================================================

    #[test]
    fn small_png_stays_png() {
        let cfg = CompressionConfig::default();
        let f = sized("a.png", "image/png", 900 * 1024);
        assert_eq!(choose_format(&f, &cfg), OutputFormat::Png);
    }

    #[test]
    fn png_at_exact_limit_stays_png() {
        let cfg = CompressionConfig::default();
        let f = sized("a.png", "image/png", 1000 * 1024);
        assert_eq!(choose_format(&f, &cfg), OutputFormat::Png);
    }

    #[test]
    fn large_png_becomes_jpeg() {
        let cfg = CompressionConfig::default();
        let f = sized("a.png", "image/png", 1000 * 1024 + 1);
        assert_eq!(choose_format(&f, &cfg), OutputFormat::Jpeg);
    }

    #[test]
    fn non_png_becomes_jpeg() {
        let cfg = CompressionConfig::default();
        for mime in ["image/jpeg", "image/webp", "image/tiff"] {
            let f = sized("a", mime, 10);
            assert_eq!(choose_format(&f, &cfg), OutputFormat::Jpeg, "{mime}");
        }
    }

    #[test]
    fn rename_replaces_extension() {
        assert_eq!(rename_for_format("villa.jpeg", OutputFormat::Jpeg), "villa.jpg");
        assert_eq!(rename_for_format("plan.png", OutputFormat::Jpeg), "plan.jpg");
        assert_eq!(rename_for_format("plan.PNG", OutputFormat::Png), "plan.png");
        assert_eq!(rename_for_format("my.photo.webp", OutputFormat::Jpeg), "my.photo.jpg");
    }

    #[test]
    fn rename_appends_missing_extension() {
        assert_eq!(rename_for_format("scan", OutputFormat::Jpeg), "scan.jpg");
    }

    // =========================================================================
    // compress with mock backend
    // =========================================================================

    #[test]
    fn small_file_passes_through_without_touching_backend() {
        let backend = MockBackend::new();
        let f = sized("tiny.jpg", "image/jpeg", 500 * 1024 - 1);

        let out = compress(&backend, &f, &CompressionConfig::default()).unwrap();

        assert_eq!(out.file, f);
        assert_eq!(out.compression, Compression::Unchanged);
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn file_at_threshold_is_reencoded() {
        let backend = MockBackend::with_dimensions(vec![dims(800, 600)]);
        let f = sized("edge.jpg", "image/jpeg", 500 * 1024);

        let out = compress(&backend, &f, &CompressionConfig::default()).unwrap();

        assert_eq!(out.file.data, MOCK_OUTPUT);
        assert!(matches!(out.compression, Compression::Reencoded { .. }));
    }

    #[test]
    fn wide_image_is_capped_at_1920() {
        let backend = MockBackend::with_dimensions(vec![dims(4000, 2250)]);
        let f = sized("wide.jpg", "image/jpeg", 2 * 1024 * 1024);

        compress(&backend, &f, &CompressionConfig::default()).unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[1],
            RecordedOp::Render {
                input_len: 2 * 1024 * 1024,
                width: 1920,
                height: 1080,
                format: OutputFormat::Jpeg,
                quality: 85,
            }
        );
    }

    #[test]
    fn narrow_image_keeps_width() {
        let backend = MockBackend::with_dimensions(vec![dims(1024, 768)]);
        let f = sized("narrow.png", "image/png", 600 * 1024);

        let out = compress(&backend, &f, &CompressionConfig::default()).unwrap();

        assert_eq!(
            out.compression,
            Compression::Reencoded {
                format: OutputFormat::Png,
                original: dims(1024, 768),
                width: 1024,
                height: 768,
            }
        );
        assert_eq!(out.file.name, "narrow.png");
        assert_eq!(out.file.mime, "image/png");
    }

    #[test]
    fn large_png_is_renamed_to_jpg() {
        let backend = MockBackend::with_dimensions(vec![dims(3000, 2000)]);
        let f = sized("floorplan.png", "image/png", 3 * 1024 * 1024);

        let out = compress(&backend, &f, &CompressionConfig::default()).unwrap();

        assert_eq!(out.file.name, "floorplan.jpg");
        assert_eq!(out.file.mime, "image/jpeg");
        assert_eq!(out.original_size, 3 * 1024 * 1024);
    }

    #[test]
    fn decode_failure_is_reported_not_passed_through() {
        let backend = MockBackend::new();
        let f = sized("broken.jpg", "image/jpeg", 700 * 1024);

        let err = compress(&backend, &f, &CompressionConfig::default()).unwrap_err();

        assert!(matches!(err, CompressError::Decode { .. }));
        assert_eq!(err.file(), "broken.jpg");
    }

    #[test]
    fn render_and_encode_failures_are_distinct() {
        let f = sized("x.jpg", "image/jpeg", 700 * 1024);

        let backend = MockBackend::failing_render(
            vec![dims(100, 100)],
            BackendError::Render("no surface".into()),
        );
        assert!(matches!(
            compress(&backend, &f, &CompressionConfig::default()),
            Err(CompressError::Render { .. })
        ));

        let backend = MockBackend::failing_render(
            vec![dims(100, 100)],
            BackendError::Encode("encoder gave up".into()),
        );
        assert!(matches!(
            compress(&backend, &f, &CompressionConfig::default()),
            Err(CompressError::Encode { .. })
        ));
    }

    #[test]
    fn custom_quality_reaches_backend() {
        let backend = MockBackend::with_dimensions(vec![dims(100, 100)]);
        let cfg = CompressionConfig {
            quality: Quality::new(60),
            ..Default::default()
        };
        let f = sized("q.jpg", "image/jpeg", 600 * 1024);
        compress(&backend, &f, &cfg).unwrap();
        assert!(matches!(
            backend.get_operations()[1],
            RecordedOp::Render { quality: 60, .. }
        ));
    }

    // =========================================================================
    // compress with the real backend
    // =========================================================================

    #[test]
    fn real_small_jpeg_is_byte_identical() {
        let data = jpeg_bytes(320, 240);
        assert!(data.len() < 500 * 1024);
        let f = UploadFile::new("small.jpg", "image/jpeg", data.clone());

        let out = compress(&RustBackend::new(), &f, &CompressionConfig::default()).unwrap();
        assert_eq!(out.file.data, data);
    }

    #[test]
    fn real_wide_jpeg_is_downscaled_proportionally() {
        let data = noisy_jpeg_bytes(2600, 1300);
        let f = UploadFile::new("wide.jpeg", "image/jpeg", data);
        // Force re-encoding regardless of how well the synthetic image compresses.
        let cfg = CompressionConfig {
            passthrough_below: 0,
            ..Default::default()
        };

        let out = compress(&RustBackend::new(), &f, &cfg).unwrap();

        let decoded = image::load_from_memory(&out.file.data).unwrap();
        assert_eq!(decoded.width(), 1920);
        assert!((decoded.height() as i64 - 960).abs() <= 1);
        assert_eq!(out.file.name, "wide.jpg");
    }

    #[test]
    fn real_small_png_round_trips_as_png() {
        let data = png_bytes(300, 200, false);
        let f = UploadFile::new("logo.png", "image/png", data);
        let cfg = CompressionConfig {
            passthrough_below: 0,
            ..Default::default()
        };

        let out = compress(&RustBackend::new(), &f, &cfg).unwrap();

        assert_eq!(
            image::guess_format(&out.file.data).unwrap(),
            image::ImageFormat::Png
        );
        let decoded = image::load_from_memory(&out.file.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 200));
    }
}
