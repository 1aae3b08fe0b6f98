//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only, no full decode) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Resample | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (best compression, adaptive filter) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{OutputFormat, RenderParams};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// Upper bound for a single RGBA render surface. Larger targets are refused
/// before allocation.
const MAX_SURFACE_BYTES: u64 = 512 * 1024 * 1024;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(data: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(data).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Resample onto a surface of the requested size.
///
/// Zero-sized or oversized targets fail here rather than in the encoder.
fn render_surface(img: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, BackendError> {
    if width == 0 || height == 0 {
        return Err(BackendError::Render(format!(
            "target size {width}x{height} is empty"
        )));
    }
    let bytes = width as u64 * height as u64 * 4;
    if bytes > MAX_SURFACE_BYTES {
        return Err(BackendError::Render(format!(
            "target size {width}x{height} exceeds the surface limit"
        )));
    }

    if img.width() == width && img.height() == height {
        return Ok(img.clone());
    }
    Ok(img.resize_exact(width, height, FilterType::Lanczos3))
}

fn encode_jpeg(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    // JPEG has no alpha channel; flatten before encoding.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100) as u8);
    rgb.write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("JPEG: {e}")))?;
    Ok(buf)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let normalized = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };
    let mut buf = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
    normalized
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("PNG: {e}")))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn render(&self, data: &[u8], params: &RenderParams) -> Result<Vec<u8>, BackendError> {
        let img = decode(data)?;
        let surface = render_surface(&img, params.width, params.height)?;
        match params.format {
            OutputFormat::Jpeg => encode_jpeg(&surface, params.quality.value()),
            OutputFormat::Png => encode_png(&surface),
        }
    }
}
