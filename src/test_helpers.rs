//! Shared test utilities.
//!
//! Synthetic image generators for the compression tests, a fixed clock, and
//! sample record inputs.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let big = noisy_jpeg_bytes(2600, 1300);   // well above the passthrough size
//! let small = png_bytes(40, 30, true);      // tiny RGBA PNG
//! let p = Property::create(property_input("Marina View"), fixed_now())?;
//! ```

use crate::records::PropertyInput;
use chrono::{DateTime, TimeZone, Utc};
use image::{ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};

// =========================================================================
// Images
// =========================================================================

/// A smooth gradient JPEG. Compresses well, so even large dimensions stay
/// small on disk.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 90)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// A JPEG of pseudo-random noise at high quality. Noise defeats the
/// encoder, so the file is large enough to cross the passthrough threshold.
pub fn noisy_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x2545_f491;
    let img = RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        };
        Rgb([next(), next(), next()])
    });
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 95)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// A PNG, RGBA with a transparent corner when `alpha` is set, RGB otherwise.
pub fn png_bytes(width: u32, height: u32, alpha: bool) -> Vec<u8> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    if alpha {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            let a = if x < width / 4 && y < height / 4 { 0 } else { 255 };
            Rgba([(x % 256) as u8, 80, (y % 256) as u8, a])
        });
        encoder
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
            .unwrap();
    } else {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, 80, (y % 256) as u8])
        });
        encoder
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }
    buf
}

// =========================================================================
// Records
// =========================================================================

/// 2026-01-15T10:00:00Z, so timestamps in assertions are stable.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// A valid property form with a three-image gallery:
/// `/media/one.jpg`, `/media/two.jpg`, `/media/three.jpg`.
pub fn property_input(title: &str) -> PropertyInput {
    PropertyInput {
        title: title.to_string(),
        location: "Dubai Marina".to_string(),
        price: Some("AED 2,400,000".to_string()),
        property_type: Some("apartment".to_string()),
        bedrooms: Some(2),
        bathrooms: Some(2),
        area_sqft: Some(1350),
        description: "Sea views from every room.".to_string(),
        gallery: vec![
            "/media/one.jpg".to_string(),
            "/media/two.jpg".to_string(),
            "/media/three.jpg".to_string(),
        ],
        features: vec!["Balcony".to_string(), "Gym".to_string()],
        ..Default::default()
    }
}
