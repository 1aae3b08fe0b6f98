//! Image compression in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Resample** | `resize_exact` with Lanczos3 |
//! | **Encode** | JPEG (quality 1–100) or PNG (lossless) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing a render
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`compress`]: thresholds, format choice, renaming
//! - **Batch**: [`compress_batch`]: sequential, ordered, with progress events

pub mod backend;
pub mod batch;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use batch::{BatchEvent, FileOutcome, compress_batch, progress_percent};
pub use calculations::calculate_target_dimensions;
pub use operations::{
    CompressError, CompressedFile, Compression, CompressionConfig, choose_format, compress,
    rename_for_format,
};
pub use params::{OutputFormat, Quality, RenderParams};
pub use rust_backend::RustBackend;
