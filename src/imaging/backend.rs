//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify and render (decode, resample, re-encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust, no system
//! libraries. Everything is statically linked into the binary.
//!
//! Failures are split by stage so callers can tell a corrupt upload from an
//! encoder problem: [`BackendError::Decode`], [`BackendError::Render`] and
//! [`BackendError::Encode`].

use super::params::RenderParams;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("could not allocate render surface: {0}")]
    Render(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Both operations work on in-memory bytes; backends perform no disk or
/// network I/O.
pub trait ImageBackend: Sync {
    /// Read image dimensions from the encoded bytes.
    fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode, resample to `params.width` x `params.height` and re-encode.
    fn render(&self, data: &[u8], params: &RenderParams) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{OutputFormat, Quality};
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    ///
    /// `identify` pops from `identify_results`; an empty stack is a decode
    /// failure. `render` returns `render_result` when set, otherwise a fixed
    /// marker payload.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub render_failure: Mutex<Option<BackendError>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(usize),
        Render {
            input_len: usize,
            width: u32,
            height: u32,
            format: OutputFormat,
            quality: u32,
        },
    }

    /// Bytes returned by a successful mock render.
    pub const MOCK_OUTPUT: &[u8] = b"mock-encoded";

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Dimensions are consumed from the end, so push them in reverse order
        /// of the identify calls you expect.
        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        pub fn failing_render(dims: Vec<Dimensions>, error: BackendError) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                render_failure: Mutex::new(Some(error)),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(data.len()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::Decode("no mock dimensions".to_string()))
        }

        fn render(&self, data: &[u8], params: &RenderParams) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Render {
                input_len: data.len(),
                width: params.width,
                height: params.height,
                format: params.format,
                quality: params.quality.value(),
            });
            if let Some(err) = self.render_failure.lock().unwrap().clone() {
                return Err(err);
            }
            Ok(MOCK_OUTPUT.to_vec())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(&[0u8; 16]).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Identify(16)]);
    }

    #[test]
    fn mock_identify_without_dimensions_is_decode_error() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.identify(&[1, 2, 3]),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn mock_records_render() {
        let backend = MockBackend::new();

        let out = backend
            .render(
                &[0u8; 4],
                &RenderParams {
                    width: 1920,
                    height: 1080,
                    format: OutputFormat::Jpeg,
                    quality: Quality::new(85),
                },
            )
            .unwrap();
        assert_eq!(out, MOCK_OUTPUT);

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Render {
                width: 1920,
                height: 1080,
                format: OutputFormat::Jpeg,
                quality: 85,
                ..
            }
        ));
    }
}
