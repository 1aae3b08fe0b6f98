//! Sequential batch compression with progress events.
//!
//! Files are compressed one at a time so only one decoded bitmap is alive at
//! any moment. Results come back in input order, one [`FileOutcome`] per
//! file; a failure affects only its own file.
//!
//! Progress is reported over an optional channel, mirroring how the CLI
//! prints events from a separate thread while work is in flight.

use super::backend::ImageBackend;
use super::operations::{CompressError, CompressedFile, CompressionConfig, compress};
use crate::types::UploadFile;
use std::sync::mpsc::Sender;

/// Progress events emitted during a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Started { total: usize },
    FileDone {
        index: usize,
        name: String,
        ok: bool,
        /// Completed files as a percentage of the batch (0-100).
        percent: u8,
    },
    Finished { succeeded: usize, failed: usize },
}

/// Outcome for one input file, at the file's input position.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub index: usize,
    pub name: String,
    pub result: Result<CompressedFile, CompressError>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Percentage of `completed` out of `total`, floored. `total == 0` is 100.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed.min(total) * 100) / total) as u8
}

/// Compress `files` in order, one at a time.
///
/// An empty batch returns an empty list and emits no events.
pub fn compress_batch(
    backend: &impl ImageBackend,
    files: Vec<UploadFile>,
    config: &CompressionConfig,
    events: Option<Sender<BatchEvent>>,
) -> Vec<FileOutcome> {
    let total = files.len();
    if total == 0 {
        return Vec::new();
    }

    let emit = |event: BatchEvent| {
        if let Some(tx) = &events {
            // A dropped receiver only means nobody is watching.
            tx.send(event).ok();
        }
    };

    emit(BatchEvent::Started { total });

    let mut outcomes = Vec::with_capacity(total);
    for (index, file) in files.into_iter().enumerate() {
        let result = compress(backend, &file, config);
        if let Err(e) = &result {
            tracing::warn!(file = %file.name, error = %e, "compression failed");
        }
        emit(BatchEvent::FileDone {
            index,
            name: file.name.clone(),
            ok: result.is_ok(),
            percent: progress_percent(index + 1, total),
        });
        outcomes.push(FileOutcome {
            index,
            name: file.name,
            result,
        });
    }

    let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
    emit(BatchEvent::Finished {
        succeeded,
        failed: total - succeeded,
    });

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::Dimensions;
    use crate::imaging::backend::tests::MockBackend;
    use std::sync::mpsc;

    fn big(name: &str) -> UploadFile {
        UploadFile::new(name, "image/jpeg", vec![7u8; 600 * 1024])
    }

    fn small(name: &str) -> UploadFile {
        UploadFile::new(name, "image/jpeg", vec![1u8; 10])
    }

    fn percents(events: &[BatchEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                BatchEvent::FileDone { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn progress_percent_values() {
        assert_eq!(progress_percent(0, 3), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(0, 0), 100);
    }

    #[test]
    fn batch_preserves_input_order() {
        let backend = MockBackend::with_dimensions(vec![
            Dimensions { width: 10, height: 10 },
            Dimensions { width: 10, height: 10 },
        ]);
        let files = vec![big("a.jpg"), small("b.jpg"), big("c.jpg")];

        let out = compress_batch(&backend, files, &CompressionConfig::default(), None);

        let names: Vec<&str> = out.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["a.jpg", "b.jpg", "c.jpg"]);
        let indices: Vec<usize> = out.iter().map(|o| o.index).collect();
        assert_eq!(indices, [0, 1, 2]);
        assert!(out.iter().all(FileOutcome::is_ok));
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_100() {
        let backend = MockBackend::new();
        let files: Vec<UploadFile> = (0..7).map(|i| small(&format!("{i}.jpg"))).collect();
        let (tx, rx) = mpsc::channel();

        compress_batch(&backend, files, &CompressionConfig::default(), Some(tx));

        let events: Vec<BatchEvent> = rx.iter().collect();
        let p = percents(&events);
        assert_eq!(p.len(), 7);
        assert!(p.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*p.last().unwrap(), 100);
        assert_eq!(events.first(), Some(&BatchEvent::Started { total: 7 }));
        assert_eq!(
            events.last(),
            Some(&BatchEvent::Finished {
                succeeded: 7,
                failed: 0
            })
        );
    }

    #[test]
    fn one_failure_does_not_abort_the_batch() {
        // Only one set of dimensions: the second large file fails to decode.
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 50,
            height: 50,
        }]);
        let files = vec![big("ok.jpg"), big("bad.jpg"), small("tiny.jpg")];
        let (tx, rx) = mpsc::channel();

        let out = compress_batch(&backend, files, &CompressionConfig::default(), Some(tx));

        assert!(out[0].is_ok());
        assert!(matches!(
            out[1].result,
            Err(CompressError::Decode { ref file, .. }) if file == "bad.jpg"
        ));
        assert!(out[2].is_ok());

        let events: Vec<BatchEvent> = rx.iter().collect();
        assert_eq!(
            events.last(),
            Some(&BatchEvent::Finished {
                succeeded: 2,
                failed: 1
            })
        );
        assert_eq!(*percents(&events).last().unwrap(), 100);
    }

    #[test]
    fn empty_batch_emits_nothing() {
        let backend = MockBackend::new();
        let (tx, rx) = mpsc::channel();
        let out = compress_batch(&backend, Vec::new(), &CompressionConfig::default(), Some(tx));
        assert!(out.is_empty());
        assert_eq!(rx.iter().count(), 0);
    }

    #[test]
    fn dropped_receiver_does_not_panic() {
        let backend = MockBackend::new();
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let out = compress_batch(
            &backend,
            vec![small("x.jpg")],
            &CompressionConfig::default(),
            Some(tx),
        );
        assert_eq!(out.len(), 1);
    }
}
