//! CLI output formatting for the `compress` and `check` commands.
//!
//! # Output Format
//!
//! ## Compress
//!
//! ```text
//! Compressing 2 files
//! [ 50%] 001 villa-front.jpeg
//! [100%] 002 broken.png
//! Done: 1 compressed, 1 failed
//! 001 villa-front.jpeg
//!     3.1 MiB → 402.7 KiB (jpeg 1920×1280, was 4032×2688)
//!     Saved: out/villa-front.jpg
//! 002 broken.png
//!     Error: broken.png: could not decode image: ...
//! ```
//!
//! ## Check
//!
//! ```text
//! Config
//!     Listen: 127.0.0.1:8080
//!     Data: ./data
//!     Media: ./media
//!     Admin API: enabled
//! Collections
//!     properties: 12
//!     portfolio: 7
//! Media
//!     31 files, 18.2 MiB
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::ADMIN_TOKEN_ENV;
use crate::imaging::{BatchEvent, Compression, FileOutcome, OutputFormat};
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count: `512 B`, `12.5 KiB`, `3.1 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

// ============================================================================
// Compress
// ============================================================================

/// Format a batch progress event as one line.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            let noun = if *total == 1 { "file" } else { "files" };
            vec![format!("Compressing {total} {noun}")]
        }
        BatchEvent::FileDone {
            index,
            name,
            percent,
            ..
        } => vec![format!("[{:>3}%] {} {}", percent, format_index(index + 1), name)],
        BatchEvent::Finished { succeeded, failed } => {
            vec![format!("Done: {succeeded} compressed, {failed} failed")]
        }
    }
}

/// One file's result: index and name, then sizes, what happened, and where
/// the output went.
pub fn format_file_outcome(outcome: &FileOutcome, saved_to: Option<&Path>) -> Vec<String> {
    let mut lines = vec![format!("{} {}", format_index(outcome.index + 1), outcome.name)];
    match &outcome.result {
        Ok(compressed) => {
            let before = format_bytes(compressed.original_size as u64);
            let after = format_bytes(compressed.file.size() as u64);
            match &compressed.compression {
                Compression::Unchanged => {
                    lines.push(format!("{}{} (unchanged, below threshold)", indent(1), before));
                }
                Compression::Reencoded {
                    format,
                    original,
                    width,
                    height,
                } => {
                    let format = match format {
                        OutputFormat::Jpeg => "jpeg",
                        OutputFormat::Png => "png",
                    };
                    lines.push(format!(
                        "{}{} → {} ({} {}×{}, was {}×{})",
                        indent(1),
                        before,
                        after,
                        format,
                        width,
                        height,
                        original.width,
                        original.height
                    ));
                }
            }
            if let Some(path) = saved_to {
                lines.push(format!("{}Saved: {}", indent(1), path.display()));
            }
        }
        Err(e) => lines.push(format!("{}Error: {}", indent(1), e)),
    }
    lines
}

pub fn print_file_outcome(outcome: &FileOutcome, saved_to: Option<&Path>) {
    print_lines(format_file_outcome(outcome, saved_to));
}

// ============================================================================
// Check
// ============================================================================

/// Everything `check` found, gathered by the caller.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub media_dir: PathBuf,
    pub admin_enabled: bool,
    /// Collection name and its document count, or the error loading it.
    pub collections: Vec<(&'static str, Result<usize, String>)>,
    pub media_files: usize,
    pub media_bytes: u64,
}

impl CheckReport {
    /// True when every collection loaded.
    pub fn is_healthy(&self) -> bool {
        self.collections.iter().all(|(_, r)| r.is_ok())
    }
}

pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = vec!["Config".to_string()];
    lines.push(format!("{}Listen: {}", indent(1), report.bind_address));
    lines.push(format!("{}Data: {}", indent(1), report.data_dir.display()));
    lines.push(format!("{}Media: {}", indent(1), report.media_dir.display()));
    if report.admin_enabled {
        lines.push(format!("{}Admin API: enabled", indent(1)));
    } else {
        lines.push(format!(
            "{}Admin API: disabled ({ADMIN_TOKEN_ENV} not set)",
            indent(1)
        ));
    }

    lines.push("Collections".to_string());
    for (name, result) in &report.collections {
        match result {
            Ok(count) => lines.push(format!("{}{}: {}", indent(1), name, count)),
            Err(e) => lines.push(format!("{}{}: ERROR {}", indent(1), name, e)),
        }
    }

    lines.push("Media".to_string());
    let noun = if report.media_files == 1 { "file" } else { "files" };
    lines.push(format!(
        "{}{} {}, {}",
        indent(1),
        report.media_files,
        noun,
        format_bytes(report.media_bytes)
    ));
    lines
}

pub fn print_check_report(report: &CheckReport) {
    print_lines(format_check_report(report));
}
