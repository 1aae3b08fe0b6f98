//! Content-addressed media storage.
//!
//! Compressed uploads are written to the media directory as
//! `<sha256>.<ext>`, so uploading the same bytes twice yields one file and
//! one URL. The server exposes the directory at [`MEDIA_URL_PREFIX`].
//!
//! The extension comes from sniffing the bytes, never from the uploaded
//! name. Content that is not a JPEG, PNG, WebP or TIFF image is refused, so
//! the directory only ever serves images.

use crate::types::UploadFile;
use image::ImageFormat;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

/// URL path under which media files are served.
pub const MEDIA_URL_PREFIX: &str = "/media";

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to list media: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{name}: not a supported image ({mime})")]
    NotAnImage { name: String, mime: String },
}

/// A stored media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaEntry {
    pub name: String,
    pub size: u64,
    pub url: String,
}

impl MediaEntry {
    fn new(name: String, size: u64) -> Self {
        let url = format!("{MEDIA_URL_PREFIX}/{name}");
        Self { name, size, url }
    }
}

/// SHA-256 of `data` as lowercase hex.
pub fn content_hash(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Extension for the image format the bytes actually contain.
fn sniffed_extension(data: &[u8]) -> Option<&'static str> {
    match image::guess_format(data).ok()? {
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::Png => Some("png"),
        ImageFormat::WebP => Some("webp"),
        ImageFormat::Tiff => Some("tiff"),
        _ => None,
    }
}

/// Storage name for a file: content hash plus the sniffed image extension.
pub fn media_file_name(file: &UploadFile) -> Result<String, MediaError> {
    let ext = sniffed_extension(&file.data).ok_or_else(|| MediaError::NotAnImage {
        name: file.name.clone(),
        mime: file.mime.clone(),
    })?;
    Ok(format!("{}.{ext}", content_hash(&file.data)))
}

/// Write `file` into `media_dir` unless identical content is already there.
pub fn save_media(media_dir: &Path, file: &UploadFile) -> Result<MediaEntry, MediaError> {
    let name = media_file_name(file)?;
    std::fs::create_dir_all(media_dir)?;
    let path = media_dir.join(&name);
    if path.exists() {
        tracing::debug!(%name, "media already stored");
    } else {
        let tmp = media_dir.join(format!(".{name}.tmp"));
        std::fs::write(&tmp, &file.data)?;
        std::fs::rename(&tmp, &path)?;
        tracing::info!(%name, bytes = file.size(), source = %file.name, "media stored");
    }
    Ok(MediaEntry::new(name, file.size() as u64))
}

/// Every stored file, sorted by name. Hidden files (temp writes) are skipped.
/// A missing directory lists as empty.
pub fn list_media(media_dir: &Path) -> Result<Vec<MediaEntry>, MediaError> {
    if !media_dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in WalkDir::new(media_dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        entries.push(MediaEntry::new(name, entry.metadata()?.len()));
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg_bytes, png_bytes};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn file_name_is_hash_plus_sniffed_extension() {
        let data = jpeg_bytes(16, 16);
        let f = UploadFile::new("Villa Front.JPEG", "image/jpeg", data.clone());
        assert_eq!(
            media_file_name(&f).unwrap(),
            format!("{}.jpg", content_hash(&data))
        );
    }

    #[test]
    fn extension_ignores_uploaded_name() {
        let f = UploadFile::new("logo.html", "image/png", png_bytes(8, 8, false));
        assert!(media_file_name(&f).unwrap().ends_with(".png"));
    }

    #[test]
    fn non_image_content_is_refused() {
        let tmp = TempDir::new().unwrap();
        let f = UploadFile::new("x.jpg", "image/jpeg", b"<script>alert(1)</script>".to_vec());
        assert!(matches!(
            save_media(tmp.path(), &f),
            Err(MediaError::NotAnImage { .. })
        ));
        assert!(list_media(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn save_writes_once_per_content() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("media");
        let data = png_bytes(12, 10, true);
        let file = UploadFile::new("a.png", "image/png", data.clone());

        let a = save_media(&dir, &file).unwrap();
        let b = save_media(&dir, &file).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.size, data.len() as u64);
        assert!(a.url.starts_with("/media/"));
        assert_eq!(fs::read(dir.join(&a.name)).unwrap(), data);
        assert_eq!(list_media(&dir).unwrap().len(), 1);
    }

    #[test]
    fn list_is_sorted_and_skips_hidden() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.jpg"), b"22").unwrap();
        fs::write(tmp.path().join("a.png"), b"1").unwrap();
        fs::write(tmp.path().join(".partial.tmp"), b"x").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();

        let listed = list_media(tmp.path()).unwrap();
        let names: Vec<&str> = listed.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.png", "b.jpg"]);
        assert_eq!(listed[1].size, 2);
        assert_eq!(listed[1].url, "/media/b.jpg");
    }

    #[test]
    fn missing_dir_lists_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(list_media(&tmp.path().join("nope")).unwrap().is_empty());
    }
}
