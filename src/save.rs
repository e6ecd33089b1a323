//! Disk output for downloaded records: one image file plus one tags
//! txt sidecar per photo, and an optional JSON manifest for the whole
//! run.
//!
//! The crawl core keeps payloads in memory; persistence is the
//! consumer's concern, and this module is the consumer the CLI uses.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::fs;

use crate::post::PhotoRecord;
use crate::tool::file_extension;

/// Fallback extension when the photo URL carries none.
const DEFAULT_EXTENSION: &str = "jpg";
const MANIFEST_FILE_NAME: &str = "manifest.json";

/// What [`Saver::save`] did for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The image and its tags sidecar were written.
    Done,
    /// The image file already existed; nothing was written.
    Existed,
}

/// Writes photo records under one download directory.
///
/// Files are named `<photo_id>.<ext>` with the extension taken from the
/// photo URL, and the tags sidecar is `<photo_id>.txt`.
pub struct Saver {
    download_dir: PathBuf,
}

impl Saver {
    /// A saver rooted at `download_dir`.
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }

    /// Make sure the download directory exists.
    ///
    /// # Errors
    ///
    /// If the directory cannot be created, an error will be returned.
    pub async fn ensure(self) -> std::io::Result<Self> {
        fs::create_dir_all(&self.download_dir).await?;
        Ok(self)
    }

    /// The directory this saver writes into.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    fn image_path(&self, record: &PhotoRecord) -> PathBuf {
        let extension = file_extension(&record.photo_url).unwrap_or(DEFAULT_EXTENSION);
        self.download_dir
            .join(format!("{}.{}", record.photo_id, extension))
    }

    /// Write one record's image and its tags sidecar.
    ///
    /// A record whose image file is already present is skipped — the
    /// remote publishes no checksums, so presence is the only signal we
    /// have.
    ///
    /// # Errors
    ///
    /// Fails when the record carries no payload, or on any I/O error.
    pub async fn save(&self, record: &PhotoRecord) -> anyhow::Result<SaveOutcome> {
        let image_path = self.image_path(record);
        if fs::try_exists(&image_path)
            .await
            .with_context(|| format!("failed to check for {}", image_path.display()))?
        {
            return Ok(SaveOutcome::Existed);
        }

        let photo_bytes = record
            .photo_bytes
            .as_ref()
            .with_context(|| format!("record {} carries no photo bytes", record.photo_id))?;
        fs::write(&image_path, photo_bytes)
            .await
            .with_context(|| format!("failed to write {}", image_path.display()))?;

        let tag_path = image_path.with_extension("txt");
        fs::write(&tag_path, record.tags.join(", "))
            .await
            .with_context(|| format!("failed to write tags: {}", tag_path.display()))?;

        // success = image + tags sidecar
        Ok(SaveOutcome::Done)
    }

    /// Write the whole run's metadata as `manifest.json`.
    ///
    /// # Errors
    ///
    /// If the manifest cannot be serialized or written, an error will be returned.
    pub async fn write_manifest(&self, records: &[PhotoRecord]) -> anyhow::Result<PathBuf> {
        let manifest_path = self.download_dir.join(MANIFEST_FILE_NAME);
        let manifest =
            serde_json::to_vec_pretty(records).context("failed to serialize the manifest")?;
        fs::write(&manifest_path, manifest)
            .await
            .with_context(|| format!("failed to write {}", manifest_path.display()))?;
        Ok(manifest_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;
    use tempfile::TempDir;

    fn test_record() -> PhotoRecord {
        let mut record = PhotoRecord::new("12345", "https://media.example.com/tumblr_abc.png")
            .with_post_metadata(
                Vec::from([String::from("cat"), String::from("snow")]),
                String::from("someblog"),
            );
        record.photo_bytes = Some(Bytes::from_static(b"\x89PNG"));
        record
    }

    #[tokio::test]
    async fn test_save_writes_image_and_tags() {
        let temp_dir = TempDir::new().unwrap();
        let saver = Saver::new(temp_dir.path()).ensure().await.unwrap();

        let outcome = saver.save(&test_record()).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Done);

        let image = std::fs::read(temp_dir.path().join("12345.png")).unwrap();
        assert_eq!(image, b"\x89PNG");
        let tags = std::fs::read_to_string(temp_dir.path().join("12345.txt")).unwrap();
        assert_eq!(tags, "cat, snow");

        temp_dir.close().unwrap();
    }

    #[tokio::test]
    async fn test_save_skips_existing_image() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("12345.png"), b"already here").unwrap();
        let saver = Saver::new(temp_dir.path()).ensure().await.unwrap();

        let outcome = saver.save(&test_record()).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Existed);

        let image = std::fs::read(temp_dir.path().join("12345.png")).unwrap();
        assert_eq!(image, b"already here");

        temp_dir.close().unwrap();
    }

    #[tokio::test]
    async fn test_save_without_payload_errors() {
        let temp_dir = TempDir::new().unwrap();
        let saver = Saver::new(temp_dir.path()).ensure().await.unwrap();

        let mut record = test_record();
        record.photo_bytes = None;
        assert!(saver.save(&record).await.is_err());

        temp_dir.close().unwrap();
    }

    #[tokio::test]
    async fn test_write_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let saver = Saver::new(temp_dir.path()).ensure().await.unwrap();

        let manifest_path = saver
            .write_manifest(std::slice::from_ref(&test_record()))
            .await
            .unwrap();
        let manifest: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&manifest_path).unwrap()).unwrap();
        assert_eq!(manifest[0]["photo_id"], "12345");
        assert_eq!(manifest[0]["author"], "someblog");
        assert_eq!(manifest[0]["tags"][1], "snow");

        temp_dir.close().unwrap();
    }
}
