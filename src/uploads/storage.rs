use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};
use uuid::Uuid;

/// MIME types accepted for upload
pub const ALLOWED_MIME_TYPES: [&str; 4] = ["audio/mpeg", "audio/wav", "audio/webm", "audio/mp3"];

/// Extension used when the client's filename has none
pub const DEFAULT_EXTENSION: &str = ".webm";

/// Whether a declared content type is on the allow-list
///
/// Compares the MIME essence only: `audio/webm;codecs=opus` is accepted.
pub fn is_allowed_mime(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    ALLOWED_MIME_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

/// A file that has been fully written to the upload directory
///
/// Until [`StoredFile::commit`] is called the file is removed again when this
/// value is dropped, including when the request future is cancelled.
#[derive(Debug)]
pub struct StoredFile {
    /// Name under the upload directory (what `/uploads/<filename>` serves)
    pub filename: String,

    /// Full path on disk
    pub path: PathBuf,

    /// Bytes written
    pub size: u64,

    committed: bool,
}

impl StoredFile {
    /// Keep the file; called once a record references it
    pub fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for StoredFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => warn!("Discarded upload {}", self.filename),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove upload {:?}: {}", self.path, e),
        }
    }
}

/// Upload directory
#[derive(Debug, Clone)]
pub struct UploadStorage {
    dir: PathBuf,
}

impl UploadStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it doesn't exist
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create upload directory: {:?}", self.dir))
    }

    /// Start writing a new upload
    ///
    /// The name is derived from the current time, a random suffix, and the
    /// extension of `original_name`.
    pub async fn create(&self, original_name: Option<&str>) -> Result<UploadWriter> {
        let filename = stored_name(original_name);
        let path = self.dir.join(&filename);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to create upload file: {:?}", path))?;

        Ok(UploadWriter {
            writer: BufWriter::new(file),
            file: StoredFile {
                filename,
                path,
                size: 0,
                committed: false,
            },
        })
    }
}

/// `<unix-millis>-<8 hex chars><ext>`
pub(crate) fn stored_name(original_name: Option<&str>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}{}",
        Utc::now().timestamp_millis(),
        &suffix[..8],
        extension_of(original_name)
    )
}

/// Extension of the client's filename including the dot, or the default
///
/// Anything that isn't a short alphanumeric extension falls back to the
/// default so client input never shapes the path beyond the suffix.
fn extension_of(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Writes a single upload to disk
///
/// Dropping the writer before [`UploadWriter::finish`] deletes the partial file.
pub struct UploadWriter {
    writer: BufWriter<File>,
    file: StoredFile,
}

impl UploadWriter {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.writer
            .write_all(chunk)
            .await
            .with_context(|| format!("Failed to write upload: {:?}", self.file.path))?;
        self.file.size += chunk.len() as u64;
        Ok(())
    }

    /// Flush to disk and hand back the stored (still uncommitted) file
    pub async fn finish(mut self) -> Result<StoredFile> {
        self.writer
            .flush()
            .await
            .with_context(|| format!("Failed to flush upload: {:?}", self.file.path))?;

        info!("Stored upload {} ({} bytes)", self.file.filename, self.file.size);

        Ok(self.file)
    }
}
