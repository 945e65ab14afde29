//! Scoped scratch space for a single upload.
//!
//! An [`UploadWorkspace`] owns a temporary directory. The raw upload, the
//! remuxed file and anything else written beneath it are deleted when the
//! workspace is dropped, whichever way the owning pipeline call exits.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tubely_core::{Error, Result};

/// Temporary directory holding one upload's intermediate files.
///
/// # Example
///
/// ```no_run
/// use tubely_av::UploadWorkspace;
///
/// # async fn example(body: &[u8]) -> tubely_core::Result<()> {
/// let workspace = UploadWorkspace::new()?;
/// let raw = workspace.write_stream("upload.mp4", body, 1 << 30).await?;
/// // ... probe and remux `raw` ...
/// drop(workspace); // removes the directory and everything in it
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct UploadWorkspace {
    temp_dir: TempDir,
}

impl UploadWorkspace {
    /// Create a workspace under the system temp directory.
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("tubely-upload-")
            .tempdir()
            .map_err(|e| Error::filesystem(std::env::temp_dir(), e))?;
        Ok(Self { temp_dir })
    }

    /// Create a workspace beneath `parent`.
    pub fn new_in(parent: &Path) -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("tubely-upload-")
            .tempdir_in(parent)
            .map_err(|e| Error::filesystem(parent, e))?;
        Ok(Self { temp_dir })
    }

    /// Path to the temporary directory.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path for a named file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Stream `reader` into a new file named `name`, refusing more than
    /// `limit` bytes.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the stream exceeds `limit`, or
    /// [`Error::Filesystem`] if the file cannot be written.
    pub async fn write_stream<R>(&self, name: &str, reader: R, limit: u64) -> Result<PathBuf>
    where
        R: AsyncRead + Unpin,
    {
        let path = self.file(name);
        let written = write_limited(&path, reader, limit).await?;
        tracing::debug!(bytes = written, "persisted upload to {:?}", path);
        Ok(path)
    }

    /// Replace `original` with `processed` by renaming over it.
    ///
    /// Both paths must be inside this workspace so the rename stays on one
    /// filesystem.
    pub async fn replace(&self, processed: &Path, original: &Path) -> Result<PathBuf> {
        for path in [processed, original] {
            if !path.starts_with(self.dir()) {
                return Err(Error::Internal(format!(
                    "{} is outside the upload workspace",
                    path.display()
                )));
            }
        }

        tokio::fs::rename(processed, original)
            .await
            .map_err(|e| Error::filesystem(original, e))?;
        Ok(original.to_path_buf())
    }
}

/// Copy `reader` into a new file at `path`, refusing more than `limit`
/// bytes. Returns the number of bytes written.
///
/// # Errors
///
/// [`Error::Validation`] if the stream exceeds `limit`, or
/// [`Error::Filesystem`] if the file cannot be written.
pub async fn write_limited<R>(path: &Path, reader: R, limit: u64) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| Error::filesystem(path, e))?;

    // Read one byte past the limit so an oversize stream is detectable.
    let mut limited = reader.take(limit.saturating_add(1));
    let written = tokio::io::copy(&mut limited, &mut file)
        .await
        .map_err(|e| Error::filesystem(path, e))?;
    if written > limit {
        return Err(Error::Validation(format!(
            "upload exceeds the {limit} byte limit"
        )));
    }

    file.flush().await.map_err(|e| Error::filesystem(path, e))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn write_stream_persists_bytes() {
        let ws = UploadWorkspace::new().unwrap();
        let path = ws.write_stream("clip.mp4", &b"0123456789"[..], 10).await.unwrap();

        assert!(path.starts_with(ws.dir()));
        assert_eq!(std::fs::read(&path).unwrap(), b"0123456789");
    }

    #[tokio::test]
    async fn write_stream_enforces_limit() {
        let ws = UploadWorkspace::new().unwrap();
        let result = ws.write_stream("clip.mp4", &b"0123456789"[..], 9).await;
        assert_matches!(result, Err(Error::Validation(_)));
    }

    #[tokio::test]
    async fn replace_renames_over_original() {
        let ws = UploadWorkspace::new().unwrap();
        let original = ws.write_stream("clip.mp4", &b"raw"[..], 100).await.unwrap();
        let processed = ws.file("clip.mp4.processing");
        std::fs::write(&processed, b"optimized").unwrap();

        let final_path = ws.replace(&processed, &original).await.unwrap();
        assert_eq!(final_path, original);
        assert_eq!(std::fs::read(&original).unwrap(), b"optimized");
        assert!(!processed.exists());
    }

    #[tokio::test]
    async fn replace_refuses_foreign_paths() {
        let ws = UploadWorkspace::new().unwrap();
        let result = ws
            .replace(Path::new("/etc/passwd"), &ws.file("clip.mp4"))
            .await;
        assert_matches!(result, Err(Error::Internal(_)));
    }

    #[test]
    fn drop_removes_directory() {
        let parent = tempfile::tempdir().unwrap();
        let ws = UploadWorkspace::new_in(parent.path()).unwrap();
        let dir = ws.dir().to_path_buf();
        std::fs::write(ws.file("leftover.processing"), b"x").unwrap();
        assert!(dir.exists());

        drop(ws);
        assert!(!dir.exists());
    }
}
