//! Object locations and the storage collaborators the pipeline hands files to.
//!
//! Published videos live in an S3-style bucket addressed by
//! [`ObjectLocation`]; the actual transfer is delegated to an
//! [`ObjectUploader`]. Thumbnails are written to a [`LocalAssetStore`] and
//! served from the application's `/assets/` route.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tubely_av::workspace::write_limited;
use tubely_core::{Error, Result};

/// Public URL for `key` in a region-scoped S3 bucket.
///
/// Pure formatting: neither the bucket nor the region is checked.
pub fn build_object_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{bucket}.s3.{region}.amazonaws.com/{key}")
}

/// Where a published object lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub region: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            key: key.into(),
        }
    }

    /// Fully-qualified public retrieval URL.
    pub fn url(&self) -> String {
        build_object_url(&self.bucket, &self.region, &self.key)
    }
}

/// Uploads local files to an object store.
///
/// Implementations report any failure as an error; the pipeline does not
/// retry.
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    /// Store the file at `path` as `key` in `bucket`.
    async fn put_object(&self, bucket: &str, key: &str, path: &Path, content_type: &str)
        -> Result<()>;
}

/// Reject keys that could resolve outside a storage root.
fn validate_key(key: &str) -> Result<()> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || Path::new(key)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
    if invalid {
        return Err(Error::Validation(format!("invalid storage key: {key:?}")));
    }
    Ok(())
}

/// Filesystem directory served under `{base_url}/assets/`.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
    base_url: String,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create the asset root if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Error::filesystem(&self.root, e))
    }

    /// Path on disk for `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    /// Public URL for `key`.
    pub fn url(&self, key: &str) -> String {
        format!("{}/assets/{}", self.base_url, key)
    }

    /// Stream `reader` into the asset `key`, refusing more than `limit`
    /// bytes. A partially written file is removed on failure.
    pub async fn store<R>(&self, key: &str, reader: R, limit: u64) -> Result<PathBuf>
    where
        R: AsyncRead + Unpin,
    {
        let path = self.path_for(key)?;
        self.ensure_dir().await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::filesystem(parent, e))?;
        }

        let result = write_limited(&path, reader, limit).await;
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!("failed to remove partial asset {:?}: {e}", path);
            }
        }
        result.map(|_| path)
    }
}

/// Mirrors objects into `{root}/{bucket}/{key}`, for running the pipeline
/// without a network object store.
#[async_trait]
impl ObjectUploader for LocalAssetStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<()> {
        validate_key(bucket)?;
        let dest = self.path_for(&format!("{bucket}/{key}"))?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::filesystem(parent, e))?;
        }

        let bytes = tokio::fs::copy(path, &dest)
            .await
            .map_err(|e| Error::Storage(format!("copy to {}: {e}", dest.display())))?;
        tracing::info!(bucket, key, content_type, bytes, "stored object locally");
        Ok(())
    }
}
