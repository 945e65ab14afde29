//! Upload-to-URL asset pipeline.
//!
//! [`AssetPipeline`] turns an uploaded stream into a published asset:
//!
//! 1. validate the declared media type
//! 2. persist the stream into an [`UploadWorkspace`]
//! 3. probe the aspect ratio ([`AspectProber`])
//! 4. remux for fast start ([`FastStartTranscoder`]) and rename over the raw file
//! 5. upload under `<aspect-prefix>/<asset-key>` ([`ObjectUploader`])
//! 6. build the public URL and, for `publish_*`, update the [`VideoRecord`]
//!
//! Any failure aborts the upload. The record is only modified after the
//! upload succeeds, and the workspace (with every intermediate file) is
//! removed when the call returns, whichever way it returns.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tubely_av::tools::{FFMPEG, FFPROBE};
use tubely_av::{AspectProber, FastStartTranscoder, ToolRegistry, ToolRunner, UploadWorkspace};
use tubely_core::config::{Config, S3Config, UploadConfig};
use tubely_core::{AspectRatio, Error, MediaType, Result};

use crate::keys::KeyGenerator;
use crate::record::VideoRecord;
use crate::storage::{LocalAssetStore, ObjectLocation, ObjectUploader};

/// Media types accepted as thumbnails.
pub const THUMBNAIL_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Media types accepted as videos.
pub const VIDEO_TYPES: &[&str] = &["video/mp4"];

/// A video that has been processed and uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedVideo {
    pub location: ObjectLocation,
    pub aspect_ratio: AspectRatio,
    pub url: String,
}

/// Orchestrates key generation, probing, remuxing and upload.
pub struct AssetPipeline {
    keys: KeyGenerator,
    prober: AspectProber,
    transcoder: FastStartTranscoder,
    uploader: Arc<dyn ObjectUploader>,
    assets: LocalAssetStore,
    s3: S3Config,
    limits: UploadConfig,
    scratch_dir: Option<PathBuf>,
}

impl AssetPipeline {
    pub fn new(
        prober: AspectProber,
        transcoder: FastStartTranscoder,
        uploader: Arc<dyn ObjectUploader>,
        assets: LocalAssetStore,
        s3: S3Config,
    ) -> Self {
        Self {
            keys: KeyGenerator::default(),
            prober,
            transcoder,
            uploader,
            assets,
            s3,
            limits: UploadConfig::default(),
            scratch_dir: None,
        }
    }

    /// Build a pipeline from configuration and discovered tools.
    ///
    /// # Errors
    ///
    /// [`Error::Tool`] if ffprobe or ffmpeg is not available.
    pub fn from_config(
        config: &Config,
        tools: &ToolRegistry,
        runner: Arc<dyn ToolRunner>,
        uploader: Arc<dyn ObjectUploader>,
    ) -> Result<Self> {
        let prober = AspectProber::new(tools.require(FFPROBE)?.clone(), runner.clone())
            .with_tolerance(config.probe.tolerance());
        let transcoder = FastStartTranscoder::new(tools.require(FFMPEG)?.clone(), runner);
        let assets = LocalAssetStore::new(&config.assets.root, config.assets_base_url());

        Ok(Self::new(prober, transcoder, uploader, assets, config.s3.clone())
            .with_limits(config.upload.clone()))
    }

    /// Use a specific key generator.
    pub fn with_keys(mut self, keys: KeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    /// Override the upload size limits.
    pub fn with_limits(mut self, limits: UploadConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Create upload workspaces beneath `dir` instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    fn workspace(&self) -> Result<UploadWorkspace> {
        match &self.scratch_dir {
            Some(dir) => UploadWorkspace::new_in(dir),
            None => UploadWorkspace::new(),
        }
    }

    /// Process and upload a video without touching any record.
    pub async fn process_video<R>(&self, media_type: &str, reader: R) -> Result<PublishedVideo>
    where
        R: AsyncRead + Unpin + Send,
    {
        let media_type = accept(media_type, VIDEO_TYPES)?;
        let workspace = self.workspace()?;

        let key = self.keys.new_asset_key(media_type.as_str());
        let raw = workspace
            .write_stream(&key.to_string(), reader, self.limits.max_video_bytes)
            .await?;

        let aspect_ratio = self.prober.aspect_ratio(&raw).await?;
        let processed = self.transcoder.remux(&raw).await?;
        let optimized = workspace.replace(&processed, &raw).await?;

        let location = ObjectLocation::new(
            &self.s3.bucket,
            &self.s3.region,
            key.namespaced(aspect_ratio.key_prefix()),
        );
        self.uploader
            .put_object(&location.bucket, &location.key, &optimized, media_type.as_str())
            .await?;

        let url = location.url();
        tracing::info!(key = %location.key, aspect = %aspect_ratio, "published video");

        Ok(PublishedVideo {
            location,
            aspect_ratio,
            url,
        })
    }

    /// Process and upload a video, then point `record` at it.
    pub async fn publish_video<R>(
        &self,
        record: &mut VideoRecord,
        media_type: &str,
        reader: R,
    ) -> Result<PublishedVideo>
    where
        R: AsyncRead + Unpin + Send,
    {
        tracing::info!(video_id = %record.id, user_id = %record.user_id, "uploading video");
        let published = self.process_video(media_type, reader).await?;

        record.video_url = Some(published.url.clone());
        record.aspect_ratio = Some(published.aspect_ratio);
        record.touch();
        Ok(published)
    }

    /// Store a thumbnail in the local asset directory and point `record`
    /// at it. Returns the thumbnail URL.
    pub async fn publish_thumbnail<R>(
        &self,
        record: &mut VideoRecord,
        media_type: &str,
        reader: R,
    ) -> Result<String>
    where
        R: AsyncRead + Unpin + Send,
    {
        tracing::info!(video_id = %record.id, user_id = %record.user_id, "uploading thumbnail");
        let media_type = accept(media_type, THUMBNAIL_TYPES)?;

        let key = self.keys.new_asset_key(media_type.as_str()).to_string();
        self.assets
            .store(&key, reader, self.limits.max_thumbnail_bytes)
            .await?;

        let url = self.assets.url(&key);
        record.thumbnail_url = Some(url.clone());
        record.touch();
        Ok(url)
    }
}

fn accept(value: &str, accepted: &[&str]) -> Result<MediaType> {
    let media_type = MediaType::parse(value)?;
    if !media_type.is_one_of(accepted) {
        return Err(Error::Validation(format!(
            "unsupported media type {media_type}; expected one of {}",
            accepted.join(", ")
        )));
    }
    Ok(media_type)
}
