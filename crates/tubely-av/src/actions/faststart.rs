//! Fast-start remuxing using ffmpeg.
//!
//! Copies every stream without re-encoding and moves the MP4 index (`moov`)
//! ahead of the media data so playback can begin before the download
//! completes.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tubely_core::{Error, Result};

use crate::command::ToolRunner;
use crate::tools::ToolConfig;

/// Suffix appended to the input path to name the remuxed file.
pub const PROCESSING_SUFFIX: &str = ".processing";

/// The output path for `input`: the input path with [`PROCESSING_SUFFIX`]
/// appended (`clip.mp4` -> `clip.mp4.processing`).
pub fn processing_path(input: &Path) -> PathBuf {
    let mut path = OsString::from(input.as_os_str());
    path.push(PROCESSING_SUFFIX);
    PathBuf::from(path)
}

/// Remuxes videos for progressive playback.
///
/// Neither the input nor the output file is deleted here; the caller owns
/// both.
#[derive(Clone)]
pub struct FastStartTranscoder {
    ffmpeg: ToolConfig,
    runner: Arc<dyn ToolRunner>,
}

impl FastStartTranscoder {
    /// Create a transcoder that runs `ffmpeg` through `runner`.
    pub fn new(ffmpeg: ToolConfig, runner: Arc<dyn ToolRunner>) -> Self {
        Self { ffmpeg, runner }
    }

    /// Remux `input` into [`processing_path`]`(input)` and return that path.
    ///
    /// # Errors
    ///
    /// - [`Error::Tool`] if ffmpeg cannot be started or exits non-zero; the
    ///   message carries ffmpeg's stderr.
    /// - [`Error::Filesystem`] if the output file cannot be inspected after
    ///   the run (typically because it was never written).
    /// - [`Error::EmptyOutput`] if the output file exists but is empty.
    pub async fn remux(&self, input: &Path) -> Result<PathBuf> {
        let output = processing_path(input);
        tracing::info!("fast-start remux {:?} -> {:?}", input, output);

        let mut cmd = self.ffmpeg.command();
        cmd.arg("-y");
        cmd.arg("-i").arg(input);
        cmd.args(["-movflags", "faststart", "-codec", "copy", "-f", "mp4"]);
        cmd.arg(&output);

        self.runner.run(&cmd).await?;

        let metadata = tokio::fs::metadata(&output)
            .await
            .map_err(|e| Error::filesystem(&output, e))?;
        if metadata.len() == 0 {
            return Err(Error::EmptyOutput { path: output });
        }

        tracing::debug!(bytes = metadata.len(), "remux complete: {:?}", output);
        Ok(output)
    }
}
