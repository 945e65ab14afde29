//! FFprobe-based aspect-ratio probing.
//!
//! Shells out to `ffprobe -v error -print_format json -show_streams <file>`
//! and classifies the first video stream's geometry as an [`AspectRatio`].

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tubely_core::{AspectRatio, Error, Result};

use crate::command::ToolRunner;
use crate::tools::ToolConfig;

/// Probes local video files for their aspect ratio.
#[derive(Clone)]
pub struct AspectProber {
    ffprobe: ToolConfig,
    runner: Arc<dyn ToolRunner>,
    tolerance: Option<f64>,
}

impl AspectProber {
    /// Create a prober that runs `ffprobe` through `runner`.
    pub fn new(ffprobe: ToolConfig, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            ffprobe,
            runner,
            tolerance: None,
        }
    }

    /// Classify by ratio within `tolerance` instead of the exact integer
    /// rule. `None` keeps the exact rule.
    pub fn with_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Probe `path` and classify its aspect ratio.
    ///
    /// # Errors
    ///
    /// - [`Error::Tool`] if ffprobe cannot be started or exits non-zero.
    /// - [`Error::MalformedOutput`] if stdout is not the expected JSON.
    /// - [`Error::NoMediaStreams`] if ffprobe reports no streams.
    pub async fn aspect_ratio(&self, path: &Path) -> Result<AspectRatio> {
        let (width, height) = self.dimensions(path).await?;
        let class = self.classify(width, height);

        tracing::info!(path = %path.display(), width, height, aspect = %class, "probed video");
        Ok(class)
    }

    /// Classify dimensions using this prober's rule.
    pub fn classify(&self, width: i64, height: i64) -> AspectRatio {
        match self.tolerance {
            Some(tol) => AspectRatio::classify_with_tolerance(width, height, tol),
            None => AspectRatio::classify(width, height),
        }
    }

    /// Probe `path` and return the width and height of its first video stream.
    pub async fn dimensions(&self, path: &Path) -> Result<(i64, i64)> {
        let mut cmd = self.ffprobe.command();
        cmd.args(["-v", "error", "-print_format", "json", "-show_streams"]);
        cmd.arg(path);

        let output = self.runner.run(&cmd).await?;
        parse_dimensions(path, &output.stdout)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    #[serde(default)]
    width: i64,
    #[serde(default)]
    height: i64,
}

/// Extract the geometry of the first video stream from ffprobe JSON.
///
/// Streams without a `codec_type` are considered; when no stream is tagged
/// `video` the first reported stream is used.
fn parse_dimensions(path: &Path, stdout: &str) -> Result<(i64, i64)> {
    let parsed: FfprobeOutput = serde_json::from_str(stdout)
        .map_err(|e| Error::malformed("ffprobe", format!("JSON parse error: {e}")))?;

    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .or_else(|| parsed.streams.first())
        .ok_or_else(|| Error::NoMediaStreams {
            path: path.to_path_buf(),
        })?;

    Ok((stream.width, stream.height))
}
