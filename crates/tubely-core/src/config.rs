//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, local assets, object storage, external tools,
//! upload limits and probing. Every section defaults sensibly so a
//! completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub assets: AssetsConfig,
    pub s3: S3Config,
    pub tools: ToolsConfig,
    pub upload: UploadConfig,
    pub probe: ProbeConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path.
    ///
    /// Defaults are used when `path` is `None` or the file does not exist.
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).map_err(|e| {
                Error::Validation(format!("invalid config file {}: {e}", path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::filesystem(path, e)),
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }
        if self.s3.bucket.trim().is_empty() {
            warnings.push("s3.bucket is empty; published URLs will be invalid".into());
        }
        if self.s3.region.trim().is_empty() {
            warnings.push("s3.region is empty; published URLs will be invalid".into());
        }
        if self.tools.timeout_secs == 0 {
            warnings.push("tools.timeout_secs is 0; every tool call will time out".into());
        }
        if self.upload.max_video_bytes == 0 || self.upload.max_thumbnail_bytes == 0 {
            warnings.push("upload limits of 0 reject every upload".into());
        }
        if let Some(tol) = self.probe.aspect_tolerance {
            if !tol.is_finite() || tol < 0.0 {
                warnings.push(format!(
                    "probe.aspect_tolerance {tol} is not a non-negative number; exact matching will be used"
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings used to build local asset URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 8091,
        }
    }
}

/// Local asset directory (thumbnails, offline object mirror).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub root: PathBuf,
    /// Base URL the asset directory is served from. Derived from the
    /// server section when unset.
    pub base_url: Option<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./assets"),
            base_url: None,
        }
    }
}

impl Config {
    /// Base URL under which `/assets/{key}` is served.
    pub fn assets_base_url(&self) -> String {
        self.assets
            .base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.server.host, self.server.port))
    }
}

/// Object-store location for published videos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "tubely-assets".into(),
            region: "us-east-1".into(),
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_tool_timeout() -> u64 {
    300
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            timeout_secs: default_tool_timeout(),
        }
    }
}

/// Upload size limits, in bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_video_bytes: u64,
    pub max_thumbnail_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_video_bytes: 1 << 30,
            max_thumbnail_bytes: 10 << 20,
        }
    }
}

/// Aspect-ratio probing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// When set, classify by ratio within this tolerance instead of the
    /// exact integer rule.
    pub aspect_tolerance: Option<f64>,
}

impl ProbeConfig {
    /// The configured tolerance, if it is usable.
    pub fn tolerance(&self) -> Option<f64> {
        self.aspect_tolerance
            .filter(|tol| tol.is_finite() && *tol >= 0.0)
    }
}
