//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the locations of ffmpeg and
//! ffprobe and hands out [`ToolConfig`]s carrying the resolved path and the
//! configured timeout.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tubely_core::config::ToolsConfig;
use tubely_core::{Error, Result};

use crate::command::{ToolCommand, DEFAULT_TIMEOUT};

/// Tool used for probing stream metadata.
pub const FFPROBE: &str = "ffprobe";
/// Tool used for remuxing.
pub const FFMPEG: &str = "ffmpeg";

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &[FFMPEG, FFPROBE];

/// Resolved configuration for a single external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Human-readable tool name (e.g. "ffmpeg").
    pub name: String,
    /// Path to the executable.
    pub path: PathBuf,
    /// Maximum execution time before the tool is killed.
    pub timeout: Duration,
}

impl ToolConfig {
    /// A tool config with the default timeout.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Start a command for this tool.
    pub fn command(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.path.clone());
        cmd.timeout(self.timeout);
        cmd
    }
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool configurations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolConfig>,
}

impl ToolRegistry {
    /// Discover tools by searching `PATH` (or using overrides from config).
    ///
    /// A configured path is used when it exists; otherwise [`which::which`]
    /// locates the tool. Tools that are not found are omitted.
    pub fn discover(config: &ToolsConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut registry = Self::default();

        for &name in KNOWN_TOOLS {
            let custom_path = match name {
                FFMPEG => config.ffmpeg_path.as_deref(),
                FFPROBE => config.ffprobe_path.as_deref(),
                _ => None,
            };

            match resolve(name, custom_path) {
                Some(path) => {
                    tracing::debug!(tool = name, path = %path.display(), "discovered tool");
                    registry.insert(ToolConfig::new(name, path).with_timeout(timeout));
                }
                None => tracing::debug!(tool = name, "tool not found"),
            }
        }

        registry
    }

    /// Register (or replace) a tool.
    pub fn insert(&mut self, tool: ToolConfig) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Return the [`ToolConfig`] for the given tool, or an [`Error::Tool`] if
    /// the tool was not found during discovery.
    pub fn require(&self, name: &str) -> Result<&ToolConfig> {
        self.tools
            .get(name)
            .ok_or_else(|| Error::tool(name, format!("{name} not found; is it installed and in PATH?")))
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(cfg) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(&cfg.path),
                    path: Some(cfg.path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

fn resolve(name: &str, custom_path: Option<&Path>) -> Option<PathBuf> {
    match custom_path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => {
            tracing::warn!(tool = name, path = %p.display(), "configured tool path does not exist; searching PATH");
            which::which(name).ok()
        }
        None => which::which(name).ok(),
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_with_default_config() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        // We cannot guarantee any tool is installed in CI,
        // but the call itself must not panic.
        let _ = registry.check_all();
    }

    #[test]
    fn require_missing_tool_returns_error() {
        let registry = ToolRegistry::default();
        let err = registry.require(FFPROBE).unwrap_err();
        assert!(matches!(err, Error::Tool { .. }));
        assert!(err.to_string().contains("ffprobe not found"));
    }

    #[test]
    fn check_all_returns_known_tools() {
        let infos = ToolRegistry::default().check_all();
        let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["ffmpeg", "ffprobe"]);
        assert!(infos.iter().all(|i| !i.available));
    }

    #[test]
    fn inserted_tool_carries_timeout_into_commands() {
        let mut registry = ToolRegistry::default();
        registry.insert(ToolConfig::new(FFMPEG, "/opt/ffmpeg/bin/ffmpeg").with_timeout(Duration::from_secs(7)));

        let tool = registry.require(FFMPEG).unwrap();
        let cmd = tool.command();
        assert_eq!(cmd.program(), Path::new("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(cmd.get_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn discover_uses_existing_custom_path() {
        let fake = tempfile::NamedTempFile::new().unwrap();
        let config = ToolsConfig {
            ffprobe_path: Some(fake.path().to_path_buf()),
            timeout_secs: 12,
            ..ToolsConfig::default()
        };
        let registry = ToolRegistry::discover(&config);
        let ffprobe = registry.require(FFPROBE).unwrap();
        assert_eq!(ffprobe.path, fake.path());
        assert_eq!(ffprobe.timeout, Duration::from_secs(12));
    }
}
