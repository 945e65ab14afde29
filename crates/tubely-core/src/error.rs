//! Unified error type for the tubely asset pipeline.
//!
//! Every stage of the pipeline funnels its failures into [`Error`], which
//! carries enough context for an HTTP layer to derive a status code via
//! [`Error::http_status`].

use std::path::PathBuf;

/// Unified error type covering all failure modes of the asset pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The secure random source could not produce bytes.
    #[error("Random source failure: {0}")]
    RandomSource(String),

    /// An external tool (ffprobe, ffmpeg) failed to start or exited non-zero.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description, including captured stderr.
        message: String,
    },

    /// A tool ran but its output could not be parsed.
    #[error("Malformed {tool} output: {message}")]
    MalformedOutput {
        /// Name of the tool whose output was rejected.
        tool: String,
        /// Parser diagnostic.
        message: String,
    },

    /// The probed file reports no media streams at all.
    #[error("No media streams found in {}", path.display())]
    NoMediaStreams {
        /// The file that was probed.
        path: PathBuf,
    },

    /// A processing step reported success but produced a zero-byte file.
    #[error("Processed file is empty: {}", path.display())]
    EmptyOutput {
        /// The empty output file.
        path: PathBuf,
    },

    /// A local file could not be created, inspected or written.
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        /// The path the operation targeted.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An I/O operation failed outside of a specific path.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Request data failed validation (unsupported media type, oversize upload).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The object-store collaborator rejected an upload.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NoMediaStreams { .. } => 422,
            Error::MalformedOutput { .. } => 502,
            Error::Tool { .. } => 502,
            Error::Storage(_) => 502,
            Error::RandomSource(_) => 500,
            Error::EmptyOutput { .. } => 500,
            Error::Filesystem { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::MalformedOutput`].
    pub fn malformed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedOutput {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Filesystem`].
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
