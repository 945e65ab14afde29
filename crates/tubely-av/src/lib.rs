//! # tubely-av
//!
//! External media tool orchestration for the tubely asset pipeline.
//!
//! This crate provides:
//!
//! - **Command execution** ([`ToolCommand`], [`ToolRunner`]) -- a builder for
//!   external processes plus the runner seam that lets tests substitute a
//!   fake tool for the real one.
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Probing** ([`AspectProber`]) -- classify a video's aspect ratio from
//!   `ffprobe` stream metadata.
//! - **Fast start** ([`FastStartTranscoder`]) -- remux a video so its index
//!   precedes the media data.
//! - **Workspace management** ([`UploadWorkspace`]) -- a scoped temporary
//!   directory that is removed on every exit path.

pub mod actions;
pub mod command;
pub mod probe;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use actions::{processing_path, FastStartTranscoder, PROCESSING_SUFFIX};
pub use command::{ProcessRunner, ToolCommand, ToolOutput, ToolRunner};
pub use probe::AspectProber;
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use workspace::UploadWorkspace;
