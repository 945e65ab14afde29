//! Media processing actions.
//!
//! Currently a single operation: remuxing a video for fast-start playback.

mod faststart;

pub use faststart::{processing_path, FastStartTranscoder, PROCESSING_SUFFIX};
