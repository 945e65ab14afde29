//! tubely-core: shared types, IDs, errors and configuration.
//!
//! This crate is the foundational dependency for the other tubely crates,
//! providing type-safe identifiers, a unified error type, media-domain
//! types (media types, aspect ratios) and application configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
pub use media::*;
