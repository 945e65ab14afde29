//! Tubely - media asset pipeline for video hosting.
//!
//! Uploaded media is stored under an unguessable content key. Videos are
//! probed for their aspect ratio and remuxed for fast-start playback before
//! being handed to an object store; thumbnails are kept in a local asset
//! directory. See [`pipeline::AssetPipeline`] for the end-to-end flow.

pub mod keys;
pub mod pipeline;
pub mod record;
pub mod storage;

pub use keys::{AssetKey, KeyGenerator, OsRandom, RandomSource};
pub use pipeline::{AssetPipeline, PublishedVideo};
pub use record::VideoRecord;
pub use storage::{build_object_url, LocalAssetStore, ObjectLocation, ObjectUploader};
