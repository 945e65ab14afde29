//! Unguessable asset keys.
//!
//! A key is 32 bytes from a secure random source, encoded as unpadded
//! URL-safe base64, followed by an extension derived from the upload's
//! media type. The extension goes through [`safe_extension`], so a key never
//! contains `/` or `..`.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use tubely_core::media::safe_extension;
use tubely_core::{Error, Result};

/// Number of random bytes in every key.
pub const KEY_BYTES: usize = 32;

/// A source of cryptographically secure random bytes.
pub trait RandomSource: Send + Sync {
    /// Fill `buf` entirely, or fail.
    fn fill(&self, buf: &mut [u8]) -> Result<()>;
}

/// The operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| Error::RandomSource(e.to_string()))
    }
}

/// The name of a stored object, without any namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    token: String,
    extension: String,
}

impl AssetKey {
    /// The random, URL-safe part of the key.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The extension, including the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The key placed under `prefix` (`landscape/<token>.mp4`).
    pub fn namespaced(&self, prefix: &str) -> String {
        format!("{prefix}/{self}")
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.token, self.extension)
    }
}

/// Produces [`AssetKey`]s from an injected [`RandomSource`].
#[derive(Clone)]
pub struct KeyGenerator {
    source: Arc<dyn RandomSource>,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new(Arc::new(OsRandom))
    }
}

impl KeyGenerator {
    pub fn new(source: Arc<dyn RandomSource>) -> Self {
        Self { source }
    }

    /// Generate a key for an upload of `media_type`.
    ///
    /// # Panics
    ///
    /// Panics if the random source fails.
    pub fn new_asset_key(&self, media_type: &str) -> AssetKey {
        match self.try_new_asset_key(media_type) {
            Ok(key) => key,
            Err(e) => panic!("unable to generate asset key: {e}"),
        }
    }

    /// Like [`KeyGenerator::new_asset_key`], returning
    /// [`Error::RandomSource`] instead of panicking.
    pub fn try_new_asset_key(&self, media_type: &str) -> Result<AssetKey> {
        let mut bytes = [0u8; KEY_BYTES];
        self.source.fill(&mut bytes)?;

        Ok(AssetKey {
            token: URL_SAFE_NO_PAD.encode(bytes),
            extension: safe_extension(media_type),
        })
    }
}
