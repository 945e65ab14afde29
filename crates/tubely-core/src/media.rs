//! Media-domain types: declared media types and aspect-ratio classes.
//!
//! [`AspectRatio`] serializes using its display label (`"16:9"`, `"9:16"`,
//! `"other"`) so records and API payloads carry the same strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

// ---------------------------------------------------------------------------
// Extensions
// ---------------------------------------------------------------------------

/// Extension used when a media type cannot be mapped to a usable extension.
pub const FALLBACK_EXTENSION: &str = ".bin";

/// Subtypes whose name may be used verbatim as a file extension.
pub const ALLOWED_SUBTYPES: &[&str] = &[
    "mp4",
    "webm",
    "mpeg",
    "quicktime",
    "x-matroska",
    "jpeg",
    "png",
    "gif",
    "webp",
];

/// Map a `type/subtype` string to a file extension.
///
/// Splits on `/`: exactly two parts yield `"." + subtype`, anything else
/// yields [`FALLBACK_EXTENSION`]. The subtype is taken verbatim; use
/// [`safe_extension`] before the result reaches a filesystem path.
pub fn media_type_to_ext(media_type: &str) -> String {
    let parts: Vec<&str> = media_type.split('/').collect();
    if parts.len() != 2 {
        return FALLBACK_EXTENSION.to_string();
    }
    format!(".{}", parts[1])
}

/// Like [`media_type_to_ext`], but only subtypes in [`ALLOWED_SUBTYPES`]
/// survive; everything else maps to [`FALLBACK_EXTENSION`].
pub fn safe_extension(media_type: &str) -> String {
    let ext = media_type_to_ext(media_type);
    match ext.strip_prefix('.') {
        Some(subtype) if ALLOWED_SUBTYPES.contains(&subtype) => ext,
        _ => FALLBACK_EXTENSION.to_string(),
    }
}

// ---------------------------------------------------------------------------
// MediaType
// ---------------------------------------------------------------------------

/// A validated `type/subtype` media type with parameters stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    essence: String,
}

impl MediaType {
    /// Parse a `Content-Type` style value such as `image/png; charset=utf-8`.
    ///
    /// Parameters are dropped and the result is lowercased.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::Validation("missing media type".into()));
        }
        let parsed: mime::Mime = value
            .parse()
            .map_err(|e| Error::Validation(format!("invalid media type '{value}': {e}")))?;

        Ok(Self {
            essence: parsed.essence_str().to_ascii_lowercase(),
        })
    }

    /// The full `type/subtype` string.
    pub fn as_str(&self) -> &str {
        &self.essence
    }

    /// The top-level type (`video` in `video/mp4`).
    pub fn type_(&self) -> &str {
        self.essence.split('/').next().unwrap_or_default()
    }

    /// The subtype (`mp4` in `video/mp4`).
    pub fn subtype(&self) -> &str {
        self.essence.split('/').nth(1).unwrap_or_default()
    }

    /// Path-safe extension for this media type, including the leading dot.
    pub fn extension(&self) -> String {
        safe_extension(&self.essence)
    }

    /// Whether this media type is one of `accepted`.
    pub fn is_one_of(&self, accepted: &[&str]) -> bool {
        accepted.contains(&self.essence.as_str())
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essence)
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// AspectRatio
// ---------------------------------------------------------------------------

/// Geometric class of a video, derived from its pixel width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "other")]
    Other,
}

impl AspectRatio {
    /// Classify using exact integer arithmetic.
    ///
    /// `w == 16*h/9` is landscape, otherwise `h == 16*w/9` is portrait,
    /// otherwise other. Division truncates, and dimensions are not
    /// validated: a 0x0 stream classifies as landscape.
    pub fn classify(width: i64, height: i64) -> Self {
        if width == height.saturating_mul(16) / 9 {
            Self::Landscape
        } else if height == width.saturating_mul(16) / 9 {
            Self::Portrait
        } else {
            Self::Other
        }
    }

    /// Classify by comparing the real-valued ratio against 16/9 within
    /// `tolerance`. Non-positive dimensions are always [`AspectRatio::Other`].
    pub fn classify_with_tolerance(width: i64, height: i64, tolerance: f64) -> Self {
        if width <= 0 || height <= 0 {
            return Self::Other;
        }
        const WIDE: f64 = 16.0 / 9.0;
        let (w, h) = (width as f64, height as f64);

        if (w / h - WIDE).abs() <= tolerance {
            Self::Landscape
        } else if (h / w - WIDE).abs() <= tolerance {
            Self::Portrait
        } else {
            Self::Other
        }
    }

    /// The label stored on video records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Other => "other",
        }
    }

    /// Object-key namespace for videos of this class.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            "other" => Ok(Self::Other),
            _ => Err(Error::Validation(format!("unknown aspect ratio: {s}"))),
        }
    }
}
