//! The video record the pipeline publishes onto.
//!
//! Persistence belongs to the caller; the pipeline only fills in the URL
//! and aspect-ratio fields once an upload has been fully published.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tubely_core::{AspectRatio, UserId, VideoId};

/// A video owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: VideoId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub aspect_ratio: Option<AspectRatio>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// A new record with no published media.
    pub fn new(user_id: UserId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            user_id,
            title: title.into(),
            description: String::new(),
            thumbnail_url: None,
            video_url: None,
            aspect_ratio: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
