//! Internal Rust models matching the database schema.

use chrono::{DateTime, Utc};
use clipvault_common::{SourceKind, VideoStatus};
use serde::{Deserialize, Serialize};

/// One row of the `videos` table.
///
/// Several rows may share a `video_id` (one per version); only the
/// highest-version active row is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoRecord {
    pub video_id: String,
    pub redirect_slug: Option<String>,
    /// Relative path under the upload root, absolute path, or remote URL.
    pub file_path: String,
    /// Previously computed public URL; may be stale.
    pub streaming_url: Option<String>,
    pub size: i64,
    pub status: VideoStatus,
    pub version: i64,
    pub source_kind: Option<SourceKind>,
    pub captions_url: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn is_active(&self) -> bool {
        self.status == VideoStatus::Active
    }
}

/// Input for inserting a video row.
#[derive(Debug, Clone, Default)]
pub struct NewVideo {
    pub video_id: String,
    pub redirect_slug: Option<String>,
    pub file_path: String,
    pub streaming_url: Option<String>,
    pub size: i64,
    /// Defaults to `1` when left at zero.
    pub version: i64,
    pub source_kind: Option<SourceKind>,
    pub captions_url: Option<String>,
    pub title: Option<String>,
}

impl NewVideo {
    pub fn new(video_id: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            file_path: file_path.into(),
            version: 1,
            ..Default::default()
        }
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.redirect_slug = Some(slug.into());
        self
    }

    pub fn size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }

    pub fn version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    pub fn streaming_url(mut self, url: impl Into<String>) -> Self {
        self.streaming_url = Some(url.into());
        self
    }

    pub fn source_kind(mut self, kind: SourceKind) -> Self {
        self.source_kind = Some(kind);
        self
    }

    pub fn captions_url(mut self, url: impl Into<String>) -> Self {
        self.captions_url = Some(url.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
