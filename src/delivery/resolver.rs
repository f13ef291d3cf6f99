//! Identifier resolution: external handle to exactly one video record.
//!
//! Active records are tried in the route's precedence order (slug first for
//! short links, id first for the stream route). Only when both active lookups
//! miss are deleted records considered, in the same order.

use std::borrow::Cow;

use clipvault_db::models::VideoRecord;
use clipvault_db::pool::{get_conn, DbPool};
use clipvault_db::queries::videos;
use serde::Serialize;

use super::error::{DeliveryError, Result};

/// Read-only view of the persistence layer.
pub trait VideoLookup: Send + Sync {
    fn find_by_video_id(
        &self,
        video_id: &str,
        include_inactive: bool,
    ) -> clipvault_common::Result<Option<VideoRecord>>;

    fn find_by_slug(
        &self,
        slug: &str,
        include_inactive: bool,
    ) -> clipvault_common::Result<Option<VideoRecord>>;
}

/// [`VideoLookup`] backed by the SQLite pool.
#[derive(Clone)]
pub struct SqliteVideoLookup {
    pool: DbPool,
}

impl SqliteVideoLookup {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl VideoLookup for SqliteVideoLookup {
    fn find_by_video_id(
        &self,
        video_id: &str,
        include_inactive: bool,
    ) -> clipvault_common::Result<Option<VideoRecord>> {
        let conn = get_conn(&self.pool)?;
        videos::find_by_video_id(&conn, video_id, include_inactive)
    }

    fn find_by_slug(
        &self,
        slug: &str,
        include_inactive: bool,
    ) -> clipvault_common::Result<Option<VideoRecord>> {
        let conn = get_conn(&self.pool)?;
        videos::find_by_slug(&conn, slug, include_inactive)
    }
}

/// Which lookup order a route uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    /// Short-link route: slug, then video id.
    SlugFirst,
    /// Stream route: video id, then slug.
    IdFirst,
}

/// The lookup that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStrategy {
    ActiveSlug,
    ActiveVideoId,
    InactiveSlug,
    InactiveVideoId,
}

impl LookupStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupStrategy::ActiveSlug => "active_slug",
            LookupStrategy::ActiveVideoId => "active_video_id",
            LookupStrategy::InactiveSlug => "inactive_slug",
            LookupStrategy::InactiveVideoId => "inactive_video_id",
        }
    }
}

/// A resolved record together with the lookup that found it.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub record: VideoRecord,
    pub strategy: LookupStrategy,
}

#[derive(Clone, Copy)]
enum Key {
    Slug,
    VideoId,
}

impl Precedence {
    fn keys(self) -> [Key; 2] {
        match self {
            Precedence::SlugFirst => [Key::Slug, Key::VideoId],
            Precedence::IdFirst => [Key::VideoId, Key::Slug],
        }
    }
}

fn strategy_for(key: Key, include_inactive: bool) -> LookupStrategy {
    match (key, include_inactive) {
        (Key::Slug, false) => LookupStrategy::ActiveSlug,
        (Key::VideoId, false) => LookupStrategy::ActiveVideoId,
        (Key::Slug, true) => LookupStrategy::InactiveSlug,
        (Key::VideoId, true) => LookupStrategy::InactiveVideoId,
    }
}

/// Percent-decode a handle, keeping the raw text when decoding fails.
pub fn decode_handle(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Resolve `handle` to a single record.
pub fn resolve(lookup: &dyn VideoLookup, handle: &str, precedence: Precedence) -> Result<Resolved> {
    let decoded = decode_handle(handle);
    let handle: &str = &decoded;
    if handle.is_empty() {
        return Err(DeliveryError::identifier_not_found(handle));
    }

    for include_inactive in [false, true] {
        for key in precedence.keys() {
            let found = match key {
                Key::Slug => lookup.find_by_slug(handle, include_inactive)?,
                Key::VideoId => lookup.find_by_video_id(handle, include_inactive)?,
            };

            if let Some(record) = found {
                let strategy = strategy_for(key, include_inactive);
                tracing::debug!(
                    handle,
                    video_id = %record.video_id,
                    strategy = strategy.as_str(),
                    "Resolved handle"
                );
                return Ok(Resolved { record, strategy });
            }
        }
    }

    Err(DeliveryError::identifier_not_found(handle))
}
