//! Video record query operations.
//!
//! Lookups return at most one row: the highest-version active record, or,
//! when `include_inactive` is set, the best row regardless of status (active
//! rows still win over deleted ones).

use chrono::{DateTime, Utc};
use clipvault_common::{Error, Result, SourceKind, VideoStatus};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{NewVideo, VideoRecord};

const VIDEO_COLUMNS: &str = "video_id, redirect_slug, file_path, streaming_url, size, status,
     version, source_kind, captions_url, title, created_at";

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn row_to_video(row: &Row<'_>) -> rusqlite::Result<VideoRecord> {
    let status: String = row.get(5)?;
    let status = status
        .parse::<VideoStatus>()
        .map_err(|e| conversion_error(5, e))?;

    let source_kind = row
        .get::<_, Option<String>>(7)?
        .map(|s| s.parse::<SourceKind>())
        .transpose()
        .map_err(|e| conversion_error(7, e))?;

    Ok(VideoRecord {
        video_id: row.get(0)?,
        redirect_slug: row.get(1)?,
        file_path: row.get(2)?,
        streaming_url: row.get(3)?,
        size: row.get(4)?,
        status,
        version: row.get(6)?,
        source_kind,
        captions_url: row.get(8)?,
        title: row.get(9)?,
        created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(10)?)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

fn find_one(
    conn: &Connection,
    column: &str,
    value: &str,
    include_inactive: bool,
) -> Result<Option<VideoRecord>> {
    let sql = format!(
        "SELECT {VIDEO_COLUMNS} FROM videos
         WHERE {column} = ?1 AND (?2 OR status = 'active')
         ORDER BY (status = 'active') DESC, version DESC, id DESC
         LIMIT 1"
    );

    conn.query_row(&sql, params![value, include_inactive], row_to_video)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Find the authoritative record for a video identifier.
pub fn find_by_video_id(
    conn: &Connection,
    video_id: &str,
    include_inactive: bool,
) -> Result<Option<VideoRecord>> {
    find_one(conn, "video_id", video_id, include_inactive)
}

/// Find the authoritative record for a short public slug.
pub fn find_by_slug(
    conn: &Connection,
    slug: &str,
    include_inactive: bool,
) -> Result<Option<VideoRecord>> {
    find_one(conn, "redirect_slug", slug, include_inactive)
}

/// Insert a new active video row.
///
/// Delivery never writes; this exists for the ingestion side and for seeding.
pub fn insert_video(conn: &Connection, video: &NewVideo) -> Result<VideoRecord> {
    if video.video_id.is_empty() {
        return Err(Error::invalid_input("video_id must not be empty"));
    }

    let now = Utc::now();
    let version = if video.version == 0 { 1 } else { video.version };

    conn.execute(
        "INSERT INTO videos (video_id, redirect_slug, file_path, streaming_url, size, status,
                             version, source_kind, captions_url, title, created_at)
         VALUES (?, ?, ?, ?, ?, 'active', ?, ?, ?, ?, ?)",
        params![
            video.video_id,
            video.redirect_slug,
            video.file_path,
            video.streaming_url,
            video.size,
            version,
            video.source_kind.map(|k| k.to_string()),
            video.captions_url,
            video.title,
            now.to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(VideoRecord {
        video_id: video.video_id.clone(),
        redirect_slug: video.redirect_slug.clone(),
        file_path: video.file_path.clone(),
        streaming_url: video.streaming_url.clone(),
        size: video.size,
        status: VideoStatus::Active,
        version,
        source_kind: video.source_kind,
        captions_url: video.captions_url.clone(),
        title: video.title.clone(),
        created_at: now,
    })
}

/// Soft-delete every version of a video. Returns the number of rows changed.
pub fn mark_deleted(conn: &Connection, video_id: &str) -> Result<usize> {
    conn.execute(
        "UPDATE videos SET status = 'deleted' WHERE video_id = ? AND status = 'active'",
        [video_id],
    )
    .map_err(|e| Error::database(e.to_string()))
}
