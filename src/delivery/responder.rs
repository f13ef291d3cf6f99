//! Range streaming responder.
//!
//! Serves a located file with `200`/`206` semantics. Files are replaced in
//! place under a stable handle, so every response carries a size+mtime ETag
//! and a `Cache-Control` that forbids caching by URL.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Utc};
use clipvault_common::paths::content_type_for;
use futures::TryStreamExt;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use super::error::{DeliveryError, Result};
use super::locator::FileHit;
use super::range::{parse_range, ByteRange};

/// `Cache-Control` sent on every streaming response.
pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

const CHUNK_SIZE: usize = 64 * 1024;

/// A file ready to be served, with the metadata its headers derive from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTarget {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl From<FileHit> for StreamTarget {
    fn from(hit: FileHit) -> Self {
        Self {
            path: hit.path,
            size: hit.size,
            modified: hit.modified,
        }
    }
}

impl StreamTarget {
    /// Build a target from the file's current metadata.
    pub async fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path).await?;
        Ok(Self {
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(UNIX_EPOCH),
            path,
        })
    }

    fn modified_millis(&self) -> u128 {
        self.modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0)
    }

    /// `"{size}-{mtimeEpochMillis}"`, quoted as an HTTP entity tag.
    pub fn etag(&self) -> String {
        format!("\"{}-{}\"", self.size, self.modified_millis())
    }

    /// HTTP-date of the file's mtime.
    pub fn last_modified(&self) -> String {
        let modified: DateTime<Utc> = self.modified.into();
        modified.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
    }

    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.path)
    }
}

/// Status, length and range a request will be answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePlan {
    pub status: StatusCode,
    pub range: Option<ByteRange>,
    pub content_length: u64,
}

/// Decide how to answer, without touching the file.
pub fn plan(range_header: Option<&str>, size: u64) -> Result<ResponsePlan> {
    match range_header {
        None => Ok(ResponsePlan {
            status: StatusCode::OK,
            range: None,
            content_length: size,
        }),
        Some(header) => {
            let range = parse_range(header, size).map_err(|_| DeliveryError::InvalidRange {
                header: header.to_string(),
                size,
            })?;
            Ok(ResponsePlan {
                status: StatusCode::PARTIAL_CONTENT,
                range: Some(range),
                content_length: range.len(),
            })
        }
    }
}

fn open_error(path: &Path, source: std::io::Error) -> DeliveryError {
    match source.kind() {
        std::io::ErrorKind::PermissionDenied => DeliveryError::Unreadable {
            path: path.to_path_buf(),
        },
        _ => DeliveryError::StreamIo {
            path: path.to_path_buf(),
            source,
        },
    }
}

/// Open the located file and describe it from the open handle.
///
/// The locator's stat may predate an in-place replacement, so headers and
/// body both come from the file actually being read.
async fn open_current(located: &StreamTarget) -> Result<(File, StreamTarget)> {
    let file = File::open(&located.path)
        .await
        .map_err(|e| open_error(&located.path, e))?;
    let metadata = file.metadata().await.map_err(|source| DeliveryError::StreamIo {
        path: located.path.clone(),
        source,
    })?;

    let current = StreamTarget {
        path: located.path.clone(),
        size: metadata.len(),
        modified: metadata.modified().unwrap_or(UNIX_EPOCH),
    };
    if current.size != located.size || current.modified != located.modified {
        tracing::debug!(
            path = %current.path.display(),
            located_size = located.size,
            size = current.size,
            "File changed since it was located"
        );
    }
    Ok((file, current))
}

async fn stream_body(mut file: File, target: &StreamTarget, plan: &ResponsePlan) -> Result<Body> {
    let start = plan.range.map(|r| r.start).unwrap_or(0);
    if start > 0 {
        file.seek(SeekFrom::Start(start))
            .await
            .map_err(|source| DeliveryError::StreamIo {
                path: target.path.clone(),
                source,
            })?;
    }

    // Headers are already committed once the body starts, so a read error
    // can only abort the connection.
    let path = target.path.clone();
    let stream = ReaderStream::with_capacity(file.take(plan.content_length), CHUNK_SIZE)
        .inspect_err(move |e| {
            tracing::error!(path = %path.display(), error = %e, "Stream aborted mid-transfer");
        });

    Ok(Body::from_stream(stream))
}

fn headers(target: &StreamTarget, plan: &ResponsePlan) -> axum::http::response::Builder {
    let builder = Response::builder()
        .status(plan.status)
        .header(header::CONTENT_TYPE, target.content_type())
        .header(header::CONTENT_LENGTH, plan.content_length)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::ETAG, target.etag())
        .header(header::LAST_MODIFIED, target.last_modified())
        .header(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE))
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0");

    match plan.range {
        Some(range) => builder.header(header::CONTENT_RANGE, range.content_range(target.size)),
        None => builder,
    }
}

/// Serve `target` for a GET or HEAD request.
///
/// HEAD computes its headers from the located metadata and never opens the
/// file. GET opens the file first and derives status, length, ETag and
/// `Last-Modified` from that handle, so a replacement after the lookup is
/// served consistently as the new file.
pub async fn respond(
    method: &Method,
    range_header: Option<&str>,
    target: &StreamTarget,
) -> Result<Response> {
    let (target, plan, body) = if method == Method::HEAD {
        let plan = plan(range_header, target.size)?;
        (target.clone(), plan, Body::empty())
    } else {
        let (file, current) = open_current(target).await?;
        let plan = plan(range_header, current.size)?;
        let body = stream_body(file, &current, &plan).await?;
        (current, plan, body)
    };

    tracing::debug!(
        path = %target.path.display(),
        status = plan.status.as_u16(),
        length = plan.content_length,
        head = method == Method::HEAD,
        "Serving video bytes"
    );

    headers(&target, &plan)
        .body(body)
        .map_err(|e| DeliveryError::Internal(format!("Failed to build response: {e}")))
}
