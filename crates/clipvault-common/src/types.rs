//! Core type definitions for video records.
//!
//! Both enums are stored as lowercase text in the database and serialized the
//! same way over JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a video record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    /// Authoritative, servable record.
    Active,
    /// Soft-deleted record, only visible to fallback lookups.
    Deleted,
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

impl std::str::FromStr for VideoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "deleted" => Ok(Self::Deleted),
            _ => Err(format!("Invalid video status: {}", s)),
        }
    }
}

/// Where the bytes of a video live, when the ingestion side recorded it.
///
/// Records written before this flag existed leave it unset and fall back to
/// URL heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Bytes are on one of the configured storage roots.
    Local,
    /// Bytes are hosted elsewhere (CDN) and the client is redirected.
    Remote,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(format!("Invalid source kind: {}", s)),
        }
    }
}
