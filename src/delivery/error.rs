//! Failure taxonomy of the delivery pipeline.
//!
//! Every variant is handled locally and translated to a status code by
//! [`DeliveryError::http_status`]; nothing here is retried.

use std::path::PathBuf;

/// Errors produced while turning a handle into served bytes.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// No record matches the handle under any lookup order.
    #[error("No video matches handle {handle:?}")]
    IdentifierNotFound { handle: String },

    /// The record exists but no storage strategy located its bytes.
    #[error("No stored file for video {video_id} ({} paths tried)", .attempted.len())]
    FileNotFound {
        video_id: String,
        attempted: Vec<PathBuf>,
    },

    /// The `Range` header is malformed or outside `[0, size)`.
    #[error("Range not satisfiable: {header:?} for {size} bytes")]
    InvalidRange { header: String, size: u64 },

    /// The located file exists but cannot be read.
    #[error("File is not readable: {}", .path.display())]
    Unreadable { path: PathBuf },

    /// Reading the file failed before the response could be built.
    #[error("Failed to read {}: {source}", .path.display())]
    StreamIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The video store failed.
    #[error(transparent)]
    Store(#[from] clipvault_common::Error),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeliveryError {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            DeliveryError::IdentifierNotFound { .. } => 404,
            DeliveryError::FileNotFound { .. } => 404,
            DeliveryError::InvalidRange { .. } => 416,
            DeliveryError::Unreadable { .. } => 403,
            DeliveryError::StreamIo { .. } => 500,
            DeliveryError::Store(_) => 500,
            DeliveryError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DeliveryError::IdentifierNotFound { .. } => "identifier_not_found",
            DeliveryError::FileNotFound { .. } => "file_not_found",
            DeliveryError::InvalidRange { .. } => "invalid_range",
            DeliveryError::Unreadable { .. } => "unreadable",
            DeliveryError::StreamIo { .. } => "stream_io_error",
            DeliveryError::Store(_) => "store_error",
            DeliveryError::Internal(_) => "internal_error",
        }
    }

    pub(crate) fn identifier_not_found(handle: impl Into<String>) -> Self {
        DeliveryError::IdentifierNotFound {
            handle: handle.into(),
        }
    }
}

/// Result alias for the delivery pipeline.
pub type Result<T> = std::result::Result<T, DeliveryError>;
