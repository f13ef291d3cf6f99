//! Media delivery pipeline.
//!
//! A request flows through the pieces in this order:
//!
//! 1. [`resolver`] maps the handle to one video record.
//! 2. [`negotiate`] decides between the HTML player page and raw bytes.
//! 3. [`redirect`] short-circuits externally hosted sources with a `302`.
//! 4. [`locator`] finds the file on disk.
//! 5. [`responder`] serves it with range semantics.

pub mod error;
pub mod locator;
pub mod negotiate;
pub mod player;
pub mod range;
pub mod redirect;
pub mod resolver;
pub mod responder;

use std::path::PathBuf;
use std::sync::Arc;

use clipvault_common::VideoStatus;
use clipvault_db::pool::DbPool;
use serde::Serialize;

use crate::config::Config;

pub use error::{DeliveryError, Result};
pub use locator::{Located, Locator};
pub use negotiate::{classify, ClientKind};
pub use redirect::{ContinueReason, RedirectDecision, RedirectPolicy};
pub use resolver::{LookupStrategy, Precedence, Resolved, SqliteVideoLookup, VideoLookup};
pub use responder::{respond, StreamTarget};

/// Everything needed to turn a handle into a response.
pub struct DeliveryService {
    lookup: Arc<dyn VideoLookup>,
    locator: Locator,
    redirect: RedirectPolicy,
}

impl DeliveryService {
    pub fn new(lookup: Arc<dyn VideoLookup>, locator: Locator, redirect: RedirectPolicy) -> Self {
        Self {
            lookup,
            locator,
            redirect,
        }
    }

    /// Build the service over a SQLite pool with the default strategy chain.
    pub fn from_config(config: &Config, pool: DbPool) -> Self {
        Self::new(
            Arc::new(SqliteVideoLookup::new(pool)),
            Locator::new(config.storage.clone()),
            RedirectPolicy::from_config(&config.redirect, &config.server),
        )
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Resolve a handle. Store lookups are blocking and run off the reactor.
    pub async fn resolve(&self, handle: &str, precedence: Precedence) -> Result<Resolved> {
        let lookup = Arc::clone(&self.lookup);
        let handle_owned = handle.to_string();
        tokio::task::spawn_blocking(move || {
            resolver::resolve(lookup.as_ref(), &handle_owned, precedence)
        })
        .await
        .map_err(|e| DeliveryError::Internal(format!("Lookup task failed: {e}")))?
    }

    pub fn redirect_decision(&self, resolved: &Resolved, request_host: Option<&str>) -> RedirectDecision {
        self.redirect.decide(&resolved.record, request_host)
    }

    pub async fn locate(&self, resolved: &Resolved) -> Result<Located> {
        self.locator.locate(&resolved.record).await
    }

    /// Run the whole pipeline without serving bytes and report every step.
    pub async fn diagnose(&self, handle: &str, precedence: Precedence) -> Result<Diagnosis> {
        let resolved = self.resolve(handle, precedence).await?;
        let record = &resolved.record;

        let mut diagnosis = Diagnosis {
            handle: handle.to_string(),
            lookup: resolved.strategy,
            video_id: record.video_id.clone(),
            slug: record.redirect_slug.clone(),
            version: record.version,
            status: record.status,
            redirect: None,
            storage_strategy: None,
            path: None,
            size: None,
            etag: None,
            attempted: Vec::new(),
            error: None,
        };

        if let RedirectDecision::Redirect(url) = self.redirect_decision(&resolved, None) {
            diagnosis.redirect = Some(url.to_string());
        }

        match self.locate(&resolved).await {
            Ok(located) => {
                let target = StreamTarget::from(located.file);
                diagnosis.storage_strategy = Some(located.strategy);
                diagnosis.size = Some(target.size);
                diagnosis.etag = Some(target.etag());
                diagnosis.path = Some(target.path);
                diagnosis.attempted = located.attempted;
            }
            Err(DeliveryError::FileNotFound { attempted, .. }) => {
                diagnosis.error = Some("file_not_found".to_string());
                diagnosis.attempted = attempted;
            }
            Err(e) => diagnosis.error = Some(e.to_string()),
        }

        Ok(diagnosis)
    }
}

/// Diagnostic report for one handle.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    pub handle: String,
    pub lookup: LookupStrategy,
    pub video_id: String,
    pub slug: Option<String>,
    pub version: i64,
    pub status: VideoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    pub storage_strategy: Option<&'static str>,
    pub path: Option<PathBuf>,
    pub size: Option<u64>,
    pub etag: Option<String>,
    pub attempted: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
