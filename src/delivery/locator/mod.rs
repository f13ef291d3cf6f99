//! Storage location: video record to an absolute, readable file.
//!
//! The locator folds over an ordered list of [`Strategy`] values and stops at
//! the first one that produces an existing, readable file. Every path checked
//! along the way is recorded for diagnostics.
//!
//! Default chain (see [`strategies`]):
//!
//! 1. `{canonical}/{slug}.mp4`
//! 2. `{canonical}/{video_id}.mp4`
//! 3. the literal `file_path` (absolute, or relative to the upload root)
//! 4. `{legacy_upload}/{basename}`
//! 5. fuzzy match inside the intake root
//! 6. fuzzy match across every configured root

pub mod fuzzy;
pub mod strategies;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use clipvault_db::models::VideoRecord;

use crate::config::StorageConfig;

use super::error::{DeliveryError, Result};
use fuzzy::{FuzzyMatcher, LegacyNameMatcher};

/// A file that exists and has read permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHit {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl FileHit {
    fn from_metadata(path: PathBuf, metadata: &std::fs::Metadata) -> Self {
        Self {
            path,
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(UNIX_EPOCH),
        }
    }
}

/// Outcome of a successful location.
#[derive(Debug, Clone)]
pub struct Located {
    pub file: FileHit,
    /// Name of the strategy that produced the hit.
    pub strategy: &'static str,
    /// Every path that was checked, in order, including the hit.
    pub attempted: Vec<PathBuf>,
}

/// Per-request probing context handed to each strategy.
///
/// Records attempted paths and remembers the first candidate that existed
/// but was not readable.
pub struct Probe<'a> {
    storage: &'a StorageConfig,
    attempted: Vec<PathBuf>,
    unreadable: Option<PathBuf>,
}

impl<'a> Probe<'a> {
    pub fn new(storage: &'a StorageConfig) -> Self {
        Self {
            storage,
            attempted: Vec::new(),
            unreadable: None,
        }
    }

    pub fn storage(&self) -> &'a StorageConfig {
        self.storage
    }

    /// Stat `path` and return it if it is a readable regular file.
    ///
    /// A path already checked in this request is not checked again.
    pub async fn check(&mut self, path: PathBuf) -> Option<FileHit> {
        if self.attempted.contains(&path) {
            return None;
        }

        let metadata = tokio::fs::metadata(&path).await;
        self.attempted.push(path.clone());

        match metadata {
            Ok(meta) if meta.is_file() => {
                if is_readable(&meta) {
                    Some(FileHit::from_metadata(path, &meta))
                } else {
                    tracing::debug!(path = %path.display(), "Candidate exists but is not readable");
                    self.unreadable.get_or_insert(path);
                    None
                }
            }
            _ => None,
        }
    }

    /// Sorted file names in `dir`; empty when the directory cannot be read.
    pub async fn list_dir(&self, dir: &std::path::Path) -> Vec<String> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Skipping unreadable storage root");
                return names;
            }
        };

        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    if let Some(name) = entry.file_name().to_str() {
                        names.push(name.to_string());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(dir = %dir.display(), error = %e, "Directory listing interrupted");
                    break;
                }
            }
        }

        names.sort();
        names
    }
}

#[cfg(unix)]
fn is_readable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o444 != 0
}

#[cfg(not(unix))]
fn is_readable(_metadata: &std::fs::Metadata) -> bool {
    true
}

/// One step of the resolution chain.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Stable name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Try to find the record's bytes. Must return on the first hit.
    async fn find(&self, record: &VideoRecord, probe: &mut Probe<'_>) -> Option<FileHit>;
}

/// Ordered strategy chain over a storage configuration.
pub struct Locator {
    storage: StorageConfig,
    strategies: Vec<Box<dyn Strategy>>,
}

impl Locator {
    /// Build the default six-step chain with the legacy fuzzy matcher.
    pub fn new(storage: StorageConfig) -> Self {
        let matcher: Arc<dyn FuzzyMatcher> = Arc::new(LegacyNameMatcher::from_config(&storage));
        let strategies = strategies::default_chain(matcher);
        Self::with_strategies(storage, strategies)
    }

    /// Build a locator over a custom chain.
    pub fn with_strategies(storage: StorageConfig, strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            storage,
            strategies,
        }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Names of the strategies in chain order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Find the file behind `record`.
    ///
    /// Fails with [`DeliveryError::Unreadable`] when the only candidates
    /// found lacked read permission, otherwise [`DeliveryError::FileNotFound`].
    pub async fn locate(&self, record: &VideoRecord) -> Result<Located> {
        let mut probe = Probe::new(&self.storage);

        for strategy in &self.strategies {
            if let Some(file) = strategy.find(record, &mut probe).await {
                tracing::info!(
                    video_id = %record.video_id,
                    strategy = strategy.name(),
                    path = %file.path.display(),
                    attempts = probe.attempted.len(),
                    "Located video file"
                );
                return Ok(Located {
                    file,
                    strategy: strategy.name(),
                    attempted: probe.attempted,
                });
            }
        }

        if let Some(path) = probe.unreadable {
            tracing::warn!(
                video_id = %record.video_id,
                path = %path.display(),
                "Video file exists but is not readable"
            );
            return Err(DeliveryError::Unreadable { path });
        }

        tracing::warn!(
            video_id = %record.video_id,
            attempted = ?probe.attempted,
            "No storage strategy located the video file"
        );
        Err(DeliveryError::FileNotFound {
            video_id: record.video_id.clone(),
            attempted: probe.attempted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RootKind, StorageRoot};
    use assert_matches::assert_matches;
    use chrono::Utc;
    use clipvault_common::VideoStatus;
    use std::path::Path;

    struct Fixed(&'static str, Option<PathBuf>);

    #[async_trait]
    impl Strategy for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn find(&self, _record: &VideoRecord, probe: &mut Probe<'_>) -> Option<FileHit> {
            let path = self.1.clone()?;
            probe.check(path).await
        }
    }

    fn record() -> VideoRecord {
        VideoRecord {
            video_id: "VID_1".into(),
            redirect_slug: None,
            file_path: "x.mp4".into(),
            streaming_url: None,
            size: 0,
            status: VideoStatus::Active,
            version: 1,
            source_kind: None,
            captions_url: None,
            title: None,
            created_at: Utc::now(),
        }
    }

    fn storage(dir: &Path) -> StorageConfig {
        StorageConfig {
            upload_root: dir.to_path_buf(),
            roots: vec![StorageRoot::new(RootKind::Canonical, dir)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn stops_at_first_hit() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.mp4");
        let second = dir.path().join("second.mp4");
        std::fs::write(&first, b"one").unwrap();
        std::fs::write(&second, b"two").unwrap();

        let locator = Locator::with_strategies(
            storage(dir.path()),
            vec![
                Box::new(Fixed("missing", Some(dir.path().join("nope.mp4")))),
                Box::new(Fixed("first", Some(first.clone()))),
                Box::new(Fixed("second", Some(second))),
            ],
        );

        let located = locator.locate(&record()).await.unwrap();
        assert_eq!(located.strategy, "first");
        assert_eq!(located.file.path, first);
        assert_eq!(located.file.size, 3);
        assert_eq!(located.attempted.len(), 2);
    }

    #[tokio::test]
    async fn reports_every_attempt_when_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        let locator = Locator::with_strategies(
            storage(dir.path()),
            vec![
                Box::new(Fixed("a", Some(dir.path().join("a.mp4")))),
                Box::new(Fixed("none", None)),
                Box::new(Fixed("b", Some(dir.path().join("b.mp4")))),
            ],
        );

        let err = locator.locate(&record()).await.unwrap_err();
        assert_matches!(err, DeliveryError::FileNotFound { ref attempted, .. } => {
            assert_eq!(attempted, &vec![dir.path().join("a.mp4"), dir.path().join("b.mp4")]);
        });
    }

    #[tokio::test]
    async fn directories_are_not_hits() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("VID_1.mp4")).unwrap();

        let locator = Locator::with_strategies(
            storage(dir.path()),
            vec![Box::new(Fixed("dir", Some(dir.path().join("VID_1.mp4"))))],
        );
        assert!(locator.locate(&record()).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_file_is_skipped_and_reported() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked.mp4");
        std::fs::write(&locked, b"secret").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let locator = Locator::with_strategies(
            storage(dir.path()),
            vec![Box::new(Fixed("locked", Some(locked.clone())))],
        );
        let err = locator.locate(&record()).await.unwrap_err();
        assert_matches!(err, DeliveryError::Unreadable { ref path } if path == &locked);

        // A later readable candidate still wins.
        let open = dir.path().join("open.mp4");
        std::fs::write(&open, b"public").unwrap();
        let locator = Locator::with_strategies(
            storage(dir.path()),
            vec![
                Box::new(Fixed("locked", Some(locked))),
                Box::new(Fixed("open", Some(open.clone()))),
            ],
        );
        let located = locator.locate(&record()).await.unwrap();
        assert_eq!(located.file.path, open);
    }

    #[tokio::test]
    async fn list_dir_is_sorted_and_tolerates_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"").unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"").unwrap();

        let config = storage(dir.path());
        let probe = Probe::new(&config);
        assert_eq!(probe.list_dir(dir.path()).await, vec!["a.mp4", "b.mp4"]);
        assert!(probe.list_dir(&dir.path().join("missing")).await.is_empty());
    }
}
