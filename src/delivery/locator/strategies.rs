//! The resolution strategies of the default locator chain.
//!
//! Each strategy reads only the record and the storage configuration carried
//! by the [`Probe`], and returns on its first hit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clipvault_db::models::VideoRecord;

use super::fuzzy::FuzzyMatcher;
use super::{FileHit, Probe, Strategy};
use crate::config::RootKind;

/// The six-step chain, in precedence order.
pub fn default_chain(matcher: Arc<dyn FuzzyMatcher>) -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(CanonicalSlug),
        Box::new(CanonicalVideoId),
        Box::new(LiteralPath),
        Box::new(LegacyUploadByName),
        Box::new(IntakeMatch {
            matcher: matcher.clone(),
        }),
        Box::new(ExhaustiveScan { matcher }),
    ]
}

/// True for `http://` and `https://` values.
pub fn is_remote_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// A handle is only joined onto a root when it cannot escape it.
fn is_safe_stem(stem: &str) -> bool {
    !stem.is_empty()
        && stem != "."
        && stem != ".."
        && !stem.contains(['/', '\\', '\0'])
}

/// Last path segment of a stored `file_path`, for URLs too.
pub fn file_name_of(file_path: &str) -> Option<String> {
    let trimmed = file_path.trim();
    if trimmed.is_empty() {
        return None;
    }

    let name = if is_remote_url(trimmed) {
        let url = url::Url::parse(trimmed).ok()?;
        let segment = url.path_segments()?.rev().find(|s| !s.is_empty())?.to_string();
        urlencoding::decode(&segment)
            .map(|s| s.into_owned())
            .unwrap_or(segment)
    } else {
        trimmed
            .rsplit(['/', '\\'])
            .find(|s| !s.is_empty())?
            .to_string()
    };

    is_safe_stem(&name).then_some(name)
}

fn canonical_path(probe: &Probe<'_>, stem: &str) -> Option<PathBuf> {
    if !is_safe_stem(stem) {
        return None;
    }
    let storage = probe.storage();
    let root = storage.first_root(RootKind::Canonical)?;
    let ext = storage.canonical_extension.trim_start_matches('.');
    Some(root.join(format!("{stem}.{ext}")))
}

/// Step 1: block storage keyed by slug.
pub struct CanonicalSlug;

#[async_trait]
impl Strategy for CanonicalSlug {
    fn name(&self) -> &'static str {
        "canonical_slug"
    }

    async fn find(&self, record: &VideoRecord, probe: &mut Probe<'_>) -> Option<FileHit> {
        let slug = record.redirect_slug.as_deref()?;
        let path = canonical_path(probe, slug)?;
        probe.check(path).await
    }
}

/// Step 2: block storage keyed by video id, for pre-slug records.
pub struct CanonicalVideoId;

#[async_trait]
impl Strategy for CanonicalVideoId {
    fn name(&self) -> &'static str {
        "canonical_video_id"
    }

    async fn find(&self, record: &VideoRecord, probe: &mut Probe<'_>) -> Option<FileHit> {
        let path = canonical_path(probe, &record.video_id)?;
        probe.check(path).await
    }
}

/// Step 3: the stored path itself.
pub struct LiteralPath;

#[async_trait]
impl Strategy for LiteralPath {
    fn name(&self) -> &'static str {
        "literal_path"
    }

    async fn find(&self, record: &VideoRecord, probe: &mut Probe<'_>) -> Option<FileHit> {
        let stored = record.file_path.trim();
        if stored.is_empty() || is_remote_url(stored) {
            return None;
        }

        let stored = Path::new(stored);
        let path = if stored.is_absolute() {
            stored.to_path_buf()
        } else {
            probe.storage().upload_root.join(stored)
        };
        probe.check(path).await
    }
}

/// Step 4: the stored basename inside the legacy direct-upload root.
pub struct LegacyUploadByName;

#[async_trait]
impl Strategy for LegacyUploadByName {
    fn name(&self) -> &'static str {
        "legacy_upload_by_name"
    }

    async fn find(&self, record: &VideoRecord, probe: &mut Probe<'_>) -> Option<FileHit> {
        let name = file_name_of(&record.file_path)?;
        let root = probe.storage().first_root(RootKind::LegacyUpload)?;
        probe.check(root.join(name)).await
    }
}

async fn scan_root(
    matcher: &dyn FuzzyMatcher,
    target: &str,
    root: &Path,
    probe: &mut Probe<'_>,
) -> Option<FileHit> {
    let entries = probe.list_dir(root).await;
    for candidate in matcher.rank(target, &entries) {
        if let Some(hit) = probe.check(root.join(candidate)).await {
            return Some(hit);
        }
    }
    None
}

/// Step 5: fuzzy match inside the legacy intake root.
pub struct IntakeMatch {
    pub matcher: Arc<dyn FuzzyMatcher>,
}

#[async_trait]
impl Strategy for IntakeMatch {
    fn name(&self) -> &'static str {
        "intake_match"
    }

    async fn find(&self, record: &VideoRecord, probe: &mut Probe<'_>) -> Option<FileHit> {
        let target = file_name_of(&record.file_path)?;
        let root = probe.storage().first_root(RootKind::Intake)?;
        scan_root(self.matcher.as_ref(), &target, root, probe).await
    }
}

/// Step 6: fuzzy match across every configured root.
pub struct ExhaustiveScan {
    pub matcher: Arc<dyn FuzzyMatcher>,
}

#[async_trait]
impl Strategy for ExhaustiveScan {
    fn name(&self) -> &'static str {
        "exhaustive_scan"
    }

    async fn find(&self, record: &VideoRecord, probe: &mut Probe<'_>) -> Option<FileHit> {
        let target = file_name_of(&record.file_path)?;
        let roots: Vec<PathBuf> = probe
            .storage()
            .scan_roots()
            .into_iter()
            .map(Path::to_path_buf)
            .collect();

        for root in roots {
            if let Some(hit) = scan_root(self.matcher.as_ref(), &target, &root, probe).await {
                return Some(hit);
            }
        }
        None
    }
}
