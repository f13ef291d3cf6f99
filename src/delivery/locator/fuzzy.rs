//! Fuzzy filename matching for legacy storage directories.
//!
//! Older uploads were renamed inconsistently on their way into the intake
//! directory, so the stored `file_path` basename often only partially matches
//! the file on disk. [`LegacyNameMatcher`] recovers them by, in order:
//!
//! 1. exact filename equality,
//! 2. a shared numeric token (upload timestamps survive most renames),
//! 3. a shared alphanumeric fragment of at least `min_fragment_len` chars.
//!
//! The matcher sits behind [`FuzzyMatcher`] so a stricter rule can replace it
//! without touching the strategy chain.

use std::path::Path;
use std::sync::LazyLock;

use clipvault_common::paths::is_video_file;
use regex::Regex;

use crate::config::StorageConfig;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Ranks directory entries that might hold a given file.
pub trait FuzzyMatcher: Send + Sync {
    /// Entries from `entries` that plausibly are `target`, best match first.
    fn rank(&self, target: &str, entries: &[String]) -> Vec<String>;
}

/// Exact, then numeric-token, then fragment matching.
#[derive(Debug, Clone)]
pub struct LegacyNameMatcher {
    min_fragment_len: usize,
    min_numeric_token_len: usize,
}

impl LegacyNameMatcher {
    pub fn new(min_fragment_len: usize, min_numeric_token_len: usize) -> Self {
        Self {
            min_fragment_len: min_fragment_len.max(1),
            min_numeric_token_len: min_numeric_token_len.max(1),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(storage.min_fragment_len, storage.min_numeric_token_len)
    }

    /// Digit runs in the file stem long enough to be meaningful, longest first.
    pub fn numeric_tokens<'a>(&self, stem: &'a str) -> Vec<&'a str> {
        let mut tokens: Vec<&str> = DIGIT_RUN
            .find_iter(stem)
            .map(|m| m.as_str())
            .filter(|t| t.len() >= self.min_numeric_token_len)
            .collect();
        tokens.sort_by_key(|t| std::cmp::Reverse(t.len()));
        tokens.dedup();
        tokens
    }

    /// Lowercased alphanumeric fragments of the stem, longest first.
    pub fn fragments(&self, stem: &str) -> Vec<String> {
        let mut fragments: Vec<String> = stem
            .split(|c: char| !c.is_alphanumeric())
            .filter(|f| f.chars().count() >= self.min_fragment_len)
            .filter(|f| !f.chars().all(|c| c.is_ascii_digit()))
            .map(|f| f.to_lowercase())
            .collect();
        fragments.sort_by_key(|f| std::cmp::Reverse(f.len()));
        fragments.dedup();
        fragments
    }
}

fn stem_of(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

fn push_unique(ranked: &mut Vec<String>, candidate: &str) {
    if !ranked.iter().any(|r| r == candidate) {
        ranked.push(candidate.to_string());
    }
}

impl FuzzyMatcher for LegacyNameMatcher {
    fn rank(&self, target: &str, entries: &[String]) -> Vec<String> {
        let mut ranked = Vec::new();
        if target.is_empty() {
            return ranked;
        }

        if entries.iter().any(|e| e == target) {
            push_unique(&mut ranked, target);
        }

        let videos: Vec<&String> = entries
            .iter()
            .filter(|e| is_video_file(Path::new(e.as_str())))
            .collect();

        let stem = stem_of(target);

        for token in self.numeric_tokens(stem) {
            for entry in &videos {
                if entry.contains(token) {
                    push_unique(&mut ranked, entry);
                }
            }
        }

        for fragment in self.fragments(stem) {
            for entry in &videos {
                if entry.to_lowercase().contains(&fragment) {
                    push_unique(&mut ranked, entry);
                }
            }
        }

        ranked
    }
}
