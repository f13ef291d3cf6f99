//! Remote source detection and redirect-loop guard.
//!
//! A record whose source lives on an external host is answered with a `302`
//! instead of local streaming. Placeholder URLs left behind by old imports,
//! and URLs that point back at this service, fall through to local storage.

use std::sync::LazyLock;

use clipvault_common::SourceKind;
use clipvault_db::models::VideoRecord;
use regex::Regex;
use serde::Serialize;
use url::{Host, Url};

use crate::config::{RedirectConfig, ServerConfig};

static OWN_STREAM_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(?:s/[^/]+/?|videos/[^/]+/stream/?)$").expect("valid regex"));

/// Why a record is served locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinueReason {
    /// The record is explicitly flagged as locally stored.
    LocalSource,
    /// Neither `streaming_url` nor `file_path` is an absolute HTTP(S) URL.
    NotRemote,
    /// The URL matches a placeholder host pattern.
    MockHost,
    /// The URL points back at this service.
    SelfReference,
}

/// Outcome of the redirect check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    Redirect(Url),
    Continue(ContinueReason),
}

/// Host-matching rules for remote sources.
#[derive(Debug, Clone, Default)]
pub struct RedirectPolicy {
    mock_host_patterns: Vec<String>,
    public_hosts: Vec<String>,
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.split_once(']').map(|(h, _)| &h[1..]).unwrap_or(host);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Lowercased host of `url`, with IPv6 literals unbracketed to match
/// [`strip_port`].
fn url_host(url: &Url) -> String {
    match url.host() {
        Some(Host::Ipv6(addr)) => addr.to_string(),
        Some(host) => host.to_string().to_ascii_lowercase(),
        None => String::new(),
    }
}

fn http_url(value: &str) -> Option<Url> {
    let url = Url::parse(value.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}

impl RedirectPolicy {
    pub fn new(mock_host_patterns: Vec<String>, public_hosts: Vec<String>) -> Self {
        let lower = |v: Vec<String>| -> Vec<String> {
            v.into_iter().map(|s| s.to_ascii_lowercase()).collect()
        };
        let public_hosts = lower(public_hosts)
            .into_iter()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
            .collect();
        Self {
            mock_host_patterns: lower(mock_host_patterns),
            public_hosts,
        }
    }

    pub fn from_config(redirect: &RedirectConfig, server: &ServerConfig) -> Self {
        Self::new(
            redirect.mock_host_patterns.clone(),
            server.public_hosts.clone(),
        )
    }

    fn is_mock(&self, host: &str) -> bool {
        self.mock_host_patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && host.contains(pattern.as_str()))
    }

    fn is_self(&self, url: &Url, host: &str, request_host: Option<&str>) -> bool {
        if let Some(request_host) = request_host {
            if strip_port(request_host).eq_ignore_ascii_case(host) {
                return true;
            }
        }
        if self.public_hosts.iter().any(|h| h == host) {
            return true;
        }
        OWN_STREAM_PATH.is_match(url.path())
    }

    /// Decide whether `record` should be redirected for a request that
    /// arrived with `request_host` as its `Host` header.
    ///
    /// `streaming_url` is considered before `file_path`. A placeholder URL
    /// is skipped so a real remote `file_path` behind it still redirects.
    pub fn decide(&self, record: &VideoRecord, request_host: Option<&str>) -> RedirectDecision {
        if record.source_kind == Some(SourceKind::Local) {
            return RedirectDecision::Continue(ContinueReason::LocalSource);
        }

        let candidates = [record.streaming_url.as_deref(), Some(record.file_path.as_str())]
            .into_iter()
            .flatten()
            .filter_map(http_url);

        let mut reason = ContinueReason::NotRemote;
        for url in candidates {
            let host = url_host(&url);

            // An explicit remote flag overrides the placeholder heuristic.
            if record.source_kind.is_none() && self.is_mock(&host) {
                tracing::debug!(video_id = %record.video_id, %url, "Ignoring placeholder source URL");
                reason = ContinueReason::MockHost;
                continue;
            }

            if self.is_self(&url, &host, request_host) {
                tracing::debug!(video_id = %record.video_id, %url, "Source URL points at this service");
                return RedirectDecision::Continue(ContinueReason::SelfReference);
            }

            return RedirectDecision::Redirect(url);
        }

        RedirectDecision::Continue(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use clipvault_common::VideoStatus;

    fn record(file_path: &str, streaming_url: Option<&str>) -> VideoRecord {
        VideoRecord {
            video_id: "VID_7".into(),
            redirect_slug: Some("slug7".into()),
            file_path: file_path.into(),
            streaming_url: streaming_url.map(Into::into),
            size: 10,
            status: VideoStatus::Active,
            version: 1,
            source_kind: None,
            captions_url: None,
            title: None,
            created_at: Utc::now(),
        }
    }

    fn policy() -> RedirectPolicy {
        RedirectPolicy::new(
            vec!["example.com".into(), "placeholder".into()],
            vec!["videos.acme.test".into()],
        )
    }

    #[test]
    fn local_paths_continue() {
        let decision = policy().decide(&record("misc/clip.mp4", None), None);
        assert_eq!(decision, RedirectDecision::Continue(ContinueReason::NotRemote));
    }

    #[test]
    fn cdn_url_redirects() {
        let rec = record("misc/clip.mp4", Some("https://cdn.other.test/v/clip.mp4"));
        let decision = policy().decide(&rec, Some("videos.acme.test"));
        assert_eq!(
            decision,
            RedirectDecision::Redirect(Url::parse("https://cdn.other.test/v/clip.mp4").unwrap())
        );
    }

    #[test]
    fn remote_file_path_is_used_when_streaming_url_is_local() {
        let rec = record("https://cdn.other.test/a.mp4", Some("/videos/VID_7/stream"));
        assert_matches!(policy().decide(&rec, None), RedirectDecision::Redirect(_));
    }

    #[test]
    fn placeholder_hosts_continue() {
        for url in [
            "https://example.com/videos/1.mp4",
            "http://media.placeholder.io/1.mp4",
            "https://EXAMPLE.COM/x.mp4",
        ] {
            let decision = policy().decide(&record("x.mp4", Some(url)), None);
            assert_eq!(
                decision,
                RedirectDecision::Continue(ContinueReason::MockHost),
                "{url}"
            );
        }
    }

    #[test]
    fn self_references_continue() {
        let p = policy();

        let same_host = record("x.mp4", Some("http://localhost:8080/anything.mp4"));
        assert_eq!(
            p.decide(&same_host, Some("localhost:8080")),
            RedirectDecision::Continue(ContinueReason::SelfReference)
        );

        let public = record("x.mp4", Some("https://videos.acme.test/files/x.mp4"));
        assert_eq!(
            p.decide(&public, Some("internal:9000")),
            RedirectDecision::Continue(ContinueReason::SelfReference)
        );

        for path in ["https://old-host.test/s/slug7", "https://old-host.test/videos/VID_7/stream"] {
            let shaped = record("x.mp4", Some(path));
            assert_eq!(
                p.decide(&shaped, None),
                RedirectDecision::Continue(ContinueReason::SelfReference),
                "{path}"
            );
        }
    }

    #[test]
    fn explicit_source_kind_is_authoritative() {
        let mut local = record("x.mp4", Some("https://cdn.other.test/x.mp4"));
        local.source_kind = Some(SourceKind::Local);
        assert_eq!(
            policy().decide(&local, None),
            RedirectDecision::Continue(ContinueReason::LocalSource)
        );

        let mut remote = record("x.mp4", Some("https://example.com/real.mp4"));
        remote.source_kind = Some(SourceKind::Remote);
        assert_matches!(policy().decide(&remote, None), RedirectDecision::Redirect(_));
    }

    #[test]
    fn non_http_schemes_are_not_remote() {
        let rec = record("ftp://files.test/x.mp4", Some("file:///srv/x.mp4"));
        assert_eq!(
            policy().decide(&rec, None),
            RedirectDecision::Continue(ContinueReason::NotRemote)
        );
    }

    #[test]
    fn placeholder_streaming_url_falls_through_to_remote_file_path() {
        let rec = record(
            "https://cdn.other.test/real.mp4",
            Some("https://example.com/stub.mp4"),
        );
        assert_eq!(
            policy().decide(&rec, None),
            RedirectDecision::Redirect(Url::parse("https://cdn.other.test/real.mp4").unwrap())
        );

        let both_placeholders = record(
            "https://example.com/a.mp4",
            Some("https://media.placeholder.io/b.mp4"),
        );
        assert_eq!(
            policy().decide(&both_placeholders, None),
            RedirectDecision::Continue(ContinueReason::MockHost)
        );
    }

    #[test]
    fn ipv6_literal_self_reference() {
        let rec = record("x.mp4", Some("http://[::1]:8080/files/x.mp4"));
        assert_eq!(
            policy().decide(&rec, Some("[::1]:8080")),
            RedirectDecision::Continue(ContinueReason::SelfReference)
        );

        let listed = RedirectPolicy::new(Vec::new(), vec!["[2001:db8::7]".into()]);
        let rec = record("x.mp4", Some("https://[2001:db8::7]/files/x.mp4"));
        assert_eq!(
            listed.decide(&rec, None),
            RedirectDecision::Continue(ContinueReason::SelfReference)
        );
    }

    #[test]
    fn port_stripping() {
        assert_eq!(strip_port("host:8080"), "host");
        assert_eq!(strip_port("host"), "host");
        assert_eq!(strip_port("[::1]:8080"), "::1");
    }
}
