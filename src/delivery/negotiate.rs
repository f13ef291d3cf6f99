//! Content negotiation between media players and browsers.

use axum::http::{header, HeaderMap};

/// Who is asking for a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    /// Wants raw bytes with range semantics.
    Player,
    /// Wants an HTML page embedding a player.
    BrowserPage,
}

const PLAYER_MEDIA_TYPES: &[&str] = &[
    "application/octet-stream",
    "application/vnd.apple.mpegurl",
    "application/x-mpegurl",
];

/// Media types listed in an `Accept` header, lowercased, parameters dropped.
fn accepted_types(accept: &str) -> impl Iterator<Item = String> + '_ {
    accept
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(|media| media.trim().to_ascii_lowercase())
        .filter(|media| !media.is_empty())
}

fn wants_media(media: &str) -> bool {
    media.starts_with("video/") || PLAYER_MEDIA_TYPES.contains(&media)
}

/// Classify a request from its headers.
///
/// A `Range` header always means a player, so HTML is never returned to a
/// client that is seeking.
pub fn classify(headers: &HeaderMap) -> ClientKind {
    if headers.contains_key(header::RANGE) {
        return ClientKind::Player;
    }

    let accept = headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join(",");

    let types: Vec<String> = accepted_types(&accept).collect();

    if types.iter().any(|t| wants_media(t)) {
        return ClientKind::Player;
    }

    if types.is_empty() || types.iter().any(|t| t == "*/*" || t == "text/html") {
        return ClientKind::BrowserPage;
    }

    ClientKind::Player
}
