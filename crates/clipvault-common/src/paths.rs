//! Path utilities for detecting video files and their MIME types.
//!
//! The storage scanners use [`is_video_file`] to ignore sidecar files, and the
//! streaming responder uses [`content_type_for`] to pick a `Content-Type`.

use std::path::Path;

/// Fallback MIME type when the extension is unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Fixed extension to MIME table for everything we serve.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("avi", "video/x-msvideo"),
    ("ogv", "video/ogg"),
    ("ts", "video/mp2t"),
    ("m3u8", "application/vnd.apple.mpegurl"),
    ("wmv", "video/x-ms-wmv"),
    ("flv", "video/x-flv"),
    ("3gp", "video/3gpp"),
];

/// Extensions treated as video files when scanning storage roots.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "webm", "mkv", "avi", "ogv", "ts", "wmv", "flv", "3gp",
];

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use clipvault_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("clip.MP4")));
/// assert!(!is_video_file(Path::new("clip.vtt")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// MIME type for a file, derived from its extension.
///
/// Unknown or missing extensions map to [`DEFAULT_CONTENT_TYPE`].
pub fn content_type_for(path: &Path) -> &'static str {
    let Some(ext) = lowercase_extension(path) else {
        return DEFAULT_CONTENT_TYPE;
    };

    CONTENT_TYPES
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("clip.mp4")));
        assert!(is_video_file(Path::new("clip.webm")));
        assert!(is_video_file(Path::new("/data/videos/clip.mov")));
        assert!(is_video_file(Path::new("clip.MKV")));

        assert!(!is_video_file(Path::new("captions.vtt")));
        assert!(!is_video_file(Path::new("thumb.jpg")));
        assert!(!is_video_file(Path::new("no_extension")));
        assert!(!is_video_file(Path::new("")));
    }

    #[test]
    fn test_content_type_table() {
        assert_eq!(content_type_for(Path::new("a.mp4")), "video/mp4");
        assert_eq!(content_type_for(Path::new("a.m4v")), "video/mp4");
        assert_eq!(content_type_for(Path::new("a.mov")), "video/quicktime");
        assert_eq!(content_type_for(Path::new("a.webm")), "video/webm");
        assert_eq!(content_type_for(Path::new("a.mkv")), "video/x-matroska");
        assert_eq!(content_type_for(Path::new("a.ts")), "video/mp2t");
        assert_eq!(
            content_type_for(Path::new("a.m3u8")),
            "application/vnd.apple.mpegurl"
        );
    }

    #[test]
    fn test_content_type_case_insensitive() {
        assert_eq!(content_type_for(Path::new("A.WEBM")), "video/webm");
    }

    #[test]
    fn test_content_type_defaults_to_mp4() {
        assert_eq!(content_type_for(Path::new("a.bin")), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("no_extension")), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_video_extensions_exclude_playlists() {
        assert!(!VIDEO_EXTENSIONS.contains(&"m3u8"));
        assert!(VIDEO_EXTENSIONS.contains(&"mp4"));
    }
}
