//! Minimal HTML page embedding a third-party player.

use clipvault_db::models::VideoRecord;

use crate::config::PlayerConfig;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Canonical byte-streaming URL of a record.
pub fn stream_path(record: &VideoRecord) -> String {
    format!("/videos/{}/stream", urlencoding::encode(&record.video_id))
}

/// Render the browser page for `record`.
///
/// The `<video>` element always points at the stream route, which never
/// negotiates, so the player cannot be handed HTML.
pub fn render_player_page(record: &VideoRecord, player: &PlayerConfig) -> String {
    let title = escape_html(record.title.as_deref().unwrap_or(&record.video_id));
    let src = escape_html(&stream_path(record));
    let content_type = clipvault_common::paths::content_type_for(std::path::Path::new(
        &record.file_path,
    ));

    let track = record
        .captions_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| {
            format!(
                "\n      <track kind=\"captions\" src=\"{}\" srclang=\"en\" label=\"Captions\" default>",
                escape_html(url)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <link rel="stylesheet" href="{stylesheet}">
    <style>html,body{{margin:0;height:100%;background:#000}}.video-js{{width:100%;height:100%}}</style>
  </head>
  <body>
    <video id="player" class="video-js vjs-big-play-centered" controls preload="metadata" playsinline crossorigin="anonymous">
      <source src="{src}" type="{content_type}">{track}
    </video>
    <script src="{script}"></script>
    <script>videojs('player');</script>
  </body>
</html>
"#,
        stylesheet = escape_html(&player.stylesheet_url),
        script = escape_html(&player.script_url),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clipvault_common::VideoStatus;

    fn record() -> VideoRecord {
        VideoRecord {
            video_id: "VID 42".into(),
            redirect_slug: Some("ab12cd34ef".into()),
            file_path: "misc/old_name_42.webm".into(),
            streaming_url: None,
            size: 1,
            status: VideoStatus::Active,
            version: 1,
            source_kind: None,
            captions_url: None,
            title: Some("Launch <Keynote> & Q&A".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn page_points_at_stream_route() {
        let html = render_player_page(&record(), &PlayerConfig::default());
        assert!(html.contains(r#"<source src="/videos/VID%2042/stream" type="video/webm">"#));
        assert!(html.contains("<title>Launch &lt;Keynote&gt; &amp; Q&amp;A</title>"));
        assert!(html.contains(&PlayerConfig::default().script_url));
        assert!(!html.contains("<track"));
    }

    #[test]
    fn captions_track_is_embedded() {
        let mut rec = record();
        rec.captions_url = Some("/captions/VID_42.vtt?lang=en&v=2".into());
        let html = render_player_page(&rec, &PlayerConfig::default());
        assert!(html.contains(
            r#"<track kind="captions" src="/captions/VID_42.vtt?lang=en&amp;v=2" srclang="en" label="Captions" default>"#
        ));
    }

    #[test]
    fn title_falls_back_to_video_id() {
        let mut rec = record();
        rec.title = None;
        let html = render_player_page(&rec, &PlayerConfig::default());
        assert!(html.contains("<title>VID 42</title>"));
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
