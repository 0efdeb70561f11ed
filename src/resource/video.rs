//! Video - a playable media item referenced by sequences.

use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind};

/// Source platform a video URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoSource {
    Youtube,
    Vimeo,
    Facebook,
    Soundcloud,
    Streamable,
    Wistia,
    Twitch,
    Dailymotion,
    Mixcloud,
    Vidyard,
    Kaltura,
    File,
}

/// A media item. Immutable once created except through explicit update
/// mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub source: VideoSource,
    pub created_at: String,
    pub updated_at: String,
}

impl Resource for Video {
    const KIND: ResourceKind = ResourceKind::Video;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Detect the source platform from a URL. Unknown hosts fall back to `File`,
/// matching direct media links.
pub fn detect_video_source(url: &str) -> VideoSource {
    const HOSTS: &[(&str, VideoSource)] = &[
        ("youtube.com", VideoSource::Youtube),
        ("youtu.be", VideoSource::Youtube),
        ("vimeo.com", VideoSource::Vimeo),
        ("facebook.com", VideoSource::Facebook),
        ("soundcloud.com", VideoSource::Soundcloud),
        ("streamable.com", VideoSource::Streamable),
        ("wistia.com", VideoSource::Wistia),
        ("twitch.tv", VideoSource::Twitch),
        ("dailymotion.com", VideoSource::Dailymotion),
        ("mixcloud.com", VideoSource::Mixcloud),
        ("vidyard.com", VideoSource::Vidyard),
        ("kaltura.com", VideoSource::Kaltura),
    ];

    for (host, source) in HOSTS {
        if url.contains(host) {
            return *source;
        }
    }
    VideoSource::File
}

/// Extract the video id from a YouTube watch/short/embed URL.
pub fn extract_youtube_video_id(url: &str) -> Option<&str> {
    const MARKERS: &[&str] = &["youtube.com/watch?v=", "youtu.be/", "youtube.com/embed/"];

    for marker in MARKERS {
        if let Some(pos) = url.find(marker) {
            let rest = &url[pos + marker.len()..];
            let end = rest
                .find(|c| matches!(c, '&' | '\n' | '?' | '#'))
                .unwrap_or(rest.len());
            if end > 0 {
                return Some(&rest[..end]);
            }
        }
    }
    None
}

/// Thumbnail URL for a YouTube video, at the medium-quality size the
/// console's tables use.
pub fn youtube_thumbnail(url: &str) -> Option<String> {
    extract_youtube_video_id(url)
        .map(|id| format!("https://img.youtube.com/vi/{}/mqdefault.jpg", id))
}

/// Format a duration in seconds as `h:mm:ss` or `m:ss`.
pub fn format_duration(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Whether the string parses as an absolute http(s) URL.
pub fn is_valid_video_url(url: &str) -> bool {
    let rest = if let Some(rest) = url.strip_prefix("https://") {
        rest
    } else if let Some(rest) = url.strip_prefix("http://") {
        rest
    } else {
        return false;
    };

    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    !host.is_empty()
}
