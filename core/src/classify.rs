use once_cell::sync::Lazy;
use regex::Regex;

use crate::SourceKind;

static YOUTUBE_QUERY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]v=([^&#]+)").expect("valid youtube query regex"));
static YOUTUBE_PATH_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtu\.be/|youtube\.com/(?:embed|shorts)/)([^?&#/]+)")
        .expect("valid youtube path regex")
});
static VIMEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"vimeo\.com/(?:video/)?(\d+)").expect("valid vimeo regex"));
static MEDIA_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mp4|webm|ogg)$").expect("valid media extension regex"));

/// Classify a raw URL into the backend that can track it.
///
/// Never fails: anything that matches no rule is [`SourceKind::Unrecognized`].
pub fn classify(url: &str) -> SourceKind {
    let url = url.trim();

    if is_youtube_url(url) {
        return SourceKind::Youtube(extract_youtube_id(url));
    }

    if is_vimeo_url(url) {
        return SourceKind::Vimeo(extract_vimeo_id(url));
    }

    if is_media_file_url(url) {
        return SourceKind::File(url.to_string());
    }

    SourceKind::Unrecognized
}

/// Check if a URL points at YouTube
pub fn is_youtube_url(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

/// Check if a URL points at Vimeo
pub fn is_vimeo_url(url: &str) -> bool {
    url.contains("vimeo.com")
}

/// Check if a URL names a media container the native element can play directly
pub fn is_media_file_url(url: &str) -> bool {
    MEDIA_FILE.is_match(url)
}

/// Extract the video id from a watch URL (`?v=`), a short link or an embed/shorts path.
pub fn extract_youtube_id(url: &str) -> Option<String> {
    YOUTUBE_QUERY_ID
        .captures(url)
        .or_else(|| YOUTUBE_PATH_ID.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|id| !id.is_empty())
}

/// Extract the numeric video id from a Vimeo URL
pub fn extract_vimeo_id(url: &str) -> Option<String> {
    VIMEO_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
