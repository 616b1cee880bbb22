use std::time::Duration;

use serde::Deserialize;

/// Tunables for the tracker. Every field has a default so partial config files work.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Period of the position poll for backends without push updates
    pub poll_interval_ms: u64,
    /// How long to wait for a platform SDK script before giving up
    pub sdk_load_timeout_ms: u64,
    /// How long a constructed player may take to signal readiness
    pub readiness_timeout_ms: u64,
    /// How long a single promise-style position or duration query may stay unanswered
    pub query_timeout_ms: u64,
    /// Mount identifier handed to the YouTube player
    pub youtube_mount_id: String,
    /// Element identifier of the Vimeo iframe
    pub vimeo_element_id: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            sdk_load_timeout_ms: 10_000,
            readiness_timeout_ms: 15_000,
            query_timeout_ms: 5_000,
            youtube_mount_id: "youtube-player".to_string(),
            vimeo_element_id: "vimeo-player".to_string(),
        }
    }
}

impl TrackerConfig {
    pub fn poll_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn sdk_load_timeout(&self) -> Duration {
        Duration::from_millis(self.sdk_load_timeout_ms)
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms.max(1))
    }

    /// Source URL of the Vimeo embed for a video id
    pub fn vimeo_embed_src(video_id: &str) -> String {
        format!("https://player.vimeo.com/video/{}", video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.youtube_mount_id, "youtube-player");
        assert_eq!(config.query_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{ "poll_interval_ms": 250 }"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.readiness_timeout(), Duration::from_secs(15));
        assert_eq!(config.vimeo_element_id, "vimeo-player");
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let config = TrackerConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_vimeo_embed_src() {
        assert_eq!(
            TrackerConfig::vimeo_embed_src("76979871"),
            "https://player.vimeo.com/video/76979871"
        );
    }
}
