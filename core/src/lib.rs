pub mod adapter;
pub mod classify;
pub mod clients;
pub mod config;
pub mod error;
pub mod format;
pub mod lifecycle;
pub mod observer;
pub mod timer;

#[cfg(test)]
mod testing;

// Re-exports
pub use adapter::{AdapterEvent, AdapterHandle, SampleSink};
pub use classify::classify;
pub use clients::Backends;
pub use config::TrackerConfig;
pub use error::{Backend, TrackerError};
pub use format::{floor_secs, format_time};
pub use lifecycle::LifecycleManager;
pub use observer::{TrackerStatus, WatchSnapshot, WatchTimeObserver};
pub use timer::{PollTimer, TimerRegistry};

/// What a raw URL resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// YouTube video, with its id when the URL carries one
    Youtube(Option<String>),
    /// Vimeo video, with its numeric id when the URL carries one
    Vimeo(Option<String>),
    /// Direct media file, located by the URL itself
    File(String),
    /// Matches none of the known patterns
    Unrecognized,
}

impl SourceKind {
    /// Backend family that tracks this source
    pub fn backend(&self) -> Option<Backend> {
        match self {
            SourceKind::Youtube(_) => Some(Backend::Youtube),
            SourceKind::Vimeo(_) => Some(Backend::Vimeo),
            SourceKind::File(_) => Some(Backend::MediaElement),
            SourceKind::Unrecognized => None,
        }
    }

    /// Platform video id, if any
    pub fn video_id(&self) -> Option<&str> {
        match self {
            SourceKind::Youtube(id) | SourceKind::Vimeo(id) => id.as_deref(),
            _ => None,
        }
    }
}

/// Snapshot of playback progress. A new sample supersedes the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackSample {
    /// Current position in seconds
    pub current_time: f64,
    /// Total duration in seconds, 0 when unknown
    pub total_duration: f64,
    /// Whether the backend reports playback in progress
    pub is_playing: bool,
}

impl PlaybackSample {
    /// Build a sample, clamping negative or non-finite readings to zero
    pub fn new(current_time: f64, total_duration: f64, is_playing: bool) -> Self {
        Self {
            current_time: non_negative(current_time),
            total_duration: non_negative(total_duration),
            is_playing,
        }
    }

    /// Whole seconds watched
    pub fn watched_secs(&self) -> u64 {
        floor_secs(self.current_time)
    }

    /// Whole seconds of total duration
    pub fn duration_secs(&self) -> u64 {
        floor_secs(self.total_duration)
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}
