
use std::sync::Arc;

use log::{debug, info};
use tokio::sync::watch;

use crate::adapter::{AdapterEvent, AdapterHandle, SampleSink};
use crate::classify::classify;
use crate::clients::Backends;
use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::format::format_time;
use crate::lifecycle::LifecycleManager;
use crate::{PlaybackSample, SourceKind};

/// Where the active source stands
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TrackerStatus {
    /// Nothing is being tracked
    #[default]
    Idle,
    /// Waiting for the backend to load and become ready
    Loading,
    /// The backend is reporting progress
    Ready,
    /// The URL was recognized but carries no video id
    SourceNotReady,
    /// The backend failed to load or never became ready
    Unavailable(TrackerError),
}

/// What the presentation layer sees
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WatchSnapshot {
    pub sample: PlaybackSample,
    pub status: TrackerStatus,
}

impl WatchSnapshot {
    /// Formatted watch time, e.g. `"1m 5s"`
    pub fn watch_time_display(&self) -> String {
        format_time(self.sample.watched_secs())
    }

    /// Formatted total duration, `"0s"` while unknown
    pub fn duration_display(&self) -> String {
        format_time(self.sample.duration_secs())
    }

    fn apply(&mut self, event: AdapterEvent) {
        match event {
            AdapterEvent::Sample(sample) => self.sample = sample,
            AdapterEvent::Ready => self.status = TrackerStatus::Ready,
            AdapterEvent::SourceNotReady => self.status = TrackerStatus::SourceNotReady,
            AdapterEvent::Unavailable(err) => self.status = TrackerStatus::Unavailable(err),
        }
    }
}

/// Tracks watch progress of whichever source was set last.
///
/// Push-driven and poll-driven backends both end up as snapshots published on one
/// [`watch`] channel, one snapshot per applied event.
pub struct WatchTimeObserver {
    lifecycle: LifecycleManager,
    source: Option<(SourceKind, String)>,
    state: Arc<watch::Sender<WatchSnapshot>>,
}

impl WatchTimeObserver {
    pub fn new(backends: Backends, config: TrackerConfig) -> Self {
        let (state, _) = watch::channel(WatchSnapshot::default());
        Self {
            lifecycle: LifecycleManager::new(backends, config),
            source: None,
            state: Arc::new(state),
        }
    }

    /// Track a new URL. Re-classifies on every call; an unchanged URL is a no-op.
    ///
    /// An unrecognized URL clears the active handle, resets the sample and is reported as
    /// [`TrackerError::UnrecognizedSource`]. Must be called inside a tokio runtime.
    pub fn set_source(&mut self, url: &str) -> Result<(), TrackerError> {
        let url = url.trim();
        let kind = classify(url);

        if kind == SourceKind::Unrecognized {
            if self.source.is_some() {
                info!("Unrecognized URL, no longer tracking");
            }
            self.lifecycle.clear();
            self.source = None;
            self.state.send_replace(WatchSnapshot::default());
            return Err(TrackerError::UnrecognizedSource {
                url: url.to_string(),
            });
        }

        if let Some((current_kind, current_url)) = &self.source {
            if *current_kind == kind && current_url == url {
                debug!("Source unchanged: {}", url);
                return Ok(());
            }
        }

        info!("Tracking {:?}", kind);

        // The old handle goes first so none of its events can land on the fresh snapshot
        self.lifecycle.clear();
        self.state.send_replace(WatchSnapshot {
            sample: PlaybackSample::default(),
            status: TrackerStatus::Loading,
        });
        let sink = self.sink();
        self.lifecycle.replace(kind.clone(), url, sink);
        self.source = Some((kind, url.to_string()));
        Ok(())
    }

    /// Latest sample; the zero sample when nothing is tracked
    pub fn current_sample(&self) -> PlaybackSample {
        self.state.borrow().sample
    }

    pub fn status(&self) -> TrackerStatus {
        self.state.borrow().status.clone()
    }

    pub fn snapshot(&self) -> WatchSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<WatchSnapshot> {
        self.state.subscribe()
    }

    /// Classification of the tracked source
    pub fn source(&self) -> Option<&SourceKind> {
        self.source.as_ref().map(|(kind, _)| kind)
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn active_handle(&self) -> Option<&AdapterHandle> {
        self.lifecycle.active()
    }

    /// Poll timers running right now, across all handles
    pub fn live_poll_timers(&self) -> usize {
        self.lifecycle.timers().live()
    }

    /// Most poll timers ever running at once
    pub fn peak_poll_timers(&self) -> usize {
        self.lifecycle.timers().peak()
    }

    /// Unmount: destroy the active handle and return to the idle state
    pub fn shutdown(&mut self) {
        self.lifecycle.teardown();
        self.source = None;
        self.state.send_replace(WatchSnapshot::default());
    }

    fn sink(&self) -> SampleSink {
        let state = self.state.clone();
        Arc::new(move |event: AdapterEvent| {
            state.send_modify(|snapshot| snapshot.apply(event));
        })
    }
}
