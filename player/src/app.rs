use std::io::Write;

use anyhow::Result;
use log::debug;
use watch_core::{TrackerError, TrackerStatus, WatchSnapshot, WatchTimeObserver};

use crate::commands;
use crate::ui;

/// What was last drawn, so unchanged ticks print nothing
#[derive(Debug, Clone, PartialEq)]
struct Shown {
    watch_time: String,
    duration: String,
    playing: bool,
    status: TrackerStatus,
}

impl Shown {
    fn of(snapshot: &WatchSnapshot) -> Self {
        Self {
            watch_time: snapshot.watch_time_display(),
            duration: snapshot.duration_display(),
            playing: snapshot.sample.is_playing,
            status: snapshot.status.clone(),
        }
    }
}

// App state
pub struct App {
    /// Tracker for the URL entered last
    pub observer: WatchTimeObserver,
    /// Whether the app should exit
    pub should_quit: bool,
    last_shown: Option<Shown>,
}

impl App {
    pub fn new(observer: WatchTimeObserver) -> Self {
        Self {
            observer,
            should_quit: false,
            last_shown: None,
        }
    }

    /// Handle one line of input: a `:command` or a URL to track
    pub fn handle_input(&mut self, out: &mut impl Write, line: &str) -> Result<()> {
        let line = line.trim();
        if let Some(command) = line.strip_prefix(':') {
            return commands::handle_command(self, out, command);
        }
        self.open_source(out, line)
    }

    /// Track a URL, reporting unrecognized input inline
    pub fn open_source(&mut self, out: &mut impl Write, url: &str) -> Result<()> {
        match self.observer.set_source(url) {
            Ok(()) => {
                if let Some(kind) = self.observer.source() {
                    ui::draw_tracking(out, kind)?;
                }
            }
            Err(TrackerError::UnrecognizedSource { url }) if url.is_empty() => {
                ui::draw_prompt(out)?;
            }
            Err(e) => {
                debug!("Rejected input: {}", e);
                ui::draw_error(out, &e.to_string())?;
                ui::draw_prompt(out)?;
            }
        }
        Ok(())
    }

    /// Draw a snapshot unless it would look the same as the last one drawn
    pub fn on_snapshot(&mut self, out: &mut impl Write, snapshot: &WatchSnapshot) -> Result<()> {
        let shown = Shown::of(snapshot);
        if self.last_shown.as_ref() == Some(&shown) {
            return Ok(());
        }
        ui::draw_snapshot(out, snapshot)?;
        self.last_shown = Some(shown);
        Ok(())
    }

    /// Draw the latest snapshot even if it was drawn before
    pub fn redraw(&mut self, out: &mut impl Write) -> Result<()> {
        self.last_shown = None;
        let snapshot = self.observer.snapshot();
        let Some(handle) = self.observer.active_handle() else {
            ui::draw_message(out, "Nothing is being tracked")?;
            return Ok(());
        };
        let origin = format!("{} handle {}: {}", handle.backend(), handle.id(), handle.url());
        ui::draw_message(out, &origin)?;
        self.on_snapshot(out, &snapshot)
    }

    pub fn shutdown(&mut self) {
        self.observer.shutdown();
        self.last_shown = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::sim;
    use watch_core::{PlaybackSample, TrackerConfig};

    fn app() -> App {
        let backends = sim::backends(&SimulationConfig::default());
        App::new(WatchTimeObserver::new(backends, TrackerConfig::default()))
    }

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_unrecognized_url_prints_error_and_prompt() {
        let mut app = app();
        let mut out = Vec::new();
        app.handle_input(&mut out, "not a video").unwrap();
        let text = text(out);
        assert!(text.contains("Unrecognized video URL"));
        assert!(text.contains(ui::PROMPT));
        assert!(app.observer.source().is_none());
    }

    #[tokio::test]
    async fn test_empty_line_prints_prompt_only() {
        let mut app = app();
        let mut out = Vec::new();
        app.handle_input(&mut out, "   ").unwrap();
        let text = text(out);
        assert!(!text.contains("Error"));
        assert!(text.contains(ui::PROMPT));
    }

    #[tokio::test]
    async fn test_url_starts_tracking() {
        let mut app = app();
        let mut out = Vec::new();
        app.handle_input(&mut out, "https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert!(text(out).contains("YouTube video dQw4w9WgXcQ"));
        assert_eq!(app.observer.status(), TrackerStatus::Loading);
        app.shutdown();
        assert_eq!(app.observer.status(), TrackerStatus::Idle);
    }

    #[tokio::test]
    async fn test_unchanged_snapshot_is_not_redrawn() {
        let mut app = app();
        let snapshot = WatchSnapshot {
            sample: PlaybackSample::new(10.2, 60.0, true),
            status: TrackerStatus::Ready,
        };
        let mut out = Vec::new();
        app.on_snapshot(&mut out, &snapshot).unwrap();
        assert!(!out.is_empty());

        // Same whole seconds
        let later = WatchSnapshot {
            sample: PlaybackSample::new(10.7, 60.0, true),
            ..snapshot.clone()
        };
        let mut out = Vec::new();
        app.on_snapshot(&mut out, &later).unwrap();
        assert!(out.is_empty());

        let paused = WatchSnapshot {
            sample: PlaybackSample::new(10.7, 60.0, false),
            ..snapshot
        };
        let mut out = Vec::new();
        app.on_snapshot(&mut out, &paused).unwrap();
        assert!(text(out).contains("paused"));
    }
}
