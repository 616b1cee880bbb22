use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{Instant, timeout, timeout_at};

use super::{AdapterEvent, HandleCore, Progress};
use crate::clients::{YoutubeClient, YoutubeEvent, YoutubePlayer, YoutubeState};
use crate::format::display_secs;

/// Adapter for the callback-driven player: readiness and state changes are pushed,
/// position is pulled by a poll timer while playing.
pub(crate) struct YoutubeAdapter {
    client: Arc<dyn YoutubeClient>,
    video_id: Option<String>,
}

impl YoutubeAdapter {
    pub(crate) fn new(client: Arc<dyn YoutubeClient>, video_id: Option<String>) -> Self {
        Self { client, video_id }
    }

    pub(crate) async fn run(self, core: Arc<HandleCore>) {
        let Some(video_id) = self.video_id else {
            warn!("YouTube URL carries no video id, waiting for another source");
            core.emitter.emit(AdapterEvent::SourceNotReady);
            return;
        };

        let sdk_timeout = core.config.sdk_load_timeout();
        match timeout(sdk_timeout, self.client.load_sdk()).await {
            Ok(Ok(())) => debug!("YouTube SDK available"),
            Ok(Err(e)) => {
                core.fail(format!("SDK failed to load: {:#}", e));
                return;
            }
            Err(_) => {
                core.fail(format!("SDK not loaded after {:?}", sdk_timeout));
                return;
            }
        }
        if !core.is_live() {
            return;
        }

        let (tx, mut events) = mpsc::unbounded_channel();
        let player = match self
            .client
            .create_player(&core.config.youtube_mount_id, &video_id, tx)
        {
            Ok(player) => player,
            Err(e) => {
                core.fail(format!("Failed to create player: {:#}", e));
                return;
            }
        };
        if !core.bind_youtube(player.clone()) {
            return;
        }

        let Some(playing) = wait_until_ready(&core, &mut events).await else {
            return;
        };

        // Duration is read once at readiness and carried by every later sample
        let mut progress = Progress {
            current: player.current_time(),
            duration: player.duration(),
            playing,
        };
        info!(
            "YouTube player ready for {} (duration {})",
            video_id,
            display_secs(progress.duration)
        );
        core.emitter.emit(AdapterEvent::Ready);
        core.emitter.sample(progress.sample());
        if playing {
            start_polling(&core, &player, progress.duration);
        }

        while let Some(event) = events.recv().await {
            match event {
                YoutubeEvent::StateChange(state) => {
                    progress.current = player.current_time();
                    progress.playing = state == YoutubeState::Playing;
                    if progress.playing {
                        start_polling(&core, &player, progress.duration);
                    } else {
                        core.stop_poll();
                        debug!(
                            "YouTube playback {:?} at {}",
                            state,
                            display_secs(progress.current)
                        );
                    }
                    if !core.emitter.sample(progress.sample()) {
                        break;
                    }
                }
                YoutubeEvent::Ready => debug!("Duplicate ready notification ignored"),
            }
        }
    }
}

/// Wait for the ready notification within the readiness timeout. State changes seen before
/// readiness are remembered; the returned flag says whether playback is already under way.
async fn wait_until_ready(
    core: &HandleCore,
    events: &mut UnboundedReceiver<YoutubeEvent>,
) -> Option<bool> {
    let limit = core.config.readiness_timeout();
    let deadline = Instant::now() + limit;
    let mut playing = false;

    loop {
        match timeout_at(deadline, events.recv()).await {
            Ok(Some(YoutubeEvent::Ready)) => return Some(playing),
            Ok(Some(YoutubeEvent::StateChange(state))) => {
                debug!("YouTube state {:?} before readiness, deferring", state);
                playing = state == YoutubeState::Playing;
            }
            Ok(None) => {
                core.fail("player went away before signalling readiness");
                return None;
            }
            Err(_) => {
                core.fail(format!("player not ready after {:?}", limit));
                return None;
            }
        }
    }
}

fn start_polling(core: &HandleCore, player: &Arc<dyn YoutubePlayer>, duration: f64) {
    let player = player.clone();
    let emitter = core.emitter.clone();
    core.start_poll(move || {
        let sample = Progress {
            current: player.current_time(),
            duration,
            playing: true,
        }
        .sample();
        emitter.sample(sample);
        async {}
    });
}
