use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{Instant, timeout, timeout_at};

use super::{AdapterEvent, Emitter, HandleCore, Progress};
use crate::clients::{VimeoClient, VimeoEmbed, VimeoEvent, VimeoPlayer};
use crate::config::TrackerConfig;
use crate::error::{Backend, TrackerError};
use crate::format::display_secs;

/// Adapter for the promise-based player. Position and duration come from asynchronous
/// queries, which are serialized through a gate so a stale answer can never overwrite a
/// newer one. Each query is bounded by the query timeout.
pub(crate) struct VimeoAdapter {
    client: Arc<dyn VimeoClient>,
    video_id: Option<String>,
}

/// Everything the driver and the poll ticks share
#[derive(Clone)]
struct Session {
    player: Arc<dyn VimeoPlayer>,
    emitter: Emitter,
    progress: Arc<Mutex<Progress>>,
    gate: Arc<tokio::sync::Mutex<()>>,
    query_timeout: Duration,
}

impl VimeoAdapter {
    pub(crate) fn new(client: Arc<dyn VimeoClient>, video_id: Option<String>) -> Self {
        Self { client, video_id }
    }

    pub(crate) async fn run(self, core: Arc<HandleCore>) {
        let Some(video_id) = self.video_id else {
            warn!("Vimeo URL carries no numeric id, waiting for another source");
            core.emitter.emit(AdapterEvent::SourceNotReady);
            return;
        };

        let sdk_timeout = core.config.sdk_load_timeout();
        match timeout(sdk_timeout, self.client.load_sdk()).await {
            Ok(Ok(())) => debug!("Vimeo SDK available"),
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

        let embed = VimeoEmbed {
            element_id: core.config.vimeo_element_id.clone(),
            src: TrackerConfig::vimeo_embed_src(&video_id),
        };
        let (tx, mut events) = mpsc::unbounded_channel();
        let player = match self.client.create_player(&embed, tx) {
            Ok(player) => player,
            Err(e) => {
                core.fail(format!("Failed to create player: {:#}", e));
                return;
            }
        };
        if !core.bind_vimeo(player.clone()) {
            return;
        }

        let session = Session {
            player,
            emitter: core.emitter.clone(),
            progress: Arc::new(Mutex::new(Progress::default())),
            gate: Arc::new(tokio::sync::Mutex::new(())),
            query_timeout: core.config.query_timeout(),
        };

        if !wait_until_loaded(&core, &session, &mut events).await {
            return;
        }

        // Ready does not wait on the duration; it arrives with a later sample
        info!("Vimeo player loaded for {}", video_id);
        core.emitter.emit(AdapterEvent::Ready);
        session.publish();
        if session.progress.lock().playing {
            start_polling(&core, &session);
        }
        session.refresh_duration_later();

        while let Some(event) = events.recv().await {
            match event {
                VimeoEvent::Play => {
                    session.set_playing(true);
                    start_polling(&core, &session);
                }
                VimeoEvent::Pause | VimeoEvent::Ended => {
                    core.stop_poll();
                    session.set_playing(false);
                    debug!("Vimeo playback {:?}", event);
                }
                VimeoEvent::Loaded => {
                    // A new video loaded into the same player
                    session.refresh_duration_later();
                }
            }
            if !session.publish() {
                break;
            }
        }
    }
}

impl Session {
    fn set_playing(&self, playing: bool) {
        self.progress.lock().playing = playing;
    }

    fn publish(&self) -> bool {
        let sample = self.progress.lock().sample();
        self.emitter.sample(sample)
    }

    /// Query the duration on a separate task, waiting behind any outstanding query, and
    /// publish once it is known. The driver keeps handling play and pause meanwhile.
    fn refresh_duration_later(&self) {
        let session = self.clone();
        tokio::spawn(async move {
            let _turn = session.gate.lock().await;
            if session.query_duration().await {
                session.publish();
            }
        });
    }

    async fn query_duration(&self) -> bool {
        match self.query("duration", self.player.duration()).await {
            Some(duration) => {
                self.progress.lock().duration = duration;
                debug!("Vimeo duration known: {}", display_secs(duration));
                true
            }
            None => false,
        }
    }

    /// Await one player query within the query timeout. Failures and timeouts are
    /// transient: logged, and retried by the next tick.
    async fn query<F>(&self, what: &str, query: F) -> Option<f64>
    where
        F: Future<Output = anyhow::Result<f64>>,
    {
        let err = match timeout(self.query_timeout, query).await {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(e)) => TrackerError::query_failed(Backend::Vimeo, &e),
            Err(_) => TrackerError::TransientQueryFailure {
                backend: Backend::Vimeo,
                reason: format!("{} not answered within {:?}", what, self.query_timeout),
            },
        };
        if self.emitter.is_live() {
            warn!("{}, retrying on the next tick", err);
        }
        None
    }

    /// One poll tick. Skipped outright when a query is still outstanding.
    async fn tick(&self) {
        let Ok(_turn) = self.gate.try_lock() else {
            debug!("Vimeo query still outstanding, skipping tick");
            return;
        };

        if self.progress.lock().duration <= 0.0 {
            self.query_duration().await;
        }

        if let Some(current) = self.query("position", self.player.current_time()).await {
            if !self.emitter.is_live() {
                return;
            }
            self.progress.lock().current = current;
            self.publish();
        }
    }
}

/// Wait for the loaded notification within the readiness timeout. Play and pause seen
/// before that are folded into the session's play state.
async fn wait_until_loaded(
    core: &HandleCore,
    session: &Session,
    events: &mut UnboundedReceiver<VimeoEvent>,
) -> bool {
    let limit = core.config.readiness_timeout();
    let deadline = Instant::now() + limit;

    loop {
        match timeout_at(deadline, events.recv()).await {
            Ok(Some(VimeoEvent::Loaded)) => return true,
            Ok(Some(event)) => {
                debug!("Vimeo {:?} before load, deferring", event);
                session.set_playing(event == VimeoEvent::Play);
            }
            Ok(None) => {
                core.fail("player went away before loading");
                return false;
            }
            Err(_) => {
                core.fail(format!("player not loaded after {:?}", limit));
                return false;
            }
        }
    }
}

fn start_polling(core: &HandleCore, session: &Session) {
    let session = session.clone();
    core.start_poll(move || {
        let session = session.clone();
        async move { session.tick().await }
    });
}
