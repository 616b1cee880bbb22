use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use watch_core::Backends;
use watch_core::clients::{
    MediaElementHost, MediaEvent, MediaSubscription, VimeoClient, VimeoEmbed, VimeoEvent,
    VimeoPlayer, YoutubeClient, YoutubeEvent, YoutubePlayer, YoutubeState,
};

use crate::config::SimulationConfig;

/// Build simulated stand-ins for the embeddable players and the native media element.
///
/// Each simulated player autoplays at normal speed once ready and stops at the end of the
/// configured duration. With `offline` set the SDK scripts never finish loading.
pub fn backends(config: &SimulationConfig) -> Backends {
    Backends {
        youtube: Arc::new(SimYoutube {
            config: config.clone(),
        }),
        vimeo: Arc::new(SimVimeo {
            config: config.clone(),
        }),
        media: Arc::new(SimMediaHost {
            config: config.clone(),
        }),
    }
}

/// Playback position that advances in real time while playing
struct Clock {
    offset: f64,
    started: Option<Instant>,
    duration: f64,
}

impl Clock {
    fn new(duration: f64) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            offset: 0.0,
            started: None,
            duration,
        }))
    }

    fn position(&self) -> f64 {
        let running = self
            .started
            .map(|started| started.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.offset + running).min(self.duration)
    }

    fn play(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.offset = self.position();
        self.started = None;
    }

    fn remaining(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration - self.position()).unwrap_or_default()
    }

    fn finished(&self) -> bool {
        self.position() >= self.duration
    }
}

/// The task standing in for the remote player's own behaviour
#[derive(Default)]
struct Script {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Script {
    fn run(task: JoinHandle<()>) -> Self {
        Self {
            task: Mutex::new(Some(task)),
        }
    }

    fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

async fn load_sdk(config: &SimulationConfig, name: &str) -> Result<()> {
    if config.offline {
        warn!("Simulated network is offline, the {} SDK will never load", name);
        std::future::pending::<()>().await;
    }
    sleep(Duration::from_millis(config.sdk_delay_ms)).await;
    debug!("{} SDK loaded", name);
    Ok(())
}

struct SimYoutube {
    config: SimulationConfig,
}

#[async_trait]
impl YoutubeClient for SimYoutube {
    async fn load_sdk(&self) -> Result<()> {
        load_sdk(&self.config, "YouTube").await
    }

    fn create_player(
        &self,
        mount_id: &str,
        video_id: &str,
        events: UnboundedSender<YoutubeEvent>,
    ) -> Result<Arc<dyn YoutubePlayer>> {
        info!("Mounting simulated YouTube player for {} on #{}", video_id, mount_id);
        let clock = Clock::new(self.config.duration_secs);
        let ready_delay = Duration::from_millis(self.config.ready_delay_ms);
        let script = tokio::spawn(youtube_script(clock.clone(), events, ready_delay));
        Ok(Arc::new(SimYoutubePlayer {
            clock,
            script: Script::run(script),
        }))
    }
}

async fn youtube_script(
    clock: Arc<Mutex<Clock>>,
    events: UnboundedSender<YoutubeEvent>,
    ready_delay: Duration,
) {
    sleep(ready_delay).await;
    if events.send(YoutubeEvent::Ready).is_err() {
        return;
    }
    clock.lock().play();
    let _ = events.send(YoutubeEvent::StateChange(YoutubeState::Playing));

    let remaining = clock.lock().remaining();
    sleep(remaining).await;
    clock.lock().pause();
    let _ = events.send(YoutubeEvent::StateChange(YoutubeState::Ended));
}

struct SimYoutubePlayer {
    clock: Arc<Mutex<Clock>>,
    script: Script,
}

impl YoutubePlayer for SimYoutubePlayer {
    fn current_time(&self) -> f64 {
        self.clock.lock().position()
    }

    fn duration(&self) -> f64 {
        self.clock.lock().duration
    }

    fn destroy(&self) {
        self.script.stop();
    }
}

struct SimVimeo {
    config: SimulationConfig,
}

#[async_trait]
impl VimeoClient for SimVimeo {
    async fn load_sdk(&self) -> Result<()> {
        load_sdk(&self.config, "Vimeo").await
    }

    fn create_player(
        &self,
        embed: &VimeoEmbed,
        events: UnboundedSender<VimeoEvent>,
    ) -> Result<Arc<dyn VimeoPlayer>> {
        info!("Embedding simulated Vimeo player {} in #{}", embed.src, embed.element_id);
        let clock = Clock::new(self.config.duration_secs);
        let ready_delay = Duration::from_millis(self.config.ready_delay_ms);
        let script = tokio::spawn(vimeo_script(clock.clone(), events, ready_delay));
        Ok(Arc::new(SimVimeoPlayer {
            clock,
            script: Script::run(script),
        }))
    }
}

async fn vimeo_script(
    clock: Arc<Mutex<Clock>>,
    events: UnboundedSender<VimeoEvent>,
    ready_delay: Duration,
) {
    sleep(ready_delay).await;
    if events.send(VimeoEvent::Loaded).is_err() {
        return;
    }
    clock.lock().play();
    let _ = events.send(VimeoEvent::Play);

    let remaining = clock.lock().remaining();
    sleep(remaining).await;
    clock.lock().pause();
    let _ = events.send(VimeoEvent::Ended);
}

/// Promise round trip of the embedded player
const QUERY_LATENCY: Duration = Duration::from_millis(20);

struct SimVimeoPlayer {
    clock: Arc<Mutex<Clock>>,
    script: Script,
}

#[async_trait]
impl VimeoPlayer for SimVimeoPlayer {
    async fn current_time(&self) -> Result<f64> {
        sleep(QUERY_LATENCY).await;
        Ok(self.clock.lock().position())
    }

    async fn duration(&self) -> Result<f64> {
        sleep(QUERY_LATENCY).await;
        Ok(self.clock.lock().duration)
    }

    fn destroy(&self) {
        self.script.stop();
    }
}

struct SimMediaHost {
    config: SimulationConfig,
}

impl MediaElementHost for SimMediaHost {
    fn attach(
        &self,
        src: &str,
        events: UnboundedSender<MediaEvent>,
    ) -> Result<Box<dyn MediaSubscription>> {
        info!("Attaching simulated media element to {}", src);
        let clock = Clock::new(self.config.duration_secs);
        let period = Duration::from_millis(self.config.time_update_ms.max(1));
        let script = tokio::spawn(media_script(clock, events, period));
        Ok(Box::new(SimSubscription {
            script: Script::run(script),
        }))
    }
}

async fn media_script(
    clock: Arc<Mutex<Clock>>,
    events: UnboundedSender<MediaEvent>,
    period: Duration,
) {
    // Metadata arrives shortly after the source is set
    sleep(Duration::from_millis(100)).await;
    let duration = clock.lock().duration;
    if events.send(MediaEvent::DurationChange(duration)).is_err() {
        return;
    }
    clock.lock().play();
    let _ = events.send(MediaEvent::Play);

    loop {
        sleep(period).await;
        let (position, finished) = {
            let clock = clock.lock();
            (clock.position(), clock.finished())
        };
        if events.send(MediaEvent::TimeUpdate(position)).is_err() {
            return;
        }
        if finished {
            clock.lock().pause();
            let _ = events.send(MediaEvent::Ended);
            return;
        }
    }
}

struct SimSubscription {
    script: Script,
}

impl MediaSubscription for SimSubscription {
    fn detach(&mut self) {
        self.script.stop();
    }
}
