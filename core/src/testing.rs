use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use crate::clients::{
    Backends, MediaElementHost, MediaEvent, MediaSubscription, VimeoClient, VimeoEmbed,
    VimeoEvent, VimeoPlayer, YoutubeClient, YoutubeEvent, YoutubePlayer, YoutubeState,
};
use crate::timer::TimerRegistry;

/// How the platform SDK script behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sdk {
    Loaded,
    Failing,
    /// Never finishes loading
    Pending,
}

async fn load(sdk: Sdk) -> Result<()> {
    match sdk {
        Sdk::Loaded => Ok(()),
        Sdk::Failing => Err(anyhow!("script request blocked")),
        Sdk::Pending => std::future::pending().await,
    }
}

pub(crate) struct FakeYoutube {
    sdk: Sdk,
    autoplay: bool,
    players: Mutex<Vec<Arc<FakeYoutubePlayer>>>,
}

impl FakeYoutube {
    pub(crate) fn new(sdk: Sdk) -> Self {
        Self {
            sdk,
            autoplay: false,
            players: Mutex::new(Vec::new()),
        }
    }

    /// Players signal readiness and start playing as soon as they are created
    pub(crate) fn with_autoplay(mut self) -> Self {
        self.autoplay = true;
        self
    }

    pub(crate) fn created(&self) -> usize {
        self.players.lock().len()
    }

    pub(crate) fn latest(&self) -> Arc<FakeYoutubePlayer> {
        self.players.lock().last().cloned().expect("no YouTube player created")
    }
}

#[async_trait]
impl YoutubeClient for FakeYoutube {
    async fn load_sdk(&self) -> Result<()> {
        load(self.sdk).await
    }

    fn create_player(
        &self,
        mount_id: &str,
        video_id: &str,
        events: UnboundedSender<YoutubeEvent>,
    ) -> Result<Arc<dyn YoutubePlayer>> {
        let player = Arc::new(FakeYoutubePlayer {
            mount_id: mount_id.to_string(),
            video_id: video_id.to_string(),
            events,
            time: Mutex::new(0.0),
            duration: 212.0,
            destroyed: AtomicBool::new(false),
        });
        if self.autoplay {
            player.ready();
            player.set_state(YoutubeState::Playing);
        }
        self.players.lock().push(player.clone());
        Ok(player)
    }
}

pub(crate) struct FakeYoutubePlayer {
    pub(crate) mount_id: String,
    pub(crate) video_id: String,
    events: UnboundedSender<YoutubeEvent>,
    time: Mutex<f64>,
    duration: f64,
    destroyed: AtomicBool,
}

impl FakeYoutubePlayer {
    pub(crate) fn ready(&self) {
        let _ = self.events.send(YoutubeEvent::Ready);
    }

    pub(crate) fn set_state(&self, state: YoutubeState) {
        let _ = self.events.send(YoutubeEvent::StateChange(state));
    }

    pub(crate) fn set_time(&self, time: f64) {
        *self.time.lock() = time;
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl YoutubePlayer for FakeYoutubePlayer {
    fn current_time(&self) -> f64 {
        *self.time.lock()
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

pub(crate) struct FakeVimeo {
    sdk: Sdk,
    autoplay: bool,
    query_delay: Duration,
    players: Mutex<Vec<Arc<FakeVimeoPlayer>>>,
}

impl FakeVimeo {
    pub(crate) fn new(sdk: Sdk) -> Self {
        Self {
            sdk,
            autoplay: false,
            query_delay: Duration::ZERO,
            players: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_autoplay(mut self) -> Self {
        self.autoplay = true;
        self
    }

    /// Every query resolves only after `delay`
    pub(crate) fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    pub(crate) fn created(&self) -> usize {
        self.players.lock().len()
    }

    pub(crate) fn latest(&self) -> Arc<FakeVimeoPlayer> {
        self.players.lock().last().cloned().expect("no Vimeo player created")
    }
}

#[async_trait]
impl VimeoClient for FakeVimeo {
    async fn load_sdk(&self) -> Result<()> {
        load(self.sdk).await
    }

    fn create_player(
        &self,
        embed: &VimeoEmbed,
        events: UnboundedSender<VimeoEvent>,
    ) -> Result<Arc<dyn VimeoPlayer>> {
        let player = Arc::new(FakeVimeoPlayer {
            embed: embed.clone(),
            events,
            time: Mutex::new(0.0),
            duration: 95.0,
            query_delay: Mutex::new(self.query_delay),
            failing: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
            destroyed: AtomicBool::new(false),
        });
        if self.autoplay {
            player.send(VimeoEvent::Loaded);
            player.send(VimeoEvent::Play);
        }
        self.players.lock().push(player.clone());
        Ok(player)
    }
}

pub(crate) struct FakeVimeoPlayer {
    pub(crate) embed: VimeoEmbed,
    events: UnboundedSender<VimeoEvent>,
    time: Mutex<f64>,
    duration: f64,
    query_delay: Mutex<Duration>,
    failing: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    queries: AtomicUsize,
    destroyed: AtomicBool,
}

impl FakeVimeoPlayer {
    pub(crate) fn send(&self, event: VimeoEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn set_time(&self, time: f64) {
        *self.time.lock() = time;
    }

    /// Delay applied to queries issued from now on
    pub(crate) fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock() = delay;
    }

    /// Make queries reject until switched back
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    async fn query(&self, read: impl FnOnce() -> f64) -> Result<f64> {
        let _pending = InFlight::enter(self);
        let delay = *self.query_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("player rejected the query"));
        }
        Ok(read())
    }
}

/// Counts a query as outstanding until dropped, including when its task is aborted
struct InFlight<'a> {
    player: &'a FakeVimeoPlayer,
}

impl<'a> InFlight<'a> {
    fn enter(player: &'a FakeVimeoPlayer) -> Self {
        player.queries.fetch_add(1, Ordering::SeqCst);
        let now = player.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        player.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self { player }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.player.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl VimeoPlayer for FakeVimeoPlayer {
    async fn current_time(&self) -> Result<f64> {
        self.query(|| *self.time.lock()).await
    }

    async fn duration(&self) -> Result<f64> {
        self.query(|| self.duration).await
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct FakeMediaHost {
    fail: bool,
    elements: Mutex<Vec<Arc<FakeMediaElement>>>,
    timers: Mutex<Option<TimerRegistry>>,
    live_timers_at_attach: Mutex<Vec<usize>>,
}

impl FakeMediaHost {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Record how many poll timers are live each time an element is attached
    pub(crate) fn observe_timers(&self, timers: &TimerRegistry) {
        *self.timers.lock() = Some(timers.clone());
    }

    pub(crate) fn live_timers_at_attach(&self) -> Vec<usize> {
        self.live_timers_at_attach.lock().clone()
    }

    pub(crate) fn latest(&self) -> Arc<FakeMediaElement> {
        self.elements.lock().last().cloned().expect("no media element attached")
    }
}

impl MediaElementHost for FakeMediaHost {
    fn attach(
        &self,
        src: &str,
        events: UnboundedSender<MediaEvent>,
    ) -> Result<Box<dyn MediaSubscription>> {
        if self.fail {
            return Err(anyhow!("media element rejected {}", src));
        }
        if let Some(timers) = self.timers.lock().as_ref() {
            self.live_timers_at_attach.lock().push(timers.live());
        }
        let element = Arc::new(FakeMediaElement {
            src: src.to_string(),
            events,
            detached: AtomicBool::new(false),
        });
        self.elements.lock().push(element.clone());
        Ok(Box::new(FakeSubscription { element }))
    }
}

pub(crate) struct FakeMediaElement {
    pub(crate) src: String,
    events: UnboundedSender<MediaEvent>,
    detached: AtomicBool,
}

impl FakeMediaElement {
    pub(crate) fn send(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }
}

struct FakeSubscription {
    element: Arc<FakeMediaElement>,
}

impl MediaSubscription for FakeSubscription {
    fn detach(&mut self) {
        self.element.detached.store(true, Ordering::SeqCst);
    }
}

/// One in-memory fake per backend family, driven by the tests
pub(crate) struct Fakes {
    pub(crate) youtube: Arc<FakeYoutube>,
    pub(crate) vimeo: Arc<FakeVimeo>,
    pub(crate) media: Arc<FakeMediaHost>,
}

impl Fakes {
    pub(crate) fn new() -> Self {
        Self {
            youtube: Arc::new(FakeYoutube::new(Sdk::Loaded)),
            vimeo: Arc::new(FakeVimeo::new(Sdk::Loaded)),
            media: Arc::new(FakeMediaHost::default()),
        }
    }

    pub(crate) fn backends(&self) -> Backends {
        Backends {
            youtube: self.youtube.clone(),
            vimeo: self.vimeo.clone(),
            media: self.media.clone(),
        }
    }
}
