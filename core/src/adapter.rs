mod file;
mod vimeo;
mod youtube;

use std::future::Future;
use std::sync::Arc;

use log::{debug, error, info};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::clients::{Backends, MediaSubscription, VimeoPlayer, YoutubePlayer};
use crate::config::TrackerConfig;
use crate::error::{Backend, TrackerError};
use crate::timer::{PollTimer, TimerRegistry};
use crate::{PlaybackSample, SourceKind};

use file::FileAdapter;
use vimeo::VimeoAdapter;
use youtube::YoutubeAdapter;

/// What an adapter reports to whoever owns its handle
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    /// New playback state
    Sample(PlaybackSample),
    /// The backend became safe to query
    Ready,
    /// The source carries no video id; nothing to track until a new URL arrives
    SourceNotReady,
    /// The backend failed to load or never became ready
    Unavailable(TrackerError),
}

/// Receiver of adapter events
pub type SampleSink = Arc<dyn Fn(AdapterEvent) + Send + Sync>;

/// Delivers events to the sink until closed. Emission and closing share one lock, so once
/// [`Emitter::close`] returns the sink is never called again.
#[derive(Clone)]
pub(crate) struct Emitter {
    sink: Arc<Mutex<Option<SampleSink>>>,
}

impl Emitter {
    fn new(sink: SampleSink) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Some(sink))),
        }
    }

    /// Returns false when the handle was already torn down
    pub(crate) fn emit(&self, event: AdapterEvent) -> bool {
        let guard = self.sink.lock();
        match guard.as_ref() {
            Some(sink) => {
                sink(event);
                true
            }
            None => false,
        }
    }

    pub(crate) fn sample(&self, sample: PlaybackSample) -> bool {
        self.emit(AdapterEvent::Sample(sample))
    }

    pub(crate) fn is_live(&self) -> bool {
        self.sink.lock().is_some()
    }

    fn close(&self) {
        self.sink.lock().take();
    }
}

/// Last known position, duration and play state of one backend
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Progress {
    pub(crate) current: f64,
    pub(crate) duration: f64,
    pub(crate) playing: bool,
}

impl Progress {
    pub(crate) fn sample(&self) -> PlaybackSample {
        PlaybackSample::new(self.current, self.duration, self.playing)
    }
}

/// The live external binding of a handle
enum Binding {
    Youtube(Arc<dyn YoutubePlayer>),
    Vimeo(Arc<dyn VimeoPlayer>),
    Media(Box<dyn MediaSubscription>),
}

impl Binding {
    fn release(self) {
        match self {
            Binding::Youtube(player) => player.destroy(),
            Binding::Vimeo(player) => player.destroy(),
            Binding::Media(mut subscription) => subscription.detach(),
        }
    }
}

/// State shared between a handle and its driver task
pub(crate) struct HandleCore {
    id: u64,
    backend: Backend,
    pub(crate) emitter: Emitter,
    pub(crate) config: TrackerConfig,
    timers: TimerRegistry,
    poll: Mutex<Option<PollTimer>>,
    binding: Mutex<Option<Binding>>,
}

impl HandleCore {
    pub(crate) fn is_live(&self) -> bool {
        self.emitter.is_live()
    }

    /// Install the external binding. A handle destroyed in the meantime releases it at once.
    fn bind(&self, binding: Binding) -> bool {
        let mut slot = self.binding.lock();
        if !self.emitter.is_live() {
            drop(slot);
            debug!("Handle {} destroyed during construction, releasing backend", self.id);
            binding.release();
            return false;
        }
        *slot = Some(binding);
        true
    }

    pub(crate) fn bind_youtube(&self, player: Arc<dyn YoutubePlayer>) -> bool {
        self.bind(Binding::Youtube(player))
    }

    pub(crate) fn bind_vimeo(&self, player: Arc<dyn VimeoPlayer>) -> bool {
        self.bind(Binding::Vimeo(player))
    }

    pub(crate) fn bind_media(&self, subscription: Box<dyn MediaSubscription>) -> bool {
        self.bind(Binding::Media(subscription))
    }

    /// Start the poll timer unless one is already running for this handle
    pub(crate) fn start_poll<F, Fut>(&self, tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.poll.lock();
        if !self.emitter.is_live() || slot.as_ref().is_some_and(PollTimer::is_live) {
            return false;
        }
        let period = self.config.poll_interval();
        *slot = Some(PollTimer::start(&self.timers, period, tick));
        debug!("{} handle {}: poll timer started ({:?})", self.backend, self.id, period);
        true
    }

    pub(crate) fn stop_poll(&self) -> bool {
        match self.poll.lock().take() {
            Some(mut timer) => {
                timer.cancel();
                debug!("{} handle {}: poll timer stopped", self.backend, self.id);
                true
            }
            None => false,
        }
    }

    fn has_poll_timer(&self) -> bool {
        self.poll.lock().as_ref().is_some_and(PollTimer::is_live)
    }

    /// Surface `BackendUnavailable` and stop whatever was started
    pub(crate) fn fail(&self, reason: impl Into<String>) {
        let err = TrackerError::unavailable(self.backend, reason);
        error!("Handle {}: {}", self.id, err);
        self.stop_poll();
        self.emitter.emit(AdapterEvent::Unavailable(err));
    }

    fn shutdown(&self) {
        self.emitter.close();
        self.stop_poll();
        let binding = self.binding.lock().take();
        if let Some(binding) = binding {
            binding.release();
        }
    }
}

/// One adapter variant per backend family, all behind the same event contract
pub(crate) enum Adapter {
    Youtube(YoutubeAdapter),
    Vimeo(VimeoAdapter),
    File(FileAdapter),
}

impl Adapter {
    /// Select the variant for a classified source. `Unrecognized` has none.
    pub(crate) fn for_source(source: &SourceKind, backends: &Backends) -> Option<Self> {
        match source {
            SourceKind::Youtube(id) => Some(Adapter::Youtube(YoutubeAdapter::new(
                backends.youtube.clone(),
                id.clone(),
            ))),
            SourceKind::Vimeo(id) => Some(Adapter::Vimeo(VimeoAdapter::new(
                backends.vimeo.clone(),
                id.clone(),
            ))),
            SourceKind::File(src) => Some(Adapter::File(FileAdapter::new(
                backends.media.clone(),
                src.clone(),
            ))),
            SourceKind::Unrecognized => None,
        }
    }

    fn backend(&self) -> Backend {
        match self {
            Adapter::Youtube(_) => Backend::Youtube,
            Adapter::Vimeo(_) => Backend::Vimeo,
            Adapter::File(_) => Backend::MediaElement,
        }
    }

    fn start(self, core: Arc<HandleCore>) -> Option<JoinHandle<()>> {
        match self {
            Adapter::Youtube(adapter) => Some(tokio::spawn(adapter.run(core))),
            Adapter::Vimeo(adapter) => Some(tokio::spawn(adapter.run(core))),
            Adapter::File(adapter) => adapter.start(core),
        }
    }
}

/// A live binding to one external player for one source.
///
/// Owned by the [`LifecycleManager`](crate::LifecycleManager). Holds at most one poll timer.
/// Dropping the handle destroys it.
pub struct AdapterHandle {
    id: u64,
    url: String,
    core: Arc<HandleCore>,
    driver: Option<JoinHandle<()>>,
}

impl AdapterHandle {
    /// Construct the adapter for `source` and start it. Must run inside a tokio runtime.
    pub(crate) fn create(
        id: u64,
        url: &str,
        adapter: Adapter,
        config: &TrackerConfig,
        timers: &TimerRegistry,
        sink: SampleSink,
    ) -> Self {
        let backend = adapter.backend();
        info!("Creating {} adapter (handle {}) for {}", backend, id, url);

        let core = Arc::new(HandleCore {
            id,
            backend,
            emitter: Emitter::new(sink),
            config: config.clone(),
            timers: timers.clone(),
            poll: Mutex::new(None),
            binding: Mutex::new(None),
        });
        let driver = adapter.start(core.clone());

        Self {
            id,
            url: url.to_string(),
            core,
            driver,
        }
    }

    /// Stop timers and subscriptions and detach from the external player. Idempotent, and
    /// safe before the backend ever became ready. No event is delivered after this returns.
    pub fn destroy(&mut self) {
        let was_live = self.core.is_live();
        self.core.shutdown();
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
        if was_live {
            debug!("Destroyed {} handle {}", self.core.backend, self.id);
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn backend(&self) -> Backend {
        self.core.backend
    }

    pub fn is_live(&self) -> bool {
        self.core.is_live()
    }

    pub fn has_poll_timer(&self) -> bool {
        self.core.has_poll_timer()
    }
}

impl Drop for AdapterHandle {
    fn drop(&mut self) {
        self.destroy();
    }
}
