use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

/// Player states reported by the YouTube player's state-change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YoutubeState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

/// Notifications from a YouTube player instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YoutubeEvent {
    Ready,
    StateChange(YoutubeState),
}

/// Callback-driven platform player: readiness and state changes are pushed,
/// position and duration are read synchronously once ready.
#[async_trait]
pub trait YoutubeClient: Send + Sync {
    /// Resolves once the platform SDK script is loaded. Pending means "not loaded yet".
    async fn load_sdk(&self) -> Result<()>;

    /// Construct a player bound to `mount_id` for `video_id`
    fn create_player(
        &self,
        mount_id: &str,
        video_id: &str,
        events: UnboundedSender<YoutubeEvent>,
    ) -> Result<Arc<dyn YoutubePlayer>>;
}

pub trait YoutubePlayer: Send + Sync {
    /// Current playback position in seconds
    fn current_time(&self) -> f64;
    /// Total duration in seconds, 0 while unknown
    fn duration(&self) -> f64;
    /// Detach from the mount point and release the player
    fn destroy(&self);
}

/// Target element and configuration for a Vimeo embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VimeoEmbed {
    pub element_id: String,
    pub src: String,
}

/// Subscription-style notifications from a Vimeo player instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VimeoEvent {
    Loaded,
    Play,
    Pause,
    Ended,
}

/// Promise-based platform player: every reading is an asynchronous query.
#[async_trait]
pub trait VimeoClient: Send + Sync {
    /// Resolves once the platform SDK script is loaded
    async fn load_sdk(&self) -> Result<()>;

    fn create_player(
        &self,
        embed: &VimeoEmbed,
        events: UnboundedSender<VimeoEvent>,
    ) -> Result<Arc<dyn VimeoPlayer>>;
}

#[async_trait]
pub trait VimeoPlayer: Send + Sync {
    async fn current_time(&self) -> Result<f64>;
    async fn duration(&self) -> Result<f64>;
    fn destroy(&self);
}

/// Notifications of a native media element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    /// Continuous position update
    TimeUpdate(f64),
    /// Duration became known or changed
    DurationChange(f64),
    Play,
    Pause,
    Ended,
}

/// Host of native media elements. No SDK and no readiness phase.
pub trait MediaElementHost: Send + Sync {
    /// Point an element at `src` and subscribe to its notifications
    fn attach(
        &self,
        src: &str,
        events: UnboundedSender<MediaEvent>,
    ) -> Result<Box<dyn MediaSubscription>>;
}

pub trait MediaSubscription: Send {
    /// Remove the listeners and release the element
    fn detach(&mut self);
}

/// The set of clients the lifecycle manager builds adapters from.
///
/// Each platform player is reached through one of these injected clients, so the adapters
/// run the same against a browser bridge, a simulator or a test fake. Player callbacks are
/// delivered through the unbounded sender handed over at construction.
#[derive(Clone)]
pub struct Backends {
    pub youtube: Arc<dyn YoutubeClient>,
    pub vimeo: Arc<dyn VimeoClient>,
    pub media: Arc<dyn MediaElementHost>,
}
