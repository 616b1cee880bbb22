use std::sync::Arc;

use log::{debug, trace};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

use super::{AdapterEvent, HandleCore, Progress};
use crate::clients::{MediaElementHost, MediaEvent};
use crate::format::display_secs;

/// Adapter for a native media element. The element pushes position and duration updates,
/// so there is no readiness phase and no poll timer.
pub(crate) struct FileAdapter {
    host: Arc<dyn MediaElementHost>,
    src: String,
}

impl FileAdapter {
    pub(crate) fn new(host: Arc<dyn MediaElementHost>, src: String) -> Self {
        Self { host, src }
    }

    /// Attach to the element synchronously, then translate its notifications on a task.
    pub(crate) fn start(self, core: Arc<HandleCore>) -> Option<JoinHandle<()>> {
        let (tx, events) = mpsc::unbounded_channel();
        let subscription = match self.host.attach(&self.src, tx) {
            Ok(subscription) => subscription,
            Err(e) => {
                core.fail(format!("Failed to attach media element: {:#}", e));
                return None;
            }
        };
        if !core.bind_media(subscription) {
            return None;
        }
        debug!("Media element attached to {}", self.src);
        core.emitter.emit(AdapterEvent::Ready);

        Some(tokio::spawn(translate(core, events)))
    }
}

async fn translate(core: Arc<HandleCore>, mut events: UnboundedReceiver<MediaEvent>) {
    let mut progress = Progress::default();

    while let Some(event) = events.recv().await {
        match event {
            MediaEvent::TimeUpdate(current) => progress.current = current,
            MediaEvent::DurationChange(duration) => {
                debug!("Media duration known: {}", display_secs(duration));
                progress.duration = duration;
            }
            MediaEvent::Play => progress.playing = true,
            MediaEvent::Pause | MediaEvent::Ended => progress.playing = false,
        }
        trace!("Media event {:?}", event);
        if !core.emitter.sample(progress.sample()) {
            break;
        }
    }
}
