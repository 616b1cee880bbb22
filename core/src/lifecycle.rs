use log::{debug, info};

use crate::adapter::{Adapter, AdapterHandle, SampleSink};
use crate::clients::Backends;
use crate::config::TrackerConfig;
use crate::timer::TimerRegistry;
use crate::SourceKind;

/// Sole owner of the active [`AdapterHandle`].
///
/// Every replacement destroys the previous handle before the next one is constructed, so two
/// adapters never target the same surface and a failed source cannot leak into the next one.
pub struct LifecycleManager {
    backends: Backends,
    config: TrackerConfig,
    timers: TimerRegistry,
    active: Option<AdapterHandle>,
    next_id: u64,
}

impl LifecycleManager {
    pub fn new(backends: Backends, config: TrackerConfig) -> Self {
        Self {
            backends,
            config,
            timers: TimerRegistry::new(),
            active: None,
            next_id: 0,
        }
    }

    /// Destroy the active handle, then build one for `source`. Returns the new handle, or
    /// `None` for an unrecognized source (the slot is left empty).
    ///
    /// Must be called inside a tokio runtime.
    pub fn replace(
        &mut self,
        source: SourceKind,
        url: &str,
        sink: SampleSink,
    ) -> Option<&AdapterHandle> {
        self.clear();

        let adapter = Adapter::for_source(&source, &self.backends)?;
        self.next_id += 1;
        let handle = AdapterHandle::create(
            self.next_id,
            url,
            adapter,
            &self.config,
            &self.timers,
            sink,
        );
        self.active = Some(handle);
        self.active.as_ref()
    }

    /// Destroy the active handle, if any
    pub fn clear(&mut self) {
        if let Some(mut handle) = self.active.take() {
            debug!("Releasing handle {} ({})", handle.id(), handle.url());
            handle.destroy();
        }
    }

    /// Unmount: destroy whatever is active, unconditionally
    pub fn teardown(&mut self) {
        if self.active.is_some() {
            info!("Tearing down watch tracker");
        }
        self.clear();
    }

    pub fn active(&self) -> Option<&AdapterHandle> {
        self.active.as_ref()
    }

    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

}

impl Drop for LifecycleManager {
    fn drop(&mut self) {
        self.teardown();
    }
}
