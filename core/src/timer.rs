use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Counts poll timers across every adapter created by one lifecycle manager.
#[derive(Debug, Clone, Default)]
pub struct TimerRegistry {
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    live: AtomicUsize,
    peak: AtomicUsize,
    started: AtomicUsize,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timers currently running
    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live timers ever observed
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    /// Timers started over the registry's lifetime
    pub fn started(&self) -> usize {
        self.counters.started.load(Ordering::SeqCst)
    }

    fn acquire(&self) {
        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(live, Ordering::SeqCst);
        self.counters.started.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A cancellable repeating timer. The first tick fires one period after start.
///
/// Cancellation is synchronous from the owner's point of view: once [`PollTimer::cancel`]
/// returns the registry no longer counts it and the task is aborted. Dropping cancels too.
pub struct PollTimer {
    task: Option<JoinHandle<()>>,
    registry: TimerRegistry,
}

impl PollTimer {
    /// Spawn the timer on the current tokio runtime. Each tick is awaited before the next
    /// one is scheduled, so ticks never overlap; late ticks are skipped rather than bunched.
    pub fn start<F, Fut>(registry: &TimerRegistry, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        registry.acquire();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                tick().await;
            }
        });

        Self {
            task: Some(task),
            registry: registry.clone(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.task.is_some()
    }

    /// Stop the timer. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.registry.release();
        }
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_timer(registry: &TimerRegistry, ticks: Arc<AtomicUsize>) -> PollTimer {
        PollTimer::start(registry, Duration::from_secs(1), move || {
            let ticks = ticks.clone();
            async move {
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let registry = TimerRegistry::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let _timer = counting_timer(&registry, ticks.clone());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks_and_releases() {
        let registry = TimerRegistry::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut timer = counting_timer(&registry, ticks.clone());
        assert_eq!(registry.live(), 1);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        timer.cancel();
        timer.cancel();
        assert!(!timer.is_live());
        assert_eq!(registry.live(), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_and_peak_is_tracked() {
        let registry = TimerRegistry::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        {
            let _a = counting_timer(&registry, ticks.clone());
            let _b = counting_timer(&registry, ticks.clone());
            assert_eq!(registry.live(), 2);
        }
        assert_eq!(registry.live(), 0);
        assert_eq!(registry.peak(), 2);
        assert_eq!(registry.started(), 2);
    }
}
