use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread::{self, ThreadId},
    time::Duration,
};

use metronome_nullable_clock::SteadyClock;
use tracing::{debug, error, warn};

use crate::{
    SchedulerConfig, SchedulerError, StopSignal, TickStatsSnapshot,
    registry::SubscriptionRegistry,
    stats::TickStats,
    subscription::{SubscriptionHandle, TimerCallback},
    thread_factory::{JoinHandle, ThreadFactory},
};

/// Invokes registered callbacks from a single background clock thread.
///
/// Every tick the elapsed time since `start` grows by one tick duration and
/// each subscription whose period divides the elapsed time is invoked.
/// Callbacks run one after another on the clock thread, so a slow callback
/// delays the following callbacks and the next tick.
///
/// Due callbacks are collected under the registry lock and invoked after the
/// lock is released. A subscription removed while a dispatch pass is in
/// progress may therefore still fire once for that tick. In exchange,
/// callbacks may subscribe, unsubscribe, start or stop without deadlocking.
///
/// `stop` blocks until the clock thread exited. It does not interrupt a
/// callback that is already executing, it only prevents new invocations.
pub struct TickScheduler {
    shared: Arc<SchedulerShared>,
    thread: Mutex<Option<JoinHandle>>,
    thread_factory: Arc<ThreadFactory>,
    clock: Arc<SteadyClock>,
    thread_name: String,
}

impl TickScheduler {
    pub fn new(tick_duration: Duration) -> Result<Self, SchedulerError> {
        Self::with_config(SchedulerConfig::with_tick(tick_duration))
    }

    pub fn with_config(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        Self::with_infrastructure(
            config,
            Arc::new(ThreadFactory::default()),
            StopSignal::new(),
            Arc::new(SteadyClock::default()),
        )
    }

    pub fn with_infrastructure(
        config: SchedulerConfig,
        thread_factory: Arc<ThreadFactory>,
        stop_signal: StopSignal,
        clock: Arc<SteadyClock>,
    ) -> Result<Self, SchedulerError> {
        if config.tick_duration.is_zero() {
            return Err(SchedulerError::ZeroTickDuration);
        }

        Ok(Self {
            shared: Arc::new(SchedulerShared {
                tick_duration: config.tick_duration,
                registry: Mutex::new(SubscriptionRegistry::new()),
                stop_signal,
                elapsed_ticks: AtomicU64::new(0),
                running: AtomicBool::new(false),
                clock_thread: Mutex::new(None),
                stats: TickStats::default(),
            }),
            thread: Mutex::new(None),
            thread_factory,
            clock,
            thread_name: config.thread_name,
        })
    }

    pub fn tick_duration(&self) -> Duration {
        self.shared.tick_duration
    }

    /// Registers `action` to be called whenever the elapsed time is a multiple
    /// of `period`. A period that is not a multiple of the tick duration is only
    /// hit on ticks that happen to be common multiples of both.
    pub fn subscribe<F>(
        &self,
        period: Duration,
        action: F,
    ) -> Result<SubscriptionHandle, SchedulerError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if period.is_zero() {
            return Err(SchedulerError::InvalidPeriod);
        }

        let action: TimerCallback = Arc::new(action);
        let handle = self.shared.registry.lock().unwrap().insert(period, action);
        debug!(?handle, ?period, "Timer callback subscribed");
        Ok(handle)
    }

    /// Registers `action` to be called every `ticks` ticks
    pub fn subscribe_ticks<F>(
        &self,
        ticks: u32,
        action: F,
    ) -> Result<SubscriptionHandle, SchedulerError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe(self.shared.tick_duration.saturating_mul(ticks), action)
    }

    /// Returns false if the handle is unknown or was already removed
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let removed = self.shared.registry.lock().unwrap().remove(handle);
        if removed {
            debug!(?handle, "Timer callback unsubscribed");
        }
        removed
    }

    pub fn is_subscribed(&self, handle: &SubscriptionHandle) -> bool {
        self.shared.registry.lock().unwrap().contains(handle)
    }

    pub fn subscription_count(&self) -> usize {
        self.shared.registry.lock().unwrap().len()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Tick time counted since the last `start`
    pub fn elapsed(&self) -> Duration {
        self.shared
            .elapsed_for(self.shared.elapsed_ticks.load(Ordering::SeqCst))
    }

    pub fn stats(&self) -> TickStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Starts the clock thread. Does nothing if it is already running.
    ///
    /// If a callback requested a stop and the clock thread has not exited
    /// yet, this waits for it to exit and then starts a fresh run. A callback
    /// cannot restart the clock after stopping it in the same run:
    /// `start` then returns [`SchedulerError::RestartWhileStopping`].
    pub fn start(&self) -> Result<(), SchedulerError> {
        if self.shared.is_clock_thread() {
            if self.shared.stop_signal.is_stop_requested() {
                return Err(SchedulerError::RestartWhileStopping);
            }
            return Ok(());
        }

        let mut thread = self.thread.lock().unwrap();
        if self.shared.running.load(Ordering::SeqCst)
            && !self.shared.stop_signal.is_stop_requested()
        {
            return Ok(());
        }

        // The previous loop was stopped from a callback. It is exiting or already gone.
        if let Some(finishing) = thread.take() {
            join_clock_thread(finishing);
        }

        self.shared.elapsed_ticks.store(0, Ordering::SeqCst);
        self.shared.stop_signal.reset();
        self.shared.running.store(true, Ordering::SeqCst);

        let mut clock_loop = ClockLoop::new(self.shared.clone(), self.clock.clone());
        match self
            .thread_factory
            .spawn(self.thread_name.clone(), move || clock_loop.run())
        {
            Ok(handle) => {
                *thread = Some(handle);
                debug!(tick = ?self.shared.tick_duration, "Tick scheduler started");
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::SeqCst);
                Err(SchedulerError::SpawnFailed(e))
            }
        }
    }

    /// Stops the clock thread and waits for it to exit.
    /// Does nothing if the scheduler is not running.
    ///
    /// Called from a callback, it only requests the stop: the clock thread
    /// exits as soon as that callback returns.
    pub fn stop(&self) {
        if self.shared.is_clock_thread() {
            self.shared.stop_signal.request_stop();
            return;
        }

        // The clock thread never locks `thread`
        let mut thread = self.thread.lock().unwrap();
        let Some(handle) = thread.take() else {
            return;
        };
        self.shared.stop_signal.request_stop();
        join_clock_thread(handle);
        debug!(elapsed = ?self.elapsed(), "Tick scheduler stopped");
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn join_clock_thread(handle: JoinHandle) {
    if handle.join().is_err() {
        error!("Clock thread panicked");
    }
}

struct SchedulerShared {
    tick_duration: Duration,
    registry: Mutex<SubscriptionRegistry>,
    stop_signal: StopSignal,
    elapsed_ticks: AtomicU64,
    running: AtomicBool,
    clock_thread: Mutex<Option<ThreadId>>,
    stats: TickStats,
}

impl SchedulerShared {
    fn elapsed_for(&self, ticks: u64) -> Duration {
        let nanos = self.tick_duration.as_nanos().saturating_mul(ticks as u128);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    fn is_clock_thread(&self) -> bool {
        *self.clock_thread.lock().unwrap() == Some(thread::current().id())
    }
}

struct ClockLoop {
    shared: Arc<SchedulerShared>,
    clock: Arc<SteadyClock>,
    next_wait: Duration,
    overrun_reported: bool,
}

impl ClockLoop {
    fn new(shared: Arc<SchedulerShared>, clock: Arc<SteadyClock>) -> Self {
        Self {
            next_wait: shared.tick_duration,
            shared,
            clock,
            overrun_reported: false,
        }
    }

    fn run(&mut self) {
        *self.shared.clock_thread.lock().unwrap() = Some(thread::current().id());

        while !self.shared.stop_signal.wait_for_stop(self.next_wait) {
            let ticks = self.shared.elapsed_ticks.fetch_add(1, Ordering::SeqCst) + 1;
            self.shared.stats.tick();

            // stop may have been requested between the wake-up and the increment
            if self.shared.stop_signal.is_stop_requested() {
                break;
            }

            let started = self.clock.now();
            self.dispatch(self.shared.elapsed_for(ticks));
            let dispatch_time = started.elapsed(self.clock.now());
            self.next_wait = self.wait_after(dispatch_time, ticks);
        }

        *self.shared.clock_thread.lock().unwrap() = None;
        self.shared.running.store(false, Ordering::SeqCst);
    }

    fn dispatch(&self, elapsed: Duration) {
        let due = self.shared.registry.lock().unwrap().due(elapsed);

        for (handle, action) in due {
            if self.shared.stop_signal.is_stop_requested() {
                break;
            }

            match panic::catch_unwind(AssertUnwindSafe(|| action())) {
                Ok(()) => self.shared.stats.invoked(),
                Err(payload) => {
                    self.shared.stats.panicked();
                    let removed = self.shared.registry.lock().unwrap().remove(&handle);
                    error!(
                        ?handle,
                        reason = panic_reason(payload.as_ref()),
                        removed,
                        "Timer callback panicked, subscription removed"
                    );
                }
            }
        }
    }

    /// The next wait is shortened by the time the dispatch pass took
    fn wait_after(&mut self, dispatch_time: Duration, ticks: u64) -> Duration {
        let tick = self.shared.tick_duration;
        if dispatch_time < tick {
            return tick - dispatch_time;
        }

        let overruns = self.shared.stats.overrun();
        if self.overrun_reported {
            debug!(ticks, ?dispatch_time, overruns, "Dispatch pass overran the tick");
        } else {
            self.overrun_reported = true;
            warn!(
                ticks,
                ?dispatch_time,
                ?tick,
                "Dispatch pass took longer than a tick, callbacks are delaying the clock"
            );
        }
        Duration::ZERO
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown"
    }
}
