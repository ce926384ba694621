use std::{
    sync::{
        Arc, Condvar, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use metronome_output_tracker::{OutputListenerMt, OutputTrackerMt};

/// Wakes the clock thread early when a stop is requested.
///
/// The flag is an atomic so it can be read between callback invocations
/// without touching the mutex; the mutex only orders the flag store against
/// a waiter that is about to block on the condition variable.
#[derive(Clone)]
pub struct StopSignal {
    strategy: Arc<StopSignalStrategy>,
    wait_listener: Arc<OutputListenerMt<Duration>>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            strategy: Arc::new(StopSignalStrategy::Real(StopSignalImpl {
                mutex: Mutex::new(()),
                condition: Condvar::new(),
                stop_requested: AtomicBool::new(false),
            })),
            wait_listener: Arc::new(OutputListenerMt::new()),
        }
    }

    /// Nulled signal whose waits never block and never report a stop
    pub fn new_null() -> Self {
        Self::new_null_with_unstopped_waits(usize::MAX)
    }

    /// Nulled signal whose first `count` waits return immediately without a stop.
    /// Every wait after that reports a stop.
    pub fn new_null_with_unstopped_waits(count: usize) -> Self {
        Self {
            strategy: Arc::new(StopSignalStrategy::Nulled(StopSignalStub::new(count))),
            wait_listener: Arc::new(OutputListenerMt::new()),
        }
    }

    /// Blocks until `timeout` passed or a stop was requested.
    /// Returns true if a stop was requested.
    pub fn wait_for_stop(&self, timeout: Duration) -> bool {
        self.wait_listener.emit(timeout);
        match &*self.strategy {
            StopSignalStrategy::Real(i) => i.wait_for_stop(timeout),
            StopSignalStrategy::Nulled(i) => i.wait_for_stop(),
        }
    }

    pub fn request_stop(&self) {
        match &*self.strategy {
            StopSignalStrategy::Real(i) => i.request_stop(),
            StopSignalStrategy::Nulled(i) => i.request_stop(),
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        match &*self.strategy {
            StopSignalStrategy::Real(i) => i.is_stop_requested(),
            StopSignalStrategy::Nulled(i) => i.is_stop_requested(),
        }
    }

    /// Clears a previous stop request so the signal can serve the next run
    pub fn reset(&self) {
        match &*self.strategy {
            StopSignalStrategy::Real(i) => i.stop_requested.store(false, Ordering::SeqCst),
            StopSignalStrategy::Nulled(i) => i.stopped.store(false, Ordering::SeqCst),
        }
    }

    pub fn track_waits(&self) -> Arc<OutputTrackerMt<Duration>> {
        self.wait_listener.track()
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

enum StopSignalStrategy {
    Real(StopSignalImpl),
    Nulled(StopSignalStub),
}

struct StopSignalImpl {
    mutex: Mutex<()>,
    condition: Condvar,
    stop_requested: AtomicBool,
}

impl StopSignalImpl {
    fn wait_for_stop(&self, timeout: Duration) -> bool {
        let guard = self.mutex.lock().unwrap();
        if self.is_stop_requested() {
            return true;
        }

        // wait_timeout_while re-arms on spurious wakeups until the full timeout passed
        drop(
            self.condition
                .wait_timeout_while(guard, timeout, |_| !self.is_stop_requested())
                .unwrap()
                .0,
        );

        self.is_stop_requested()
    }

    fn request_stop(&self) {
        {
            let _guard = self.mutex.lock().unwrap();
            self.stop_requested.store(true, Ordering::SeqCst);
        }
        self.condition.notify_all();
    }

    fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}

struct StopSignalStub {
    unstopped_waits: Mutex<usize>,
    stopped: AtomicBool,
}

impl StopSignalStub {
    fn new(unstopped_waits: usize) -> Self {
        Self {
            unstopped_waits: Mutex::new(unstopped_waits),
            stopped: AtomicBool::new(false),
        }
    }

    fn wait_for_stop(&self) -> bool {
        if self.is_stop_requested() {
            return true;
        }
        let mut waits = self.unstopped_waits.lock().unwrap();
        if *waits > 0 {
            *waits -= 1;
            false
        } else {
            self.stopped.store(true, Ordering::SeqCst);
            true
        }
    }

    fn request_stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stop_requested(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}
