use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by the clock thread. They accumulate over every run of a
/// scheduler and are not reset by `start`.
#[derive(Default)]
pub(crate) struct TickStats {
    ticks: AtomicU64,
    invocations: AtomicU64,
    overruns: AtomicU64,
    panics: AtomicU64,
}

impl TickStats {
    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn invoked(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn overrun(&self) -> u64 {
        self.overruns.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn panicked(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TickStatsSnapshot {
        TickStatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            invocations: self.invocations.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStatsSnapshot {
    /// Ticks counted by the clock thread
    pub ticks: u64,
    /// Callback invocations that returned normally
    pub invocations: u64,
    /// Dispatch passes that took a full tick or longer
    pub overruns: u64,
    /// Callback invocations that panicked
    pub panics: u64,
}
