use std::{fmt, sync::Arc, time::Duration};

/// Callback invoked on the clock thread whenever its period comes due
pub type TimerCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Opaque token returned by `TickScheduler::subscribe`.
///
/// A handle is only meaningful to the scheduler that issued it. Passing it to
/// another scheduler's `unsubscribe` never removes anything.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle {
    owner: u64,
    id: u64,
}

impl SubscriptionHandle {
    pub(crate) fn new(owner: u64, id: u64) -> Self {
        Self { owner, id }
    }

    pub(crate) fn owner(&self) -> u64 {
        self.owner
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscription({}:{})", self.owner, self.id)
    }
}

pub(crate) struct Subscription {
    pub period: Duration,
    pub action: TimerCallback,
}

impl Subscription {
    /// Due when the elapsed time is a whole multiple of the period
    pub fn is_due(&self, elapsed: Duration) -> bool {
        let period = self.period.as_nanos();
        period != 0 && elapsed.as_nanos() % period == 0
    }
}
