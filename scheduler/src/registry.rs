use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use crate::subscription::{Subscription, SubscriptionHandle, TimerCallback};

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// Maps subscription ids to their period and callback.
/// Ids come from a counter, so they never collide within one registry.
pub(crate) struct SubscriptionRegistry {
    owner: u64,
    next_id: u64,
    subscriptions: HashMap<SubscriptionHandle, Subscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            owner: NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed),
            next_id: 0,
            subscriptions: HashMap::new(),
        }
    }

    pub fn insert(&mut self, period: Duration, action: TimerCallback) -> SubscriptionHandle {
        self.next_id += 1;
        let handle = SubscriptionHandle::new(self.owner, self.next_id);
        self.subscriptions
            .insert(handle, Subscription { period, action });
        handle
    }

    pub fn remove(&mut self, handle: &SubscriptionHandle) -> bool {
        if handle.owner() != self.owner {
            return false;
        }
        self.subscriptions.remove(handle).is_some()
    }

    pub fn contains(&self, handle: &SubscriptionHandle) -> bool {
        self.subscriptions.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Callbacks whose period divides `elapsed`, in unspecified order
    pub fn due(&self, elapsed: Duration) -> Vec<(SubscriptionHandle, TimerCallback)> {
        self.subscriptions
            .iter()
            .filter(|(_, s)| s.is_due(elapsed))
            .map(|(handle, s)| (*handle, s.action.clone()))
            .collect()
    }
}
