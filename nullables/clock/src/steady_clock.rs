use std::{
    collections::VecDeque,
    fmt,
    ops::{Add, Sub},
    sync::Mutex,
    time::{Duration, Instant},
};

/// Monotonic time source. Readings are nanoseconds relative to the moment the
/// clock was created, so they are only comparable within one clock instance.
pub struct SteadyClock {
    source: TimeSource,
}

impl SteadyClock {
    /// A nulled clock that always reports the same instant until advanced
    pub fn new_null() -> Self {
        Self::new_null_with(Timestamp::DEFAULT_STUB_NOW)
    }

    pub fn new_null_with(now: Timestamp) -> Self {
        Self {
            source: TimeSource::Stub(Mutex::new(VecDeque::from([now]))),
        }
    }

    /// A nulled clock that steps forward by the given offsets, one per `now()` call.
    /// Once the offsets are used up the last reading is repeated.
    pub fn new_null_with_offsets(offsets: impl IntoIterator<Item = Duration>) -> Self {
        let mut readings = VecDeque::from([Timestamp::DEFAULT_STUB_NOW]);
        let mut last = Timestamp::DEFAULT_STUB_NOW;
        for offset in offsets {
            last = last + offset;
            readings.push_back(last);
        }
        Self {
            source: TimeSource::Stub(Mutex::new(readings)),
        }
    }

    pub fn now(&self) -> Timestamp {
        match &self.source {
            TimeSource::System(origin) => Timestamp::from_nanos(origin.elapsed().as_nanos() as u64),
            TimeSource::Stub(readings) => {
                let mut readings = readings.lock().unwrap();
                if readings.len() > 1 {
                    readings.pop_front().unwrap_or_default()
                } else {
                    readings.front().copied().unwrap_or_default()
                }
            }
        }
    }

    pub fn advance(&self, step: Duration) {
        match &self.source {
            TimeSource::System(_) => panic!("Only a nulled clock can be advanced!"),
            TimeSource::Stub(readings) => {
                let mut readings = readings.lock().unwrap();
                if readings.len() != 1 {
                    panic!("Cannot advance because other configured readings exist!");
                }
                if let Some(now) = readings.front_mut() {
                    *now = *now + step;
                }
            }
        }
    }
}

impl Default for SteadyClock {
    fn default() -> Self {
        Self {
            source: TimeSource::System(Instant::now()),
        }
    }
}

enum TimeSource {
    System(Instant),
    Stub(Mutex<VecDeque<Timestamp>>),
}

/// A monotonic clock reading in nanoseconds
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const DEFAULT_STUB_NOW: Timestamp = Timestamp(1_000_000_000 * 60 * 60 * 24 * 365);

    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000_000
    }

    /// Time passed between this reading and `now`, zero if `now` is earlier
    pub fn elapsed(&self, now: Timestamp) -> Duration {
        Duration::from_nanos(now.0.saturating_sub(self.0))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0.saturating_add(rhs.as_nanos() as u64))
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Timestamp) -> Self::Output {
        rhs.elapsed(self)
    }
}
