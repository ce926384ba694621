use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_THREAD_NAME: &str = "Tick scheduler";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Base tick. Should be the greatest common divisor of all subscription
    /// periods, otherwise some periods are only hit on common multiples.
    pub tick_duration: Duration,
    pub thread_name: String,
}

impl SchedulerConfig {
    pub fn with_tick(tick_duration: Duration) -> Self {
        Self {
            tick_duration,
            ..Default::default()
        }
    }

    pub fn merge_toml(&mut self, toml: &SchedulerToml) {
        if let Some(tick_ms) = toml.tick_ms {
            self.tick_duration = Duration::from_millis(tick_ms);
        }
        if let Some(thread_name) = &toml.thread_name {
            self.thread_name = thread_name.clone();
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_duration: Duration::from_millis(1),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Default, Debug, PartialEq, Eq)]
pub struct SchedulerToml {
    pub tick_ms: Option<u64>,
    pub thread_name: Option<String>,
}

impl From<&SchedulerConfig> for SchedulerToml {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            tick_ms: Some(millis_rounded_up(config.tick_duration)),
            thread_name: Some(config.thread_name.clone()),
        }
    }
}

/// Whole milliseconds for a TOML `*_ms` field. Rounds up so a non-zero
/// sub-millisecond duration never becomes zero.
pub fn millis_rounded_up(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}
