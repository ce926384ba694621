use metronome::{SchedulerConfig, SchedulerToml, millis_rounded_up};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MetronomeConfig {
    pub scheduler: SchedulerConfig,
    /// How long `run` keeps the scheduler running
    pub run_duration: Duration,
    pub subscriptions: Vec<SubscriptionConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SubscriptionConfig {
    pub name: String,
    pub period: Duration,
}

impl SubscriptionConfig {
    fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            period,
        }
    }
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::with_tick(Duration::from_millis(10)),
            run_duration: Duration::from_secs(1),
            subscriptions: vec![
                SubscriptionConfig::new("beat", Duration::from_millis(250)),
                SubscriptionConfig::new("bar", Duration::from_millis(1000)),
            ],
        }
    }
}

impl MetronomeConfig {
    pub fn merge_toml(&mut self, toml: &MetronomeToml) {
        if let Some(scheduler) = &toml.scheduler {
            self.scheduler.merge_toml(scheduler);
        }
        if let Some(run_ms) = toml.run_ms {
            self.run_duration = Duration::from_millis(run_ms);
        }
        if let Some(subscriptions) = &toml.subscription {
            self.subscriptions = subscriptions
                .iter()
                .map(|s| SubscriptionConfig::new(&s.name, Duration::from_millis(s.period_ms)))
                .collect();
        }
    }
}

#[derive(Deserialize, Serialize, Default, Debug, PartialEq, Eq)]
pub(crate) struct MetronomeToml {
    pub run_ms: Option<u64>,
    pub scheduler: Option<SchedulerToml>,
    pub subscription: Option<Vec<SubscriptionToml>>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Eq)]
pub(crate) struct SubscriptionToml {
    pub name: String,
    pub period_ms: u64,
}

impl From<&MetronomeConfig> for MetronomeToml {
    fn from(config: &MetronomeConfig) -> Self {
        Self {
            run_ms: Some(millis_rounded_up(config.run_duration)),
            scheduler: Some((&config.scheduler).into()),
            subscription: Some(
                config
                    .subscriptions
                    .iter()
                    .map(|s| SubscriptionToml {
                        name: s.name.clone(),
                        period_ms: millis_rounded_up(s.period),
                    })
                    .collect(),
            ),
        }
    }
}
