//! Recurring callbacks driven by one background clock thread.
//!
//! A [`TickScheduler`] counts time in fixed ticks. Each subscription has a
//! period, and its callback runs on every tick at which the time elapsed since
//! [`TickScheduler::start`] is a whole multiple of that period.

mod config;
mod error;
mod registry;
mod scheduler;
mod stats;
mod stop_signal;
mod subscription;
pub mod thread_factory;
mod wait;

pub use config::{DEFAULT_THREAD_NAME, SchedulerConfig, SchedulerToml, millis_rounded_up};
pub use error::SchedulerError;
pub use scheduler::TickScheduler;
pub use stats::TickStatsSnapshot;
pub use stop_signal::StopSignal;
pub use subscription::{SubscriptionHandle, TimerCallback};
pub use wait::wait_for_duration;
