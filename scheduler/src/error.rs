use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("tick duration must be greater than zero")]
    ZeroTickDuration,

    #[error("subscription period must be greater than zero")]
    InvalidPeriod,

    #[error("cannot restart from a callback while the clock thread is stopping")]
    RestartWhileStopping,

    #[error("could not spawn clock thread")]
    SpawnFailed(#[source] std::io::Error),
}
