use metronome_output_tracker::{OutputListenerMt, OutputTrackerMt};
use std::{error::Error, str::FromStr, sync::Arc};
use tracing_subscriber::EnvFilter;

/// Environment variable that selects the log output style
pub const LOG_STYLE_VAR: &str = "METRONOME_LOG";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TracingInitEvent {
    pub filter: String,
    pub style: LogStyle,
}

/// Installs the global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` and the output style from `METRONOME_LOG`
/// (`json`, `noansi`, anything else means ANSI colours).
#[derive(Default)]
pub struct TracingInitializer {
    vars: EnvVars,
    init_listener: OutputListenerMt<TracingInitEvent>,
}

impl TracingInitializer {
    /// Nulled initializer: records what it would have installed, installs nothing
    pub fn new_null() -> Self {
        Self::new_null_with_env(Vec::new())
    }

    pub fn new_null_with_env(vars: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            vars: EnvVars::Stub(vars),
            init_listener: OutputListenerMt::new(),
        }
    }

    pub fn init(&self) {
        self.init_with_default_log_level("info");
    }

    pub fn init_with_default_log_level(&self, default_level: impl Into<String>) {
        let event = TracingInitEvent {
            filter: self
                .vars
                .get(EnvFilter::DEFAULT_ENV)
                .unwrap_or_else(|| default_level.into()),
            style: self
                .vars
                .get(LOG_STYLE_VAR)
                .unwrap_or_default()
                .parse()
                .unwrap_or_default(),
        };

        if matches!(self.vars, EnvVars::System) {
            if let Err(e) = install_subscriber(&event) {
                eprintln!("Could not install tracing subscriber: {e}");
            }
        }
        self.init_listener.emit(event);
    }

    pub fn track(&self) -> Arc<OutputTrackerMt<TracingInitEvent>> {
        self.init_listener.track()
    }
}

#[derive(Default)]
enum EnvVars {
    #[default]
    System,
    Stub(Vec<(&'static str, &'static str)>),
}

impl EnvVars {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            EnvVars::System => std::env::var(key).ok(),
            EnvVars::Stub(vars) => vars
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogStyle {
    #[default]
    Ansi,
    NoAnsi,
    Json,
}

impl FromStr for LogStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(LogStyle::Json),
            "noansi" => Ok(LogStyle::NoAnsi),
            _ => Ok(LogStyle::Ansi),
        }
    }
}

/// Fails if a global subscriber was already installed in this process
fn install_subscriber(event: &TracingInitEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::builder().parse_lossy(&event.filter);
    let builder = tracing_subscriber::fmt::fmt().with_env_filter(filter);

    match event.style {
        LogStyle::Json => builder.json().try_init(),
        LogStyle::NoAnsi => builder.with_ansi(false).try_init(),
        LogStyle::Ansi => builder.with_ansi(true).try_init(),
    }
}
