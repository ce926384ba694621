use crate::cli::{GlobalArgs, config::MetronomeConfig};
use anyhow::Context;
use clap::Parser;
use metronome::{TickScheduler, TickStatsSnapshot, wait_for_duration};
use metronome_nullable_tracing_subscriber::TracingInitializer;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tracing::{debug, info};

#[derive(Parser, PartialEq, Debug)]
pub(crate) struct RunArgs {
    /// Overrides how long the scheduler runs, in milliseconds
    #[arg(long)]
    pub run_ms: Option<u64>,
}

impl RunArgs {
    pub(crate) fn run(&self, global_args: GlobalArgs) -> anyhow::Result<()> {
        TracingInitializer::default().init();
        let mut config = global_args.load_config()?;
        if let Some(run_ms) = self.run_ms {
            config.run_duration = Duration::from_millis(run_ms);
        }

        let report = run_scheduler(&config)?;
        for (name, count) in &report.invocations {
            println!("{name}: {count}");
        }
        let stats = &report.stats;
        println!(
            "ticks: {}, invocations: {}, overruns: {}, panics: {}",
            stats.ticks, stats.invocations, stats.overruns, stats.panics
        );
        Ok(())
    }
}

pub(crate) struct RunReport {
    /// Invocation count per configured subscription, in config order
    pub invocations: Vec<(String, u64)>,
    pub stats: TickStatsSnapshot,
}

pub(crate) fn run_scheduler(config: &MetronomeConfig) -> anyhow::Result<RunReport> {
    let scheduler = TickScheduler::with_config(config.scheduler.clone())
        .context("Could not create tick scheduler")?;

    let mut counters = Vec::with_capacity(config.subscriptions.len());
    for subscription in &config.subscriptions {
        let count = Arc::new(AtomicU64::new(0));
        let count2 = count.clone();
        let name = subscription.name.clone();
        scheduler
            .subscribe(subscription.period, move || {
                let n = count2.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(subscription = %name, invocation = n, "Tick");
            })
            .with_context(|| format!("Invalid subscription '{}'", subscription.name))?;
        counters.push((subscription.name.clone(), count));
    }

    info!(
        tick = ?config.scheduler.tick_duration,
        subscriptions = config.subscriptions.len(),
        run = ?config.run_duration,
        "Starting tick scheduler"
    );
    scheduler.start().context("Could not start tick scheduler")?;
    wait_for_duration(config.run_duration);
    scheduler.stop();

    Ok(RunReport {
        invocations: counters
            .into_iter()
            .map(|(name, count)| (name, count.load(Ordering::Relaxed)))
            .collect(),
        stats: scheduler.stats(),
    })
}
