mod commands;
mod config;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use commands::{config::ConfigCommand, run::RunArgs};
use config::{MetronomeConfig, MetronomeToml};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

#[derive(Parser, PartialEq, Debug, Default)]
#[command(name = "metronome", about = "Invokes periodic callbacks from a tick clock")]
pub(crate) struct CommandLineArgs {
    /// Reads the configuration from the supplied TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, PartialEq, Debug)]
pub(crate) enum Commands {
    /// Runs the scheduler for a while and reports how often each callback fired
    Run(RunArgs),
    /// Commands related to configs
    Config(ConfigCommand),
}

pub(crate) struct Cli {}

impl Cli {
    pub(crate) fn run(&self, args: CommandLineArgs) -> anyhow::Result<()> {
        let global_args = GlobalArgs {
            config_path: args.config.clone(),
        };

        match args.command {
            Some(Commands::Run(command)) => command.run(global_args)?,
            Some(Commands::Config(command)) => command.run(global_args)?,
            None => CommandLineArgs::command().print_long_help()?,
        }
        Ok(())
    }
}

pub(crate) struct GlobalArgs {
    pub config_path: Option<PathBuf>,
}

impl GlobalArgs {
    /// Defaults merged with the config file, if one was given
    pub(crate) fn load_config(&self) -> anyhow::Result<MetronomeConfig> {
        let mut config = MetronomeConfig::default();
        if let Some(path) = &self.config_path {
            let toml: MetronomeToml = read_toml_file(path)
                .with_context(|| format!("Could not read config file {}", path.display()))?;
            config.merge_toml(&toml);
        }
        Ok(config)
    }
}

pub(crate) fn read_toml_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let toml_str = std::fs::read_to_string(path)?;
    ::toml::from_str(&toml_str).map_err(|e| e.into())
}
