use crate::cli::config::{MetronomeConfig, MetronomeToml};
use clap::Parser;

#[derive(Parser, PartialEq, Debug)]
pub(crate) struct DefaultArgs {}

impl DefaultArgs {
    pub(crate) fn default(&self) -> anyhow::Result<()> {
        println!("{}", default_toml()?);
        Ok(())
    }
}

fn default_toml() -> anyhow::Result<String> {
    let toml: MetronomeToml = (&MetronomeConfig::default()).into();
    Ok(toml::to_string(&toml)?)
}
