use crate::cli::{GlobalArgs, config::MetronomeToml};
use clap::Parser;

#[derive(Parser, PartialEq, Debug)]
pub(crate) struct CurrentArgs {}

impl CurrentArgs {
    pub(crate) fn current(&self, global_args: GlobalArgs) -> anyhow::Result<()> {
        let config = global_args.load_config()?;
        let merged: MetronomeToml = (&config).into();
        println!("{}", toml::to_string(&merged)?);
        Ok(())
    }
}
