mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, CommandLineArgs};

fn main() -> Result<()> {
    let args = CommandLineArgs::parse();
    Cli {}.run(args)?;
    Ok(())
}
