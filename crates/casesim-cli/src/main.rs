//! Binary entrypoint for the case simulator console.
use casesim_cli::{init_tracing, run, Cli, SimConfig};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let config = SimConfig::from_cli(Cli::parse())?;
    init_tracing(&config.log_filter);
    run(config)
}
