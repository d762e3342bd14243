//! Command line / environment configuration
use anyhow::Context;
use casesim_engine::{EngineConfig, ScoringProfile};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Every flag can also be set through its `CASESIM_*` environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "casesim")]
#[command(about = "Run branching case scenarios in the terminal")]
pub struct Cli {
    /// Directory holding case files (*.json, *.yaml)
    #[arg(long, env = "CASESIM_CASES_DIR", default_value = "cases")]
    pub cases_dir: PathBuf,

    /// Case file name to open directly instead of asking
    #[arg(long, env = "CASESIM_CASE")]
    pub case: Option<String>,

    /// Scoring mode: console (half credit on one retry) or session (always full credit)
    #[arg(long, env = "CASESIM_MODE", default_value = "console")]
    pub mode: String,

    /// YAML scoring profile; overrides --mode
    #[arg(long, env = "CASESIM_PROFILE")]
    pub profile: Option<PathBuf>,

    /// Show options in their original order
    #[arg(
        long,
        env = "CASESIM_NO_SHUFFLE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub no_shuffle: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "CASESIM_LOG", default_value = "warn")]
    pub log: String,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub cases_dir: PathBuf,
    pub case: Option<String>,
    pub engine: EngineConfig,
    pub log_filter: String,
}

impl SimConfig {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let profile = match &cli.profile {
            Some(path) => {
                let yaml = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read profile {}", path.display()))?;
                ScoringProfile::from_yaml(&yaml)
                    .with_context(|| format!("invalid profile {}", path.display()))?
            }
            None => ScoringProfile::for_mode(&cli.mode),
        };

        let mut engine = EngineConfig::new(profile);
        if cli.no_shuffle {
            engine = engine.without_shuffle();
        }

        Ok(Self {
            cases_dir: cli.cases_dir,
            case: cli.case,
            engine,
            log_filter: cli.log,
        })
    }
}
