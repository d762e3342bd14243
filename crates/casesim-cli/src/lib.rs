//! Case Simulator CLI: console front end
//!
//! Lists the case files in a directory, lets the user pick one and runs it
//! through a `SessionStore`. Each case file keeps its own progress for the
//! lifetime of the process; switching cases never mixes state.

pub mod catalog;
pub mod config;
pub mod console;

pub use catalog::{list_case_files, CaseCatalog, OpenCase};
pub use config::{Cli, SimConfig};
pub use console::{Command, Console};

use casesim_engine::SessionStore;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
/// Logs go to stderr so they never interleave with the prompts.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the console on stdin/stdout.
pub fn run(config: SimConfig) -> anyhow::Result<()> {
    let catalog = CaseCatalog::open(&config.cases_dir)?;
    let store = SessionStore::new(config.engine.clone());
    tracing::info!(
        cases_dir = %config.cases_dir.display(),
        profile = %config.engine.profile.name,
        shuffle = config.engine.shuffle,
        "starting case simulator"
    );

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut console = Console::new(stdin.lock(), stdout.lock(), catalog, store);
    console.run(config.case.as_deref())
}
