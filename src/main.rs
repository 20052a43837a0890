//! Debsmith - workspace package build orchestrator
//!
//! Entry point for the debsmith command-line application.

use anyhow::Result;
use clap::Parser;

use debsmith::cli::output::{display_error, exit_code};
use debsmith::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.output_config().init_tracing();

    tracing::debug!(
        "debsmith {} ({} for {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
        env!("DEBSMITH_TARGET"),
    );

    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(exit_code(&e));
        }
    }
}
