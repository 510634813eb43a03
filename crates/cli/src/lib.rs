mod cli_args;

pub use cli_args::*;

use clap::Parser;
use std::process::ExitCode;
use vaultwrap_diagnostics::{enable_tracing_by_env, Result};

/// Parse the command line arguments and run the command.
pub async fn run_cli() -> Result<ExitCode> {
    enable_tracing_by_env();
    CliArgs::parse().run().await
}
