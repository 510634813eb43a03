use crate::cli_args::exit_with;
use clap::Args;
use std::process::ExitCode;
use vaultwrap_config::Config;
use vaultwrap_mirror::{InstallOutcome, MirrorInstall};

/// Exit code after an interrupt, as shells report a process killed by `SIGINT`.
const INTERRUPTED_EXIT_CODE: u8 = 130;

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Arguments passed to `npm install`.
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    pub npm_args: Vec<String>,
}

impl InstallArgs {
    /// Execute the subcommand.
    pub async fn run(self, config: &Config) -> miette::Result<ExitCode> {
        let InstallArgs { npm_args } = self;

        let outcome = MirrorInstall {
            config,
            npm_args: &npm_args,
            interrupt: tokio::signal::ctrl_c(),
        }
        .run()
        .await?;

        Ok(match outcome {
            InstallOutcome::Exited(code) => exit_with(code),
            InstallOutcome::Interrupted => ExitCode::from(INTERRUPTED_EXIT_CODE),
        })
    }
}
