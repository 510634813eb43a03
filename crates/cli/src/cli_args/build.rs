use crate::cli_args::exit_with;
use clap::Args;
use std::process::ExitCode;
use vaultwrap_config::Config;
use vaultwrap_fetcher::LogReporter;
use vaultwrap_mirror::{BuildOutcome, MirrorBuild};
use vaultwrap_network::ThrottledClient;

#[derive(Debug, Default, Args)]
pub struct BuildArgs {
    /// Use the existing npm-shrinkwrap.json instead of running `npm shrinkwrap`.
    #[clap(long)]
    pub skip_snapshot: bool,
}

impl BuildArgs {
    /// Execute the subcommand.
    pub async fn run(self, config: &Config) -> miette::Result<ExitCode> {
        let BuildArgs { skip_snapshot } = self;
        let http_client = ThrottledClient::new_with_permits(config.concurrency);

        let outcome = MirrorBuild {
            config,
            http_client: &http_client,
            reporter: &LogReporter,
            skip_snapshot,
        }
        .run()
        .await?;

        Ok(match outcome {
            BuildOutcome::Completed(_) => ExitCode::SUCCESS,
            BuildOutcome::SnapshotFailed(code) => exit_with(code),
        })
    }
}
