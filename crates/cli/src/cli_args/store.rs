use clap::Subcommand;
use std::process::ExitCode;
use vaultwrap_config::Config;

#[derive(Debug, Subcommand)]
pub enum StoreCommand {
    /// Returns the path to the active store directory.
    Path,
}

impl StoreCommand {
    /// Execute the subcommand.
    pub fn run(self, config: &Config) -> miette::Result<ExitCode> {
        match self {
            StoreCommand::Path => {
                println!("{}", config.store_dir.display());
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
