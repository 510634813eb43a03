pub mod build;
pub mod install;
pub mod store;

use build::BuildArgs;
use clap::{Args, Parser, Subcommand};
use install::InstallArgs;
use miette::Context;
use std::{path::PathBuf, process::ExitCode};
use store::StoreCommand;
use vaultwrap_config::{Config, ConfigOverrides};

/// Keep the npm artifacts of a project in a local store and install from it.
#[derive(Debug, Parser)]
#[clap(name = "vaultwrap")]
#[clap(bin_name = "vaultwrap")]
#[clap(version)]
#[clap(about = "Keep the npm artifacts of a project in a local store and install from it")]
pub struct CliArgs {
    /// Command to run. Defaults to `build`.
    #[clap(subcommand)]
    pub command: Option<CliCommand>,

    /// Set working directory.
    #[clap(short = 'C', long, default_value = ".", global = true)]
    pub dir: PathBuf,

    #[clap(flatten)]
    pub config: ConfigArgs,
}

/// Options that override the configuration.
#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// Store directory. Defaults to the `shrinkwrapVault` field of package.json, or `packages`.
    #[clap(long, global = true)]
    pub store: Option<PathBuf>,

    /// Host of the local mirror server [default: localhost]
    #[clap(short = 'a', long, global = true)]
    pub address: Option<String>,

    /// First port tried for the local mirror server [default: 8080]
    #[clap(short = 'p', long, global = true)]
    pub port: Option<u16>,

    /// URL prefix of the artifacts to serve from the store [default: https://registry.npmjs.org/]
    #[clap(long, global = true)]
    pub registry: Option<String>,

    /// Maximum number of simultaneous downloads [default: 10]
    #[clap(long, global = true)]
    pub concurrency: Option<usize>,

    /// npm program to run [default: npm]
    #[clap(long, global = true)]
    pub npm: Option<PathBuf>,
}

impl From<ConfigArgs> for ConfigOverrides {
    fn from(args: ConfigArgs) -> Self {
        let ConfigArgs { store, address, port, registry, concurrency, npm } = args;
        ConfigOverrides { store_dir: store, host: address, port, registry, concurrency, npm }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Freeze the dependency tree with `npm shrinkwrap` and download every artifact into the store.
    Build(BuildArgs),
    /// Run `npm install` with every registry artifact served from the store.
    Install(InstallArgs),
    /// Managing the store.
    #[clap(subcommand)]
    Store(StoreCommand),
}

impl Default for CliCommand {
    fn default() -> Self {
        CliCommand::Build(BuildArgs::default())
    }
}

impl CliArgs {
    /// Execute the command
    pub async fn run(self) -> miette::Result<ExitCode> {
        let CliArgs { command, dir, config } = self;
        let config = Config::resolve(&dir, config.into()).wrap_err("resolve the configuration")?;

        match command.unwrap_or_default() {
            CliCommand::Build(args) => args.run(&config).await,
            CliCommand::Install(args) => args.run(&config).await,
            CliCommand::Store(command) => command.run(&config),
        }
    }
}

/// Exit with the code of a child process.
fn exit_with(code: i32) -> ExitCode {
    u8::try_from(code).map(ExitCode::from).unwrap_or(ExitCode::FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn build_is_the_default_command() {
        let args = CliArgs::try_parse_from(["vaultwrap"]).unwrap();
        assert!(args.command.is_none());
        assert!(matches!(
            args.command.unwrap_or_default(),
            CliCommand::Build(BuildArgs { skip_snapshot: false }),
        ));
    }

    #[test]
    fn global_options_after_the_command() {
        let args = CliArgs::try_parse_from([
            "vaultwrap",
            "install",
            "--port",
            "9999",
            "-a",
            "127.0.0.1",
            "--store",
            "vendor",
        ])
        .unwrap();
        let ConfigOverrides { store_dir, host, port, .. } = args.config.into();
        assert_eq!(store_dir, Some(PathBuf::from("vendor")));
        assert_eq!(host.as_deref(), Some("127.0.0.1"));
        assert_eq!(port, Some(9999));
    }

    #[test]
    fn unknown_command_is_rejected() {
        let error = CliArgs::try_parse_from(["vaultwrap", "publish"]).unwrap_err();
        assert_eq!(error.exit_code(), 2);
    }
}
