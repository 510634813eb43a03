use crate::{find_root_dir, LoadProjectManifestError, ProjectManifest};
use derive_more::{Display, Error};
use miette::Diagnostic;
use smart_default::SmartDefault;
use std::path::{Path, PathBuf};
use vaultwrap_store_dir::StoreDir;

/// Registry whose artifact URLs are redirected to the local mirror by default.
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

/// Name of the default store directory under the project root.
pub const DEFAULT_STORE_DIR_NAME: &str = "packages";

/// Settings that have a default value and may be overridden from the command line.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
pub struct MirrorSettings {
    /// Host the mirror server binds and that rewritten URLs point at.
    #[default = "localhost"]
    pub host: String,

    /// First port tried when looking for a free one.
    #[default = 8080]
    pub port: u16,

    /// Prefix of the artifact URLs subject to rewriting.
    #[default(DEFAULT_REGISTRY.to_string())]
    pub registry: String,

    /// Maximum number of simultaneous downloads.
    #[default = 10]
    pub concurrency: usize,

    /// Package manager program.
    #[default(PathBuf::from("npm"))]
    pub npm: PathBuf,
}

/// Values given explicitly by the user. `None` falls back to the default.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub store_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub registry: Option<String>,
    pub concurrency: Option<usize>,
    pub npm: Option<PathBuf>,
}

/// Error type of [`Config::resolve`].
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum ResolveConfigError {
    #[display("No package.json found in {start_dir:?} or any of its parents")]
    #[diagnostic(
        code(vaultwrap_config::no_project_root),
        help("Run the command inside a project, or point at one with --dir.")
    )]
    NoProjectRoot {
        start_dir: PathBuf,
    },

    #[diagnostic(transparent)]
    LoadProjectManifest(#[error(source)] LoadProjectManifestError),

    #[display("Concurrency must be at least 1")]
    #[diagnostic(code(vaultwrap_config::zero_concurrency))]
    ZeroConcurrency,
}

/// Everything a command needs to know about where and how to operate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory of the root `package.json` and of `npm-shrinkwrap.json`.
    pub root_dir: PathBuf,
    pub store_dir: StoreDir,
    pub host: String,
    pub port: u16,
    pub registry: String,
    pub concurrency: usize,
    pub npm: PathBuf,
}

impl Config {
    /// Resolve the configuration of the project enclosing `start_dir`.
    pub fn resolve(
        start_dir: &Path,
        overrides: ConfigOverrides,
    ) -> Result<Self, ResolveConfigError> {
        let start_dir = dunce::canonicalize(start_dir).unwrap_or_else(|_| start_dir.to_path_buf());
        let root_dir = find_root_dir(&start_dir)
            .ok_or_else(|| ResolveConfigError::NoProjectRoot { start_dir: start_dir.clone() })?;

        let store_dir = match overrides.store_dir {
            Some(store_dir) => start_dir.join(store_dir),
            None => {
                let manifest = ProjectManifest::load(&root_dir)
                    .map_err(ResolveConfigError::LoadProjectManifest)?;
                root_dir.join(
                    manifest.shrinkwrap_vault.unwrap_or_else(|| DEFAULT_STORE_DIR_NAME.into()),
                )
            }
        };

        let defaults = MirrorSettings::default();
        let concurrency = overrides.concurrency.unwrap_or(defaults.concurrency);
        if concurrency == 0 {
            return Err(ResolveConfigError::ZeroConcurrency);
        }

        Ok(Config {
            store_dir: StoreDir::new(store_dir),
            host: overrides.host.unwrap_or(defaults.host),
            port: overrides.port.unwrap_or(defaults.port),
            registry: overrides.registry.unwrap_or(defaults.registry),
            concurrency,
            npm: overrides.npm.unwrap_or(defaults.npm),
            root_dir,
        })
    }
}
