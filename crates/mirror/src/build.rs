use crate::{DownloadArtifacts, DownloadArtifactsError, DownloadSummary};
use derive_more::{Display, Error};
use miette::Diagnostic;
use std::{io, path::PathBuf};
use tokio::fs;
use vaultwrap_config::Config;
use vaultwrap_executor::{exit_code, ExecutorError, ExternalCommand};
use vaultwrap_fetcher::Reporter;
use vaultwrap_lockfile::{LoadLockfileError, Lockfile};
use vaultwrap_network::ThrottledClient;

/// Error type of [`MirrorBuild::run`].
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum MirrorBuildError {
    #[diagnostic(transparent)]
    Snapshot(#[error(source)] ExecutorError),

    #[diagnostic(transparent)]
    LoadLockfile(#[error(source)] LoadLockfileError),

    #[display("Failed to create the store directory at {path:?}: {error}")]
    #[diagnostic(code(vaultwrap_mirror::create_store_dir))]
    CreateStoreDir {
        path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[diagnostic(transparent)]
    DownloadArtifacts(#[error(source)] DownloadArtifactsError),
}

/// How a [`MirrorBuild`] that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Every artifact is in the store.
    Completed(DownloadSummary),
    /// `npm shrinkwrap` exited with this non-zero code. Nothing was downloaded.
    SnapshotFailed(i32),
}

/// This subroutine does everything `vaultwrap build` is supposed to do.
///
/// **Brief overview:**
/// * Run `npm shrinkwrap` to freeze the dependency tree into `npm-shrinkwrap.json`.
/// * Collect every distinct `resolved` URL of the lockfile.
/// * Download each artifact into the store directory, unless it is already there.
#[must_use]
pub struct MirrorBuild<'a> {
    pub config: &'a Config,
    pub http_client: &'a ThrottledClient,
    pub reporter: &'a dyn Reporter,
    /// Use the existing lockfile instead of running `npm shrinkwrap`.
    pub skip_snapshot: bool,
}

impl<'a> MirrorBuild<'a> {
    /// Execute the subroutine.
    pub async fn run(self) -> Result<BuildOutcome, MirrorBuildError> {
        let MirrorBuild { config, http_client, reporter, skip_snapshot } = self;

        if !skip_snapshot {
            let status = ExternalCommand::new(&config.npm, &config.root_dir)
                .map_err(MirrorBuildError::Snapshot)?
                .args(["shrinkwrap"])
                .execute()
                .await
                .map_err(MirrorBuildError::Snapshot)?;
            if !status.success() {
                let code = exit_code(status);
                tracing::error!(target: "vaultwrap::executor", code, "npm shrinkwrap failed");
                return Ok(BuildOutcome::SnapshotFailed(code));
            }
        }

        let lockfile =
            Lockfile::load_from_dir(&config.root_dir).map_err(MirrorBuildError::LoadLockfile)?;
        let urls = lockfile.resolved_urls();
        let count = urls.len();
        tracing::info!(target: "vaultwrap::download", count, "Collected resolved URLs");

        let store_dir = &config.store_dir;
        fs::create_dir_all(store_dir.root()).await.map_err(|error| {
            MirrorBuildError::CreateStoreDir { path: store_dir.root().to_path_buf(), error }
        })?;

        let summary = DownloadArtifacts { http_client, store_dir, urls: &urls, reporter }
            .run()
            .await
            .map_err(MirrorBuildError::DownloadArtifacts)?;

        let DownloadSummary { downloaded, cached, skipped } = summary;
        tracing::info!(
            target: "vaultwrap::download",
            downloaded,
            cached,
            skipped,
            "Store is up to date at {}",
            store_dir.display(),
        );
        Ok(BuildOutcome::Completed(summary))
    }
}
