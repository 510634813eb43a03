use crate::mutated_files::MutatedFiles;
use derive_more::{Display, Error};
use futures_util::{stream, FutureExt, StreamExt};
use miette::Diagnostic;
use pipe_trait::Pipe;
use std::{
    future::Future,
    path::PathBuf,
    pin::{pin, Pin},
};
use vaultwrap_config::Config;
use vaultwrap_executor::{exit_code, ExecutorError, ExternalCommand};
use vaultwrap_lockfile::Lockfile;
use vaultwrap_manifest::{
    find_manifest_files, mutate, FindManifestFilesError, ManifestFile, MutateManifestError,
    RestoreManifestError,
};
use vaultwrap_mirror_server::{
    bind_available_port, BindPortError, MirrorServer, RewriteUrl, StartServerError,
    StopServerError,
};

/// Error type of [`MirrorInstall::run`].
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum MirrorInstallError {
    #[display("No lockfile at {lockfile_path:?}")]
    #[diagnostic(
        code(vaultwrap_mirror::missing_lockfile),
        help("Run `vaultwrap build` first to create the lockfile and fill the store.")
    )]
    MissingLockfile { lockfile_path: PathBuf },

    #[diagnostic(transparent)]
    BindPort(#[error(source)] BindPortError),

    #[diagnostic(transparent)]
    StartServer(#[error(source)] StartServerError),

    #[diagnostic(transparent)]
    FindManifestFiles(#[error(source)] FindManifestFilesError),

    #[display("Failed to rewrite {failed_count} of {total} manifests: {first}")]
    #[diagnostic(
        code(vaultwrap_mirror::mutate_manifests),
        help("npm install was not run. Every manifest that was rewritten has been restored.")
    )]
    MutateManifests {
        failed_count: usize,
        total: usize,
        #[error(source)]
        first: MutateManifestError,
    },

    #[diagnostic(transparent)]
    Install(#[error(source)] ExecutorError),

    #[diagnostic(transparent)]
    StopServer(#[error(source)] StopServerError),

    #[display("Failed to restore {failed_count} manifests: {first}")]
    #[diagnostic(
        code(vaultwrap_mirror::restore_manifests),
        help("The original content of each file is kept in its `.bak` sibling. Move it back manually.")
    )]
    RestoreManifests {
        failed_count: usize,
        #[error(source)]
        first: RestoreManifestError,
    },
}

/// How a [`MirrorInstall`] that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// `npm install` exited with this code.
    Exited(i32),
    /// The interrupt fired. `npm install`, if running, was killed.
    Interrupted,
}

/// This subroutine does everything `vaultwrap install` is supposed to do.
///
/// **Brief overview:**
/// * Serve the store directory on the first free port.
/// * Redirect the `resolved` URLs of `npm-shrinkwrap.json` and the `_resolved` URLs of every
///   installed `package.json` from the registry to the server.
/// * Run `npm install`.
/// * Stop the server and restore every rewritten file, whatever happened before.
///
/// The interrupt is polled once before anything is touched. A signal future such as
/// [`tokio::signal::ctrl_c`] installs its handler on that first poll, so an interrupt that comes
/// while files are being rewritten is noticed before `npm install` is spawned.
#[must_use]
pub struct MirrorInstall<'a, Interrupt> {
    pub config: &'a Config,
    /// Extra arguments for `npm install`.
    pub npm_args: &'a [String],
    /// Resolves when the user asks to stop.
    pub interrupt: Interrupt,
}

impl<'a, Interrupt> MirrorInstall<'a, Interrupt>
where
    Interrupt: Future,
{
    /// Execute the subroutine.
    pub async fn run(self) -> Result<InstallOutcome, MirrorInstallError> {
        let MirrorInstall { config, npm_args, interrupt } = self;

        let lockfile_path = Lockfile::path_in(&config.root_dir);
        if !lockfile_path.is_file() {
            return Err(MirrorInstallError::MissingLockfile { lockfile_path });
        }

        let mut interrupt = pin!(interrupt);
        if interrupt.as_mut().now_or_never().is_some() {
            return Ok(InstallOutcome::Interrupted);
        }

        let install = ExternalCommand::new(&config.npm, &config.root_dir)
            .map_err(MirrorInstallError::Install)?
            .args(["install"])
            .args(npm_args);

        let manifest_files =
            find_manifest_files(&config.root_dir).map_err(MirrorInstallError::FindManifestFiles)?;

        let listener = bind_available_port(&config.host, config.port)
            .await
            .map_err(MirrorInstallError::BindPort)?;
        let server = MirrorServer::start(listener, config.store_dir.clone())
            .map_err(MirrorInstallError::StartServer)?;
        let port = server.addr().port();
        let rewrite = RewriteUrl { registry: &config.registry, host: &config.host, port };

        let mut mutated_files = MutatedFiles::default();
        let mutation =
            mutate_all(&manifest_files, rewrite, config.concurrency, &mut mutated_files).await;
        tracing::info!(
            target: "vaultwrap::manifest",
            mutated = mutated_files.len(),
            total = manifest_files.len(),
            "Redirected resolved URLs to http://{}:{}/",
            config.host,
            port,
        );

        if let Err(error) = mutation {
            if let Err(cleanup_error) = finalize(server, &mut mutated_files).await {
                tracing::error!(
                    target: "vaultwrap::manifest",
                    error = %cleanup_error,
                    "Failed to clean up",
                );
            }
            return Err(error);
        }

        if interrupt.as_mut().now_or_never().is_some() {
            tracing::warn!(target: "vaultwrap::executor", "Interrupted before npm install");
            finalize(server, &mut mutated_files).await?;
            return Ok(InstallOutcome::Interrupted);
        }

        let outcome = run_until_interrupted(&install, interrupt).await;
        let finalized = finalize(server, &mut mutated_files).await;
        let outcome = outcome?;
        finalized?;
        Ok(outcome)
    }
}

/// Rewrite every manifest, tracking each success in `mutated_files`.
///
/// All files are attempted. Failures are logged and the first is returned.
async fn mutate_all(
    manifest_files: &[ManifestFile],
    rewrite: RewriteUrl<'_>,
    concurrency: usize,
    mutated_files: &mut MutatedFiles,
) -> Result<(), MirrorInstallError> {
    let mut results = manifest_files
        .iter()
        .map(|ManifestFile { path, kind }| async move {
            let result = mutate(path, kind.resolved_field(), |url| rewrite.apply(url)).await;
            (path, result)
        })
        .pipe(stream::iter)
        .buffer_unordered(concurrency.max(1));

    let mut failed_count = 0;
    let mut first = None;
    while let Some((path, result)) = results.next().await {
        match result {
            Ok(()) => mutated_files.push(path.clone()),
            Err(error) => {
                tracing::error!(target: "vaultwrap::manifest", %error, "Failed to rewrite");
                failed_count += 1;
                first.get_or_insert(error);
            }
        }
    }

    match first {
        None => Ok(()),
        Some(first) => Err(MirrorInstallError::MutateManifests {
            failed_count,
            total: manifest_files.len(),
            first,
        }),
    }
}

/// Run `npm install` until it exits or `interrupt` resolves, whichever comes first.
///
/// On interrupt, the child is killed and reaped before returning.
async fn run_until_interrupted<Interrupt>(
    install: &ExternalCommand,
    interrupt: Pin<&mut Interrupt>,
) -> Result<InstallOutcome, MirrorInstallError>
where
    Interrupt: Future,
{
    let mut child = install.spawn().map_err(MirrorInstallError::Install)?;
    tokio::select! {
        status = install.wait(&mut child) => {
            let code = exit_code(status.map_err(MirrorInstallError::Install)?);
            if code != 0 {
                tracing::error!(target: "vaultwrap::executor", code, "npm install failed");
            }
            Ok(InstallOutcome::Exited(code))
        }
        _ = interrupt => {
            tracing::warn!(target: "vaultwrap::executor", "Interrupted, stopping npm install");
            if let Err(error) = child.start_kill() {
                tracing::warn!(target: "vaultwrap::executor", %error, "Failed to kill npm install");
            }
            install.wait(&mut child).await.map_err(MirrorInstallError::Install)?;
            Ok(InstallOutcome::Interrupted)
        }
    }
}

/// Stop the server, then restore every mutated file.
///
/// Restoration is attempted even if the server fails to stop.
async fn finalize(
    server: MirrorServer,
    mutated_files: &mut MutatedFiles,
) -> Result<(), MirrorInstallError> {
    let stopped = server.stop().await;
    if let Err(error) = &stopped {
        tracing::error!(target: "vaultwrap::server", %error, "Failed to stop");
    }

    let mut failures = mutated_files.restore_all().await;
    stopped.map_err(MirrorInstallError::StopServer)?;
    if failures.is_empty() {
        return Ok(());
    }
    let failed_count = failures.len();
    Err(MirrorInstallError::RestoreManifests { failed_count, first: failures.swap_remove(0) })
}
