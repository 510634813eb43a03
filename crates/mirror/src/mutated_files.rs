use std::{mem, path::PathBuf};
use vaultwrap_manifest::{restore, restore_sync, RestoreManifestError};

/// Files whose backup is pending restoration.
///
/// [`restore_all`](MutatedFiles::restore_all) is the only way to finish. If the guard is dropped
/// before that (a panic, or the future being dropped), the remaining files are restored
/// synchronously.
#[derive(Debug, Default)]
#[must_use]
pub(crate) struct MutatedFiles {
    paths: Vec<PathBuf>,
    finalized: bool,
}

impl MutatedFiles {
    /// Track a file that was successfully mutated.
    pub(crate) fn push(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub(crate) fn len(&self) -> usize {
        self.paths.len()
    }

    /// Restore every tracked file, attempting all of them even if some fail.
    ///
    /// Every failure is logged. Calling it again does nothing.
    pub(crate) async fn restore_all(&mut self) -> Vec<RestoreManifestError> {
        let mut failures = Vec::new();
        while let Some(path) = self.paths.pop() {
            if let Err(error) = restore(path).await {
                tracing::error!(target: "vaultwrap::manifest", %error, "Failed to restore");
                failures.push(error);
            }
        }
        self.finalized = true;
        failures
    }
}

impl Drop for MutatedFiles {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        for path in mem::take(&mut self.paths) {
            if let Err(error) = restore_sync(path) {
                tracing::error!(target: "vaultwrap::manifest", %error, "Failed to restore");
            }
        }
    }
}
