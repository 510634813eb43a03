use derive_more::{Display, Error};
use miette::Diagnostic;
use std::{io, path::PathBuf};
use tokio::fs;
use vaultwrap_fs::backup_path;

/// Error type of [`restore`].
#[derive(Debug, Display, Error, Diagnostic)]
#[display("Failed to restore {file_path:?} from {backup_path:?}: {error}")]
#[diagnostic(
    code(vaultwrap_manifest::restore),
    help("The original content is kept in the backup file. Move it back manually.")
)]
pub struct RestoreManifestError {
    pub file_path: PathBuf,
    pub backup_path: PathBuf,
    #[error(source)]
    pub error: io::Error,
}

/// Put the original content of a file back, discarding what [`mutate`](crate::mutate) wrote.
///
/// Must be called at most once per successful `mutate`: the backup is consumed.
pub async fn restore(file_path: impl Into<PathBuf>) -> Result<(), RestoreManifestError> {
    let file_path = file_path.into();
    let backup_path = backup_path(&file_path);
    match fs::rename(&backup_path, &file_path).await {
        Ok(()) => {
            tracing::debug!(target: "vaultwrap::manifest", ?file_path, "Restored");
            Ok(())
        }
        Err(error) => Err(RestoreManifestError { file_path, backup_path, error }),
    }
}

/// Blocking version of [`restore`], for contexts that cannot await.
pub fn restore_sync(file_path: impl Into<PathBuf>) -> Result<(), RestoreManifestError> {
    let file_path = file_path.into();
    let backup_path = backup_path(&file_path);
    std::fs::rename(&backup_path, &file_path)
        .map_err(|error| RestoreManifestError { file_path, backup_path, error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn restore_without_backup_is_an_error() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("package.json");
        std::fs::write(&file_path, "mutated").unwrap();

        let error = restore(&file_path).await.unwrap_err();

        assert_eq!(error.backup_path, dir.path().join(".package.json.bak"));
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "mutated");
    }

    #[test]
    fn restore_sync_replaces_the_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("package.json");
        std::fs::write(&file_path, "mutated").unwrap();
        std::fs::write(dir.path().join(".package.json.bak"), "original").unwrap();

        restore_sync(&file_path).unwrap();

        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "original");
        assert!(!dir.path().join(".package.json.bak").exists());
    }
}
