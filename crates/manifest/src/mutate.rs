use derive_more::{Display, Error};
use miette::Diagnostic;
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;
use vaultwrap_fs::{backup_path, write_atomic, WriteAtomicError};
use vaultwrap_lockfile::walk_mut;

/// Error type of [`mutate`].
///
/// Unless the variant is [`MutateManifestError::Rollback`], the file holds its original
/// content again and no backup is left behind.
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum MutateManifestError {
    #[display("Refusing to mutate {file_path:?}: a backup from an earlier run exists at {backup_path:?}")]
    #[diagnostic(
        code(vaultwrap_manifest::backup_exists),
        help("An interrupted run may have left the file rewritten. Move the backup back over the file to restore it.")
    )]
    BackupExists { file_path: PathBuf, backup_path: PathBuf },

    #[display("Failed to back up {file_path:?} to {backup_path:?}: {error}")]
    #[diagnostic(code(vaultwrap_manifest::create_backup))]
    CreateBackup {
        file_path: PathBuf,
        backup_path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[display("Failed to read {backup_path:?}: {error}")]
    #[diagnostic(code(vaultwrap_manifest::read_backup))]
    ReadBackup {
        backup_path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[display("Failed to parse {file_path:?} as JSON: {error}")]
    #[diagnostic(code(vaultwrap_manifest::parse_json))]
    ParseJson {
        file_path: PathBuf,
        #[error(source)]
        error: serde_json::Error,
    },

    #[display("Failed to serialize the rewritten {file_path:?}: {error}")]
    #[diagnostic(code(vaultwrap_manifest::serialize_json))]
    SerializeJson {
        file_path: PathBuf,
        #[error(source)]
        error: serde_json::Error,
    },

    #[display("Failed to write the rewritten {file_path:?}: {error}")]
    #[diagnostic(code(vaultwrap_manifest::write_file))]
    WriteFile {
        file_path: PathBuf,
        #[error(source)]
        error: WriteAtomicError,
    },

    #[display("Failed to put the backup {backup_path:?} back at {file_path:?} after an error ({cause}): {error}")]
    #[diagnostic(
        code(vaultwrap_manifest::rollback),
        help("The original content is kept in the backup file. Move it back manually.")
    )]
    Rollback {
        file_path: PathBuf,
        backup_path: PathBuf,
        cause: Box<MutateManifestError>,
        #[error(source)]
        error: io::Error,
    },
}

/// Rewrite the string value of every field called `field` in the JSON file at `file_path`.
///
/// The file is first renamed to its [backup](backup_path), so the original bytes are never
/// lost, even if the process dies midway. The rewritten document is written to `file_path`
/// as pretty-printed JSON. Undo with [`restore`](crate::restore).
///
/// Non-string values of `field` are kept as they are.
///
/// On failure, the backup is renamed back to `file_path` and the file is left untouched.
pub async fn mutate<MapFn>(
    file_path: &Path,
    field: &str,
    mut map: MapFn,
) -> Result<(), MutateManifestError>
where
    MapFn: FnMut(&str) -> String,
{
    let backup_path = backup_path(file_path);
    if fs::try_exists(&backup_path).await.unwrap_or(false) {
        return Err(MutateManifestError::BackupExists {
            file_path: file_path.to_path_buf(),
            backup_path,
        });
    }

    fs::rename(file_path, &backup_path).await.map_err(|error| {
        MutateManifestError::CreateBackup {
            file_path: file_path.to_path_buf(),
            backup_path: backup_path.clone(),
            error,
        }
    })?;

    let result = rewrite(file_path, &backup_path, field, &mut map).await;
    let Err(cause) = result else {
        tracing::debug!(target: "vaultwrap::manifest", ?file_path, field, "Mutated");
        return Ok(());
    };

    match fs::rename(&backup_path, file_path).await {
        Ok(()) => Err(cause),
        Err(error) => Err(MutateManifestError::Rollback {
            file_path: file_path.to_path_buf(),
            backup_path,
            cause: Box::new(cause),
            error,
        }),
    }
}

async fn rewrite<MapFn>(
    file_path: &Path,
    backup_path: &Path,
    field: &str,
    map: &mut MapFn,
) -> Result<(), MutateManifestError>
where
    MapFn: FnMut(&str) -> String,
{
    let content = fs::read(backup_path).await.map_err(|error| {
        MutateManifestError::ReadBackup { backup_path: backup_path.to_path_buf(), error }
    })?;

    let mut value: serde_json::Value = serde_json::from_slice(&content).map_err(|error| {
        MutateManifestError::ParseJson { file_path: file_path.to_path_buf(), error }
    })?;

    walk_mut(&mut value, |node| {
        if !node.key().is_field(field) {
            return;
        }
        if let Some(url) = node.value().as_str() {
            let mapped = map(url);
            node.replace(mapped.into());
        }
    });

    let content = serde_json::to_string_pretty(&value).map_err(|error| {
        MutateManifestError::SerializeJson { file_path: file_path.to_path_buf(), error }
    })?;

    write_atomic(file_path, content)
        .await
        .map_err(|error| MutateManifestError::WriteFile { file_path: file_path.to_path_buf(), error })
}
