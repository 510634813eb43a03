use crate::temp_path;
use derive_more::{Display, Error};
use miette::Diagnostic;
use std::{io, path::PathBuf};
use tokio::fs;

/// Error type of [`write_atomic`].
#[derive(Debug, Display, Error, Diagnostic)]
pub enum WriteAtomicError {
    #[display("Failed to write to temporary file at {temp_path:?}: {error}")]
    #[diagnostic(code(vaultwrap_fs::write_temp_file))]
    WriteTempFile {
        temp_path: PathBuf,
        #[error(source)]
        error: io::Error,
    },
    #[display("Failed to move {temp_path:?} to {file_path:?}: {error}")]
    #[diagnostic(code(vaultwrap_fs::rename_temp_file))]
    RenameTempFile {
        temp_path: PathBuf,
        file_path: PathBuf,
        #[error(source)]
        error: io::Error,
    },
}

/// Write `content` to `file_path` so that readers never observe a partially written file.
///
/// The content goes to a [temporary sibling](temp_path) first, which is then renamed onto
/// `file_path`. The temporary file is removed if either step fails.
pub async fn write_atomic(
    file_path: impl Into<PathBuf>,
    content: impl AsRef<[u8]>,
) -> Result<(), WriteAtomicError> {
    let file_path = file_path.into();
    let temp_path = temp_path(&file_path);

    if let Err(error) = fs::write(&temp_path, content).await {
        fs::remove_file(&temp_path).await.ok();
        return Err(WriteAtomicError::WriteTempFile { temp_path, error });
    }

    if let Err(error) = fs::rename(&temp_path, &file_path).await {
        fs::remove_file(&temp_path).await.ok();
        return Err(WriteAtomicError::RenameTempFile { temp_path, file_path, error });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn replaces_existing_content() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("package.json");
        std::fs::write(&file_path, "old").unwrap();

        write_atomic(&file_path, "new").await.unwrap();

        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "new");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, ["package.json"]);
    }

    #[tokio::test]
    async fn missing_directory_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("missing").join("package.json");

        let error = write_atomic(&file_path, "content").await.unwrap_err();

        assert!(matches!(error, WriteAtomicError::WriteTempFile { .. }), "{error}");
        assert!(!file_path.exists());
    }
}
