use crate::Lockfile;
use derive_more::{Display, Error};
use miette::Diagnostic;
use pipe_trait::Pipe;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Error when reading lockfile the filesystem.
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum LoadLockfileError {
    #[display("Failed to read lockfile content at {file_path:?}: {error}")]
    #[diagnostic(code(vaultwrap_lockfile::read_file))]
    ReadFile {
        file_path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[display("Failed to parse lockfile content at {file_path:?} as JSON: {error}")]
    #[diagnostic(code(vaultwrap_lockfile::parse_json))]
    ParseJson {
        file_path: PathBuf,
        #[error(source)]
        error: serde_json::Error,
    },
}

impl Lockfile {
    /// Path of the lockfile inside the project root directory.
    pub fn path_in(root_dir: &Path) -> PathBuf {
        root_dir.join(Lockfile::FILE_NAME)
    }

    /// Load the lockfile from the project root directory.
    pub fn load_from_dir(root_dir: &Path) -> Result<Self, LoadLockfileError> {
        Lockfile::load_from_path(&Lockfile::path_in(root_dir))
    }

    /// Load a lockfile from `file_path`.
    pub fn load_from_path(file_path: &Path) -> Result<Self, LoadLockfileError> {
        let content = fs::read(file_path).map_err(|error| LoadLockfileError::ReadFile {
            file_path: file_path.to_path_buf(),
            error,
        })?;
        content
            .pipe_as_ref(serde_json::from_slice)
            .map(|value| Lockfile { value })
            .map_err(|error| LoadLockfileError::ParseJson { file_path: file_path.to_path_buf(), error })
    }
}
