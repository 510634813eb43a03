use derive_more::{Display, Error};
use miette::Diagnostic;
use pipe_trait::Pipe;
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Error type of [`ProjectManifest::load`].
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum LoadProjectManifestError {
    #[display("Failed to read {file_path:?}: {error}")]
    #[diagnostic(code(vaultwrap_config::read_manifest))]
    ReadFile {
        file_path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[display("Failed to parse {file_path:?}: {error}")]
    #[diagnostic(code(vaultwrap_config::parse_manifest))]
    ParseJson {
        file_path: PathBuf,
        #[error(source)]
        error: serde_json::Error,
    },
}

/// Settings read from the `package.json` of the project root.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManifest {
    /// Location of the store directory, relative to the project root.
    #[serde(default)]
    pub shrinkwrap_vault: Option<PathBuf>,
}

impl ProjectManifest {
    /// Base file name of the project manifest.
    pub const FILE_NAME: &'static str = "package.json";

    /// Load the manifest of the project at `root_dir`.
    pub fn load(root_dir: &Path) -> Result<Self, LoadProjectManifestError> {
        let file_path = root_dir.join(ProjectManifest::FILE_NAME);
        let content = fs::read(&file_path).map_err(|error| {
            LoadProjectManifestError::ReadFile { file_path: file_path.clone(), error }
        })?;
        content
            .pipe_as_ref(serde_json::from_slice)
            .map_err(|error| LoadProjectManifestError::ParseJson { file_path, error })
    }
}
