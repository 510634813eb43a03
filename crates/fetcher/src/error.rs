use derive_more::{Display, Error};
use miette::Diagnostic;
use std::{io, path::PathBuf};

#[derive(Debug, Display, Error, Diagnostic)]
#[display("Failed to fetch {url}: {error}")]
pub struct NetworkError {
    pub url: String,
    #[error(source)]
    pub error: reqwest::Error,
}

#[derive(Debug, Display, Error, Diagnostic)]
#[display("Failed to store {url} at {path:?}: {error}")]
pub struct StoreArtifactError {
    pub url: String,
    pub path: PathBuf,
    #[error(source)]
    pub error: io::Error,
}

/// Error type of [`FetchArtifact::run`](crate::FetchArtifact::run).
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum FetchArtifactError {
    #[diagnostic(code(vaultwrap_fetcher::fetch_artifact))]
    FetchArtifact(NetworkError),

    #[diagnostic(code(vaultwrap_fetcher::check_store))]
    CheckStore(StoreArtifactError),

    #[diagnostic(code(vaultwrap_fetcher::write_artifact))]
    WriteArtifact(StoreArtifactError),
}

impl FetchArtifactError {
    /// URL of the artifact that failed to be fetched.
    pub fn url(&self) -> &str {
        match self {
            FetchArtifactError::FetchArtifact(NetworkError { url, .. })
            | FetchArtifactError::CheckStore(StoreArtifactError { url, .. })
            | FetchArtifactError::WriteArtifact(StoreArtifactError { url, .. }) => url,
        }
    }
}
