use crate::{FetchArtifactError, FetchEvent, NetworkError, Reporter, StoreArtifactError};
use futures_util::StreamExt;
use reqwest::{Client, Response};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::{fs, io::AsyncWriteExt};
use tracing::instrument;
use vaultwrap_fs::temp_path;
use vaultwrap_network::ThrottledClient;
use vaultwrap_store_dir::StoreDir;

/// Result of a successful [`FetchArtifact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The URL has no basename and was ignored.
    Skipped,
    /// The artifact was already in the store. No request was made.
    Cached(PathBuf),
    /// The artifact was downloaded into the store.
    Downloaded(PathBuf),
}

/// This subroutine downloads the artifact of a resolved URL into the store directory.
///
/// The artifact is named after the basename of the URL path. An artifact that is already in
/// the store is never downloaded again.
#[must_use]
pub struct FetchArtifact<'a> {
    /// HTTP client to make HTTP requests. Its permits bound the number of downloads in flight.
    pub http_client: &'a ThrottledClient,
    /// Directory to save the artifact to.
    pub store_dir: &'a StoreDir,
    /// URL to the artifact.
    pub url: &'a str,
    /// Observer of the progress.
    pub reporter: &'a dyn Reporter,
}

impl<'a> FetchArtifact<'a> {
    /// Execute the subroutine.
    #[instrument(skip_all, fields(url = self.url))]
    pub async fn run(self) -> Result<FetchOutcome, FetchArtifactError> {
        let &FetchArtifact { http_client, store_dir, url, reporter } = &self;

        let Some(path) = store_dir.artifact_path(url) else {
            reporter.report(FetchEvent::Skipped { url });
            return Ok(FetchOutcome::Skipped);
        };

        if self.is_stored(&path).await? {
            reporter.report(FetchEvent::Cached { url, path: &path });
            return Ok(FetchOutcome::Cached(path));
        }

        let result =
            http_client.run_with_permit(|client| self.download(client.clone(), &path)).await;
        match result {
            Ok(Some(status)) => {
                reporter.report(FetchEvent::Downloaded { url, path: &path, status });
                Ok(FetchOutcome::Downloaded(path))
            }
            Ok(None) => {
                reporter.report(FetchEvent::Cached { url, path: &path });
                Ok(FetchOutcome::Cached(path))
            }
            Err(error) => {
                reporter.report(FetchEvent::Failed { url, error: &error });
                Err(error)
            }
        }
    }

    async fn is_stored(&self, path: &Path) -> Result<bool, FetchArtifactError> {
        fs::try_exists(path).await.map_err(|error| {
            FetchArtifactError::CheckStore(StoreArtifactError {
                url: self.url.to_string(),
                path: path.to_path_buf(),
                error,
            })
        })
    }

    /// Download the artifact to `path`, returning the HTTP status.
    ///
    /// Returns `None` if another download of the same file name finished first, in which case
    /// that artifact is kept.
    async fn download(
        &self,
        client: Client,
        path: &Path,
    ) -> Result<Option<u16>, FetchArtifactError> {
        let url = self.url;
        self.reporter.report(FetchEvent::Started { url });

        let network_error = |error| {
            FetchArtifactError::FetchArtifact(NetworkError { url: url.to_string(), error })
        };
        let response = client
            .get(url)
            .send()
            .await
            .map_err(network_error)?
            .error_for_status()
            .map_err(network_error)?;
        let status = response.status().as_u16();

        let temp_path = temp_path(path);
        let written = match write_body(response, &temp_path).await {
            Ok(()) => self.persist(&temp_path, path).await,
            Err(BodyError::Network(error)) => Err(network_error(error)),
            Err(BodyError::Io(error)) => Err(self.write_error(path, error)),
        };
        match &written {
            Ok(true) => {
                tracing::debug!(target: "vaultwrap::download", ?url, status, "Download completed");
            }
            Ok(false) => {
                tracing::debug!(target: "vaultwrap::download", ?url, "Already stored, discarded");
                fs::remove_file(&temp_path).await.ok();
            }
            Err(error) => {
                tracing::debug!(target: "vaultwrap::download", ?url, %error, "Download failed");
                fs::remove_file(&temp_path).await.ok();
            }
        }

        written.map(|renamed| renamed.then_some(status))
    }

    /// Move the completed download into place unless the store already has the file.
    async fn persist(&self, temp_path: &Path, path: &Path) -> Result<bool, FetchArtifactError> {
        if self.is_stored(path).await? {
            return Ok(false);
        }
        fs::rename(temp_path, path).await.map_err(|error| self.write_error(path, error))?;
        Ok(true)
    }

    fn write_error(&self, path: &Path, error: io::Error) -> FetchArtifactError {
        FetchArtifactError::WriteArtifact(StoreArtifactError {
            url: self.url.to_string(),
            path: path.to_path_buf(),
            error,
        })
    }
}

enum BodyError {
    Network(reqwest::Error),
    Io(io::Error),
}

/// Stream the body of `response` into a new file at `path`.
async fn write_body(response: Response, path: &Path) -> Result<(), BodyError> {
    let mut file = fs::File::create(path).await.map_err(BodyError::Io)?;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(BodyError::Network)?;
        file.write_all(&chunk).await.map_err(BodyError::Io)?;
    }
    file.flush().await.map_err(BodyError::Io)?;
    file.sync_all().await.map_err(BodyError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogReporter;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Record the kind of every event.
    #[derive(Default)]
    struct RecordReporter(Mutex<Vec<&'static str>>);

    impl Reporter for RecordReporter {
        fn report(&self, event: FetchEvent<'_>) {
            let kind = match event {
                FetchEvent::Skipped { .. } => "skipped",
                FetchEvent::Cached { .. } => "cached",
                FetchEvent::Started { .. } => "started",
                FetchEvent::Downloaded { .. } => "downloaded",
                FetchEvent::Failed { .. } => "failed",
            };
            self.0.lock().unwrap().push(kind);
        }
    }

    fn list_dir(path: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(path)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn second_fetch_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/a/-/a-1.0.0.tgz")
            .with_status(200)
            .with_body("tarball of a")
            .expect(1)
            .create_async()
            .await;
        let url = format!("{}/a/-/a-1.0.0.tgz", server.url());
        let dir = tempdir().unwrap();
        let store_dir = StoreDir::new(dir.path());
        let http_client = ThrottledClient::default();
        let reporter = RecordReporter::default();
        let fetch = || FetchArtifact {
            http_client: &http_client,
            store_dir: &store_dir,
            url: &url,
            reporter: &reporter,
        };

        let first = fetch().run().await.unwrap();
        let second = fetch().run().await.unwrap();

        let path = dir.path().join("a-1.0.0.tgz");
        assert_eq!(first, FetchOutcome::Downloaded(path.clone()));
        assert_eq!(second, FetchOutcome::Cached(path.clone()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "tarball of a");
        assert_eq!(*reporter.0.lock().unwrap(), ["started", "downloaded", "cached"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn url_without_basename_is_skipped() {
        let dir = tempdir().unwrap();
        let outcome = FetchArtifact {
            http_client: &ThrottledClient::default(),
            store_dir: &StoreDir::new(dir.path()),
            url: "http://127.0.0.1:1/",
            reporter: &LogReporter,
        }
        .run()
        .await
        .unwrap();

        assert_eq!(outcome, FetchOutcome::Skipped);
        assert_eq!(list_dir(dir.path()), Vec::<String>::new());
    }

    #[tokio::test]
    async fn http_error_leaves_no_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/missing.tgz").with_status(404).create_async().await;
        let url = format!("{}/missing.tgz", server.url());
        let dir = tempdir().unwrap();
        let reporter = RecordReporter::default();

        let error = FetchArtifact {
            http_client: &ThrottledClient::default(),
            store_dir: &StoreDir::new(dir.path()),
            url: &url,
            reporter: &reporter,
        }
        .run()
        .await
        .expect_err("404 should fail");

        assert!(matches!(error, FetchArtifactError::FetchArtifact(_)), "{error}");
        assert_eq!(error.url(), url);
        assert_eq!(list_dir(dir.path()), Vec::<String>::new());
        assert_eq!(*reporter.0.lock().unwrap(), ["started", "failed"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn connection_error_is_reported() {
        let dir = tempdir().unwrap();
        let error = FetchArtifact {
            http_client: &ThrottledClient::default(),
            store_dir: &StoreDir::new(dir.path()),
            url: "http://127.0.0.1:1/unreachable.tgz",
            reporter: &LogReporter,
        }
        .run()
        .await
        .expect_err("nothing listens on port 1");

        assert!(matches!(error, FetchArtifactError::FetchArtifact(_)), "{error}");
        assert_eq!(list_dir(dir.path()), Vec::<String>::new());
    }

    #[tokio::test]
    async fn missing_store_dir_is_a_write_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/b.tgz").with_body("b").create_async().await;
        let url = format!("{}/b.tgz", server.url());
        let dir = tempdir().unwrap();
        let reporter = RecordReporter::default();

        let error = FetchArtifact {
            http_client: &ThrottledClient::default(),
            store_dir: &StoreDir::new(dir.path().join("missing")),
            url: &url,
            reporter: &reporter,
        }
        .run()
        .await
        .expect_err("store directory does not exist");

        assert!(matches!(error, FetchArtifactError::WriteArtifact(_)), "{error}");
        assert_eq!(*reporter.0.lock().unwrap(), ["started", "failed"]);
        assert_eq!(list_dir(dir.path()), Vec::<String>::new());
    }
}
