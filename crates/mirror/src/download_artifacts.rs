use derive_more::{Display, Error};
use futures_util::{stream::FuturesUnordered, StreamExt};
use miette::Diagnostic;
use std::collections::BTreeSet;
use vaultwrap_fetcher::{FetchArtifact, FetchArtifactError, FetchOutcome, Reporter};
use vaultwrap_network::ThrottledClient;
use vaultwrap_store_dir::StoreDir;

/// Error type of [`DownloadArtifacts::run`].
#[derive(Debug, Display, Error, Diagnostic)]
#[display(
    "Failed to download {failed_count} of {total} artifacts, the first failure being {}",
    first.url()
)]
#[diagnostic(
    code(vaultwrap_mirror::download_artifacts),
    help("Artifacts that were downloaded are kept. Run the command again to retry the rest.")
)]
pub struct DownloadArtifactsError {
    pub failed_count: usize,
    pub total: usize,
    /// Earliest failure to complete.
    #[error(source)]
    pub first: FetchArtifactError,
}

/// Count of artifacts per [`FetchOutcome`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub cached: usize,
    pub skipped: usize,
}

/// This subroutine fetches every URL of a task set into the store directory.
///
/// Fetches are independent: a failure does not cancel the others. The number of requests in
/// flight is bounded by the permits of [`http_client`](Self::http_client). Results are gathered
/// in the order the fetches finish.
#[must_use]
pub struct DownloadArtifacts<'a> {
    pub http_client: &'a ThrottledClient,
    pub store_dir: &'a StoreDir,
    pub urls: &'a BTreeSet<String>,
    pub reporter: &'a dyn Reporter,
}

impl<'a> DownloadArtifacts<'a> {
    /// Execute the subroutine.
    pub async fn run(self) -> Result<DownloadSummary, DownloadArtifactsError> {
        let DownloadArtifacts { http_client, store_dir, urls, reporter } = self;

        let results = urls
            .iter()
            .map(|url| {
                FetchArtifact { http_client, store_dir, url: url.as_str(), reporter }.run()
            })
            .collect::<FuturesUnordered<_>>()
            .collect::<Vec<_>>()
            .await;

        let total = results.len();
        let mut summary = DownloadSummary::default();
        let mut failed_count = 0;
        let mut first = None;
        for result in results {
            match result {
                Ok(FetchOutcome::Downloaded(_)) => summary.downloaded += 1,
                Ok(FetchOutcome::Cached(_)) => summary.cached += 1,
                Ok(FetchOutcome::Skipped) => summary.skipped += 1,
                Err(error) => {
                    failed_count += 1;
                    first.get_or_insert(error);
                }
            }
        }

        match first {
            None => Ok(summary),
            Some(first) => Err(DownloadArtifactsError { failed_count, total, first }),
        }
    }
}
