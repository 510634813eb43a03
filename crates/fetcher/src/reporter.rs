use crate::FetchArtifactError;
use std::path::Path;

/// Progress of a single [`FetchArtifact`](crate::FetchArtifact).
#[derive(Debug, Clone, Copy)]
pub enum FetchEvent<'a> {
    /// The URL has no basename, so there is nothing to name the artifact after.
    Skipped { url: &'a str },
    /// The artifact is already in the store.
    Cached { url: &'a str, path: &'a Path },
    /// A request to `url` is about to be sent.
    Started { url: &'a str },
    /// The artifact was downloaded to `path`.
    Downloaded { url: &'a str, path: &'a Path, status: u16 },
    /// The artifact could not be fetched.
    Failed { url: &'a str, error: &'a FetchArtifactError },
}

/// Observer of [`FetchEvent`]s.
pub trait Reporter: Send + Sync {
    fn report(&self, event: FetchEvent<'_>);
}

/// Report fetch progress as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: FetchEvent<'_>) {
        match event {
            FetchEvent::Skipped { url } => {
                tracing::warn!(target: "vaultwrap::download", "SKIP {url} (no file name in URL)");
            }
            FetchEvent::Cached { url, path } => {
                tracing::debug!(target: "vaultwrap::download", ?path, "HIT {url}");
            }
            FetchEvent::Started { url } => {
                tracing::info!(target: "vaultwrap::download", "GET {url}");
            }
            FetchEvent::Downloaded { url, path, status } => {
                tracing::info!(target: "vaultwrap::download", ?path, "{status} {url}");
            }
            FetchEvent::Failed { url, error } => {
                tracing::error!(target: "vaultwrap::download", %error, "ERR {url}");
            }
        }
    }
}
