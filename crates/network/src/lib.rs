use pipe_trait::Pipe;
use reqwest::Client;
use std::future::IntoFuture;
use tokio::sync::Semaphore;

/// Wrapper around [`Client`] with concurrent request limit enforced by the [`Semaphore`] mechanism.
#[derive(Debug)]
pub struct ThrottledClient {
    semaphore: Semaphore,
    client: Client,
}

impl ThrottledClient {
    /// Number of requests allowed in flight when no limit is configured.
    pub const DEFAULT_PERMITS: usize = 10;

    /// Acquire a permit and run `proc` with the underlying [`Client`].
    ///
    /// Callers beyond the limit wait until a permit is released.
    pub async fn run_with_permit<Proc, ProcFuture>(&self, proc: Proc) -> ProcFuture::Output
    where
        Proc: FnOnce(&Client) -> ProcFuture,
        ProcFuture: IntoFuture,
    {
        let permit = self.semaphore.acquire().await.expect("the semaphore is never closed");
        let result = proc(&self.client).await;
        drop(permit);
        result
    }

    /// Construct a new throttled client that allows at most `permits` requests at once.
    ///
    /// A limit of zero would deadlock every request, so it is raised to one.
    pub fn new_with_permits(permits: usize) -> Self {
        let semaphore = permits.max(1).pipe(Semaphore::new);
        let client = Client::new();
        ThrottledClient { semaphore, client }
    }
}

impl Default for ThrottledClient {
    fn default() -> Self {
        ThrottledClient::new_with_permits(ThrottledClient::DEFAULT_PERMITS)
    }
}
