use axum::{
    body::Body,
    extract::{Path as AxumPath, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use derive_more::{Display, Error};
use miette::Diagnostic;
use std::{io, net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tokio_util::io::ReaderStream;
use vaultwrap_store_dir::StoreDir;

/// Error type of [`MirrorServer::start`].
#[derive(Debug, Display, Error, Diagnostic)]
#[display("Failed to read the address of the mirror server: {_0}")]
#[diagnostic(code(vaultwrap_mirror_server::local_addr))]
pub struct StartServerError(#[error(source)] io::Error);

/// Error type of [`MirrorServer::stop`].
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum StopServerError {
    #[display("The mirror server failed: {_0}")]
    #[diagnostic(code(vaultwrap_mirror_server::serve))]
    Serve(#[error(source)] io::Error),

    #[display("The mirror server task did not finish: {_0}")]
    #[diagnostic(code(vaultwrap_mirror_server::join))]
    Join(#[error(source)] tokio::task::JoinError),
}

/// Handler of a running local mirror server.
///
/// The server answers `GET /{file_name}` with the content of that entry of the store directory.
/// It keeps running until [stopped](MirrorServer::stop) or dropped.
#[derive(Debug)]
#[must_use]
pub struct MirrorServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<io::Result<()>>>,
}

impl MirrorServer {
    /// Start serving `store_dir` on `listener`.
    pub fn start(listener: TcpListener, store_dir: StoreDir) -> Result<Self, StartServerError> {
        let addr = listener.local_addr().map_err(StartServerError)?;
        let (shutdown, shutdown_signal) = oneshot::channel::<()>();
        let app = Router::new()
            .route("/{file_name}", get(serve_artifact))
            .with_state(Arc::new(store_dir));

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_signal.await.ok();
                })
                .await
        });

        tracing::info!(target: "vaultwrap::server", %addr, "Serving the store");
        Ok(MirrorServer { addr, shutdown: Some(shutdown), task: Some(task) })
    }

    /// Address the server listens on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Close the listener and wait for in-flight requests to finish.
    pub async fn stop(mut self) -> Result<(), StopServerError> {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.send(()).ok();
        }
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        task.await.map_err(StopServerError::Join)?.map_err(StopServerError::Serve)?;
        tracing::debug!(target: "vaultwrap::server", addr = %self.addr, "Stopped");
        Ok(())
    }
}

impl Drop for MirrorServer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Whether `file_name` may name an entry of the store.
///
/// Hidden files are excluded so that incomplete downloads are never served.
fn is_servable(file_name: &str) -> bool {
    !file_name.is_empty()
        && !file_name.starts_with('.')
        && !file_name.contains(['/', '\\'])
}

async fn serve_artifact(
    State(store_dir): State<Arc<StoreDir>>,
    AxumPath(file_name): AxumPath<String>,
) -> Result<Response, StatusCode> {
    if !is_servable(&file_name) {
        tracing::warn!(target: "vaultwrap::server", %file_name, "Refused");
        return Err(StatusCode::NOT_FOUND);
    }

    let path = store_dir.entry_path(&file_name);
    let opened = match tokio::fs::File::open(&path).await {
        Ok(file) => file.metadata().await.map(|metadata| (file, metadata.len())),
        Err(error) => Err(error),
    };
    match opened {
        Ok((file, bytes)) => {
            tracing::debug!(target: "vaultwrap::server", %file_name, bytes, "Serving");
            Response::builder()
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .header(header::CONTENT_LENGTH, bytes)
                .body(Body::from_stream(ReaderStream::new(file)))
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(target: "vaultwrap::server", %file_name, "Not in the store");
            Err(StatusCode::NOT_FOUND)
        }
        Err(error) => {
            tracing::error!(target: "vaultwrap::server", %file_name, %error, "Failed to read");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
