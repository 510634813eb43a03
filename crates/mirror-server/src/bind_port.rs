use derive_more::{Display, Error};
use miette::Diagnostic;
use std::io::{self, ErrorKind};
use tokio::net::TcpListener;

/// Error type of [`bind_available_port`].
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum BindPortError {
    #[display("Failed to listen on {host}:{port}: {error}")]
    #[diagnostic(code(vaultwrap_mirror_server::bind))]
    Bind {
        host: String,
        port: u16,
        #[error(source)]
        error: io::Error,
    },

    #[display("No free port on {host} at or above {base_port}")]
    #[diagnostic(
        code(vaultwrap_mirror_server::no_available_port),
        help("Pick another base port with --port.")
    )]
    NoAvailablePort { host: String, base_port: u16 },
}

/// Listen on the first free port of `host` at or above `base_port`.
///
/// Ports that are taken or forbidden are skipped. Any other failure, such as an unknown
/// host, is returned right away.
pub async fn bind_available_port(host: &str, base_port: u16) -> Result<TcpListener, BindPortError> {
    for port in base_port..=u16::MAX {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(error) if is_port_unavailable(&error) => {
                tracing::trace!(target: "vaultwrap::server", port, %error, "Port is unavailable");
            }
            Err(error) => {
                return Err(BindPortError::Bind { host: host.to_string(), port, error });
            }
        }
    }
    Err(BindPortError::NoAvailablePort { host: host.to_string(), base_port })
}

fn is_port_unavailable(error: &io::Error) -> bool {
    matches!(error.kind(), ErrorKind::AddrInUse | ErrorKind::PermissionDenied)
}
