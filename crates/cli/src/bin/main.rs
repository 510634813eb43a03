use std::process::ExitCode;
use vaultwrap_diagnostics::Result;

#[tokio::main(flavor = "multi_thread")]
pub async fn main() -> Result<ExitCode> {
    vaultwrap_cli::run_cli().await
}
