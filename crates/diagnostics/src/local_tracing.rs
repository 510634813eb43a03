use std::{str::FromStr, sync::atomic::AtomicBool};

use tracing::Level;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, Layer};

static IS_TRACING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Every vaultwrap crate and every user-facing event target starts with this prefix.
const TARGET_PREFIX: &str = "vaultwrap";

/// Install the global subscriber.
///
/// Without `TRACE`, only the progress report (`info` and above from vaultwrap targets) is
/// printed to stderr in a compact form. With `TRACE` set to a level such as `debug`, every
/// vaultwrap target is traced at that level with pretty output. Any other value of `TRACE`
/// is parsed as an [`EnvFilter`] directive.
pub fn enable_tracing_by_env() {
    if IS_TRACING_ENABLED.swap(true, std::sync::atomic::Ordering::SeqCst) {
        return;
    }

    use tracing_subscriber::{fmt, prelude::*};

    let Ok(trace_var) = std::env::var("TRACE") else {
        tracing_subscriber::registry()
            .with(progress_layer())
            .with(
                fmt::layer()
                    .compact()
                    .without_time()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
        return;
    };

    tracing_subscriber::registry()
        .with(common_layer(&trace_var))
        .with(
            fmt::layer()
                .pretty()
                .with_file(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(std::io::stderr),
        )
        .init();
    tracing::trace!("enable_tracing_by_env");
}

fn progress_layer() -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync> {
    tracing_subscriber::filter::Targets::new().with_target(TARGET_PREFIX, Level::INFO).boxed()
}

fn common_layer(trace_var: &str) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync> {
    if let Ok(default_level) = Level::from_str(trace_var) {
        tracing_subscriber::filter::Targets::new()
            .with_targets([(TARGET_PREFIX, default_level)])
            .boxed()
    } else {
        EnvFilter::builder()
            .with_regex(true)
            .parse(trace_var)
            .unwrap_or_else(|error| panic!("TRACE is not a valid filter directive: {error}"))
            .boxed()
    }
}
