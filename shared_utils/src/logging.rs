use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder};

/// Sets up the global tracing subscriber with a fmt formatter and env filter.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` is used
/// (e.g. `"info,movie_sync=debug"`). Calling this twice returns an error
/// rather than panicking, so tests and binaries can share it.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}
