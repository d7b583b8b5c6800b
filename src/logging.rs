use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging to stderr so JSON printed on stdout stays clean.
///
/// `level` applies to this crate only; `RUST_LOG` overrides the whole filter.
/// Calling this twice is harmless: the second subscriber is discarded.
pub fn init_logging(level: &str) {
    let default_filter = format!("glidepath={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .try_init();
}
