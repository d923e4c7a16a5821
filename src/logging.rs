use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `fallback`; output goes
/// to stderr so stdout stays free for the stdio protocol.
pub fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
