use tracing_subscriber::EnvFilter;

/// Initialize structured logging for the whole process.
///
/// RUST_LOG takes precedence when set; otherwise the configured level
/// applies to every target. Output goes to stderr so that normalized
/// records on stdout stay machine-readable.
pub fn init(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
