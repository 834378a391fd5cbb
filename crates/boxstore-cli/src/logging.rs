use tracing_subscriber::EnvFilter;

/// Install a stderr `tracing` subscriber filtered by `BOXSTORE_LOG`, then
/// `RUST_LOG`, then `info`. Stdout is left for command output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// The first log directive that parses wins; a malformed `BOXSTORE_LOG`
/// falls through to `RUST_LOG` instead of silencing output.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("BOXSTORE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
