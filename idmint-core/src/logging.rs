use tracing_subscriber::EnvFilter;

/// Install a global `tracing_subscriber::fmt` subscriber.
///
/// Respects `RUST_LOG`, falling back to debug output for the idmint crates. Safe to call more
/// than once: later calls are ignored, so tests may call it freely.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,idmint_core=debug,idmint_oidc=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
