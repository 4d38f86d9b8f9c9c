use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `verbosity`.
/// `log` records from library code are bridged into the same output.
pub fn init_logging(verbosity: u8) {
    let default_directive = match verbosity {
        0 => "pokedex=info,pokedex_lib=info,axum=info",
        1 => "pokedex=debug,pokedex_lib=debug,axum=info",
        _ => "pokedex=trace,pokedex_lib=trace,tower_http=debug,axum=debug",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Try to initialize tracing, ignore if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
