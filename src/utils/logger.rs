use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the compact console subscriber. `RUST_LOG` wins over `directive`,
/// which wins over the verbosity default.
pub fn init_cli_logger(verbose: bool, directive: Option<&str>) {
    let fallback = match (directive, verbose) {
        (Some(d), _) => d.to_string(),
        (None, true) => "shotmark_etl=debug,info".to_string(),
        (None, false) => "shotmark_etl=info".to_string(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
