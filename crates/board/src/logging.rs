use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use tickerboard_core::LogConfig;

/// Install the global subscriber. Logs go to stderr, the board owns stdout.
pub fn init_tracing(config: &LogConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base)
            .init();
    }
}
