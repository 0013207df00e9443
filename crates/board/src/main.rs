//! Tickerboard - live console board of streaming tickers
//!
//! Main entry point

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};

use tickerboard::{init_tracing, Board};
use tickerboard_core::BoardConfig;
use tickerboard_render::ConsoleRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = BoardConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log);

    info!("Starting tickerboard v{}", env!("CARGO_PKG_VERSION"));

    let renderer = ConsoleRenderer::stdout(&config.render);
    let summary = Board::new(config).run(renderer, shutdown_signal()).await?;

    for (instrument, exit) in &summary.workers {
        info!("Worker {} exited: {:?}", instrument, exit);
    }
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        }
        _ = terminate => {
            info!("Received termination signal");
        }
    }
}
