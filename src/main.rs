//! genai-sql HTTP service entry point.
//!
//! Features:
//! - Graceful shutdown with a drain timeout
//! - Signal handling (SIGTERM, SIGINT)
//! - Connection pool cleanup

use anyhow::Result;
use genai_sql::shutdown::{install_signal_handlers, new_shutdown_controller, ShutdownConfig};
use genai_sql::transport::{serve, HttpConfig};
use genai_sql::{Config, GenaiSqlServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let version = env!("CARGO_PKG_VERSION");
    info!("genai-sql v{version} starting...");

    std::panic::set_hook(Box::new(|info| {
        error!("[PANIC] {}", info);
    }));

    // Load configuration from environment
    let config = Config::from_env()?;
    let http_config = HttpConfig::from_env();
    let shutdown_config = ShutdownConfig::from_env();
    info!("Configuration loaded successfully");

    let shutdown_controller = new_shutdown_controller(shutdown_config.drain_timeout);
    install_signal_handlers(shutdown_controller.clone()).await;

    let server = GenaiSqlServer::new(config).await?;
    info!("Server initialized. Ready to accept requests...");

    let served = serve(server.clone(), &http_config, shutdown_controller.clone()).await;
    if let Err(e) = &served {
        error!("HTTP server error: {e}");
    }

    shutdown_controller.graceful_shutdown(&server).await;
    info!("Server shutdown complete");

    served
}

/// Initialize tracing subscriber with stderr output.
fn init_logging() {
    let filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn,genai_sql=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
