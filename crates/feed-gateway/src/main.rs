//! Match feed gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p feed-gateway
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use feed_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Gateway failed to start");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Initialize tracing for the configured environment
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        name = %config.app.name,
        env = ?config.app.env,
        address = %config.server.address(),
        heartbeat_interval_ms = config.websocket.heartbeat_interval_ms,
        "Configuration loaded"
    );

    if let Err(e) = feed_gateway::run(config).await {
        error!(code = e.error_code(), error = %e, "Gateway stopped");
        return Err(e.into());
    }

    Ok(())
}
