//! Biomass Explorer HTTP Server Binary
//!
//! Loads the configuration, opens the explorer session and serves the REST API.
//!
//! # Usage
//!
//! ```bash
//! # Against a running analysis service
//! API_URL=http://localhost:8000 cargo run --bin biomass-server
//!
//! # Fully offline with synthetic data
//! BACKEND_TYPE=local cargo run --bin biomass-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `API_URL`: Analysis service base URL
//! - `BACKEND_TYPE`: `http` (default) or `local`
//! - `CLOUD_COVER`: Maximum cloud cover in percent (default: 20)
//! - `REQUEST_TIMEOUT_SECS`: Per-request timeout (default: none)
//! - `DATA_DIR`: Directory for saved fields and preferences (default: data)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use biomass_explorer::config::ExplorerConfig;
use biomass_explorer::http::{create_router, AppState};
use biomass_explorer::services::ExplorerSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting Biomass Explorer HTTP Server");

    let config = ExplorerConfig::load()?;
    info!(
        "Backend: {} ({}), cloud cover {}%",
        config.backend_type.as_str(),
        config.api_url,
        config.cloud_cover
    );

    let addr: SocketAddr = config.bind_address().parse()?;
    let session = ExplorerSession::open(config)?;
    let app = create_router(AppState::new(Arc::new(session)));

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
