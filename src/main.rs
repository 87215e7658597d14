use std::net::SocketAddr;
use std::sync::Arc;
use storefront_core::config::Config;
use storefront_core::router::create_app_router;
use storefront_core::state::AppState;
use storefront_core::telemetry::init_tracing;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        error!(error = %e, "storefront stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let port = config.port;

    // Initialize application state
    let state = Arc::new(AppState::from_config(config)?);
    state.start_background_tasks();

    // Build application router with all routes and middleware
    let app = create_app_router(state.clone());

    // Configure the server address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.dispose();
    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
