use lithub::routes::create_routes;
use lithub::{AppConfig, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting Lithub server...");

    let config = AppConfig::from_env()?;
    info!("Server configuration loaded");

    let app_state = AppState::new(config.clone()).await?;
    info!("Application state initialized");

    let app = create_routes()
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr: SocketAddr = config.server_address().parse()?;
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", config.server_address());
    info!("🔐 AUTH: Google sign-in redirects to {}", config.oauth_redirect_uri("google"));

    axum::serve(listener, app).await?;

    Ok(())
}
