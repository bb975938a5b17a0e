//! Pitch Like This server — application entry point.

use pitch_db::DbManager;
use pitch_server::config::ServerConfig;
use pitch_server::error::ServerError;
use pitch_server::routes;
use pitch_server::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pitch=info")),
        )
        .json()
        .init();

    tracing::info!("Starting Pitch Like This server...");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Server terminated");
        std::process::exit(1);
    }

    tracing::info!("Pitch Like This server stopped.");
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;
    let db = DbManager::connect(&config.db).await?;
    pitch_db::run_migrations(db.client()).await?;

    let bind_addr = config.bind_addr.clone();
    let app = routes::router(AppState::new(db.client().clone(), config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: bind_addr.clone(),
            source,
        })?;
    tracing::info!(addr = %bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
