use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use prompt_relay::{create_router, AppState, Config};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration; a missing API key stops us before binding
    Config::dotenv_load();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("FATAL: {}", e);
            std::process::exit(1);
        }
    };
    config.log_summary();

    let state = Arc::new(AppState::new(&config));
    let app = create_router(state);

    let socket_address = config.socket_address();
    tracing::info!("listening on {}", socket_address);
    let server = match axum::Server::try_bind(&socket_address) {
        Ok(builder) => builder.serve(app.into_make_service()),
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", socket_address, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = server.await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
