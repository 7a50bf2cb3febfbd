use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use camstat_server::config::ServerConfig;
use camstat_server::store::MemoryStore;
use camstat_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let path = config.data_path.clone();
    let store = match tokio::task::spawn_blocking(move || MemoryStore::from_csv_path(path)).await {
        Ok(Ok(store)) => store,
        Ok(Err(e)) => {
            error!(error = %e, "failed to load journeys");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!(error = %e, "journey loader panicked");
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(store, config.format, &config.cache);
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(addr = %config.addr, data = %config.data_path.display(), "camstat server listening");
    info!("endpoints: GET /health, GET /sites, POST /routes/search, POST /routes/journeys, POST /routes/stats");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
