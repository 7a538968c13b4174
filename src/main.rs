use edupoints_service::{api, blockchain::EduPointsClient, config::Config, db, logging, state::AppState};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    logging::init_logging("info", logging::LogFormat::from_str_lossy(&config.log_format));

    info!("Starting edupoints-service");
    info!("Configuration loaded: {:?}", config);

    let db_pool = db::connection::establish_connection(&config.database_url).await?;
    info!("Database connection established");

    let token_client = Arc::new(EduPointsClient::new(&config)?);
    if config.contract_address.is_none() {
        error!("CONTRACT_ADDRESS is not set; rewards will fail and be logged");
    }

    let addr = config.server_addr();
    let app_state = Arc::new(AppState::new(config, db_pool.clone(), token_client));
    let app = api::create_router(app_state);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
        signal_token.cancel();
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    db_pool.close().await;
    info!("Server stopped");
    Ok(())
}
