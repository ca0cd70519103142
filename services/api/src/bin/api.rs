//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, IdentityToolkitVerifier, OpenAiCompletionAdapter},
    config::Config,
    error::ApiError,
    web::{build_router, AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long in-flight requests may take to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

#[derive(Parser, Debug)]
#[command(name = "api", about = "Training needs scoping backend")]
struct Cli {
    /// Project whose documents this instance serves.
    #[arg(long = "project-id")]
    project_id: String,
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded for project '{}'. Starting server...", cli.project_id);

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool, cli.project_id));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new()
        .with_api_key(&config.openai_api_key)
        .with_api_base(&config.openai_api_base);
    let completion_adapter = Arc::new(OpenAiCompletionAdapter::new(
        Client::with_config(openai_config),
        config.completion_model.clone(),
        config.completion_temperature,
    ));
    let token_verifier = Arc::new(IdentityToolkitVerifier::new(
        reqwest::Client::new(),
        config.identity_toolkit_url.clone(),
        config.firebase_api_key.clone(),
    ));

    // --- 4. Build the Shared AppState & Start Completion Workers ---
    let shutdown = CancellationToken::new();
    let (app_state, workers) = AppState::new(
        db_adapter,
        completion_adapter,
        token_verifier,
        config.workers.clone(),
        shutdown.clone(),
    );
    let app = build_router(Arc::new(app_state));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
    });

    // --- 6. Wait for a Shutdown Signal & Drain ---
    let finished = tokio::select! {
        joined = &mut server => Some(joined),
        _ = shutdown_signal() => None,
    };
    shutdown.cancel();

    let joined = match finished {
        Some(joined) => joined,
        None => {
            info!("Shutdown signal received; draining in-flight requests...");
            match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("Requests still running after {:?}; exiting anyway.", SHUTDOWN_GRACE);
                    return Ok(());
                }
            }
        }
    };
    joined.map_err(|e| ApiError::Internal(e.to_string()))??;

    for worker in workers {
        if let Err(e) = worker.await {
            error!("Completion worker ended abnormally: {}", e);
        }
    }
    info!("Server stopped.");
    Ok(())
}

/// Resolves on Ctrl+C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
