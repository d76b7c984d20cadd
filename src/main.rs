use std::sync::Arc;

use order_dispatch::adapter::notify::LogNotifier;
use order_dispatch::adapter::payment::SandboxPaymentGateway;
use order_dispatch::api;
use order_dispatch::config::{Config, LogFormat};
use order_dispatch::error::AppError;
use order_dispatch::seed;
use order_dispatch::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Json => subscriber.json().init(),
    }

    let payments = Arc::new(SandboxPaymentGateway::new());
    let shared_state = Arc::new(AppState::new(
        config.clone(),
        payments.clone(),
        Arc::new(LogNotifier),
    ));

    if let Some(path) = &config.seed_file {
        let fixture = seed::load(path)?;
        seed::apply(&shared_state, &payments, fixture);
    }

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        center_matching = ?config.center_matching,
        "dispatch server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
