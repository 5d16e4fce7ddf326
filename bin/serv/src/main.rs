use std::net::SocketAddr;

use anyhow::Context;
use axum::{Router, routing::get};
use ivs_api::{ApiConfig, ApiState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    ivs_api::tracing::init_tracing(&config.env);

    if let Err(e) = run(config).await {
        tracing::error!("Server failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run(config: ApiConfig) -> anyhow::Result<()> {
    let metrics_handle = ivs_api::metrics::init_metrics()?;
    tracing::info!("Prometheus metrics exporter initialized");

    let pool = ivs_db::create_pool(&config.database_url, config.db_max_connections).await?;
    ivs_db::run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let state = ApiState::new(&config, pool).await?;

    let _job_handles = ivs_api::jobs::start_background_jobs(state.pool.clone());
    tracing::info!("Background jobs started (token cleanup, mock interview expiry)");

    let metrics_app = Router::new()
        .route("/metrics", get(ivs_api::metrics::metrics_handler))
        .with_state(metrics_handle);

    let app =
        ivs_api::router::router(state, &config.parsed_allowed_origins()).merge(metrics_app);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, env = ?config.env, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
