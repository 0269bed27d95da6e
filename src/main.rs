use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cdr_outline_gateway::app_state::AppState;
use cdr_outline_gateway::config::AppConfig;
use cdr_outline_gateway::routes;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing conversion gateway");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!(
        "conversions_total",
        "Conversion requests by route and outcome"
    );
    metrics::describe_histogram!(
        "conversion_duration_seconds",
        "Time from upload to response headers"
    );
    metrics::describe_counter!(
        "remote_poll_attempts_total",
        "Job status queries sent to the remote conversion service"
    );
    metrics::describe_counter!(
        "staging_cleanup_failures_total",
        "Staged files that could not be deleted"
    );

    let state = AppState::from_config(&config).expect("Failed to initialize services");

    tracing::info!(
        staging_dir = %config.staging_dir.display(),
        ghostscript = %state.outliner.binary(),
        remote_mode = if state.cdr.is_configured() { "configured" } else { "fallback" },
        "Services ready"
    );

    let app = routes::api_router(state, config.max_upload_bytes).route(
        "/metrics",
        get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
    );

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Local API available at http://{}", bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
