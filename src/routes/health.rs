use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub staging: ComponentHealth,
    pub remote: RemoteHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
}

#[derive(Serialize)]
pub struct RemoteHealth {
    /// "configured" or "fallback"
    pub mode: String,
    pub max_attempts: u32,
    pub interval_ms: u64,
}

/// GET /health: staging directory and remote conversion mode.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let staging_ok = state.staging.is_writable().await;
    let policy = state.cdr.policy();

    let status_code = if staging_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if staging_ok { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            staging: ComponentHealth {
                status: if staging_ok { "ok" } else { "error" }.to_string(),
            },
            remote: RemoteHealth {
                mode: if state.cdr.is_configured() {
                    "configured"
                } else {
                    "fallback"
                }
                .to_string(),
                max_attempts: policy.max_attempts,
                interval_ms: policy.interval.as_millis() as u64,
            },
        },
    };

    (status_code, Json(response))
}
