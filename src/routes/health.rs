use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/metrics", get(metrics))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.hermes().snapshot().await;
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.uptime_secs(),
        "hermes": {
            "systemLoad": snapshot.system_load,
        }
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Ready once the engine holds a config that still validates.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.hermes().get_config().await.validate() {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "Hermes engine holds an invalid config");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "operations": state.hermes().metrics_registry().snapshot(),
    }))
}
