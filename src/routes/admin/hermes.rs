use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::hermes::{HermesConfig, HermesConfigPatch};
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/config",
            get(get_config).patch(patch_config).put(replace_config),
        )
        .route("/system-load", get(get_system_load).put(set_system_load))
        .route("/metrics", get(get_metrics).delete(reset_metrics))
}

async fn get_config(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.hermes().get_config().await))
}

async fn patch_config(
    State(state): State<AppState>,
    JsonBody(patch): JsonBody<HermesConfigPatch>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    if patch.is_empty() {
        return Err(AppError::bad_request(
            "EMPTY_PATCH",
            "At least one config field is required",
        ));
    }
    let updated = state.hermes().update_config(&patch).await?;
    tracing::info!(action = "patch_hermes_config", ?updated, "Admin patched Hermes config");
    Ok(ok(updated))
}

async fn replace_config(
    State(state): State<AppState>,
    JsonBody(cfg): JsonBody<HermesConfig>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    state.hermes().reload_config(cfg.clone()).await?;
    tracing::info!(action = "replace_hermes_config", ?cfg, "Admin replaced Hermes config");
    Ok(ok(cfg))
}

async fn get_system_load(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let load = state.hermes().system_load().await;
    Ok(ok(serde_json::json!({ "load": load.value() })))
}

#[derive(Debug, Deserialize)]
struct SystemLoadRequest {
    load: f64,
}

async fn set_system_load(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SystemLoadRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let applied = state.hermes().update_system_load(req.load).await?;
    tracing::info!(
        action = "set_system_load",
        requested = req.load,
        applied = applied.value(),
        "Admin set Hermes system load"
    );
    Ok(ok(serde_json::json!({ "load": applied.value() })))
}

async fn get_metrics(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.hermes().metrics_registry().snapshot()))
}

async fn reset_metrics(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    state.hermes().metrics_registry().reset();
    tracing::info!(action = "reset_hermes_metrics", "Admin reset Hermes metrics");
    Ok(ok(serde_json::json!({ "reset": true })))
}
