use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_BATCH_SIZE, MAX_PROFILE_ID_LEN};
use crate::extractors::{JsonBody, QueryParams};
use crate::response::{hermes_error_code, ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/score", post(score))
        .route("/batch", post(batch_score))
        .route("/time-impact", get(time_impact))
        .route("/report", post(report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreRequest {
    profile_id: Option<String>,
    initial_visibility: f64,
    elapsed_hours: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResponse {
    profile_id: Option<String>,
    score: f64,
    decay_constant: f64,
}

fn check_profile_id(profile_id: Option<&str>) -> Result<(), AppError> {
    match profile_id {
        Some(id) if id.trim().is_empty() || id.len() > MAX_PROFILE_ID_LEN => {
            Err(AppError::bad_request(
                "INVALID_PROFILE_ID",
                &format!("profileId must be 1-{MAX_PROFILE_ID_LEN} characters"),
            ))
        }
        _ => Ok(()),
    }
}

async fn score(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ScoreRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    check_profile_id(req.profile_id.as_deref())?;
    let scored = state
        .hermes()
        .calculate_visibility_score(req.initial_visibility, req.elapsed_hours)
        .await?;
    Ok(ok(ScoreResponse {
        profile_id: req.profile_id,
        score: scored.score,
        decay_constant: scored.decay_constant,
    }))
}

#[derive(Debug, Deserialize)]
struct BatchScoreRequest {
    items: Vec<ScoreRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchItemError {
    code: String,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchItemResult {
    profile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    decay_constant: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<BatchItemError>,
}

impl BatchItemResult {
    fn failed(profile_id: Option<String>, code: String, message: String) -> Self {
        Self {
            profile_id,
            score: None,
            decay_constant: None,
            error: Some(BatchItemError { code, message }),
        }
    }
}

async fn batch_score(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BatchScoreRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    if req.items.len() > MAX_BATCH_SIZE {
        return Err(AppError::payload_too_large(&format!(
            "Batch may contain at most {MAX_BATCH_SIZE} items"
        )));
    }

    // Items with a bad profile id are reported in place and never scored.
    let checks: Vec<Result<(), AppError>> = req
        .items
        .iter()
        .map(|item| check_profile_id(item.profile_id.as_deref()))
        .collect();
    let pairs: Vec<(f64, f64)> = req
        .items
        .iter()
        .zip(&checks)
        .filter(|(_, check)| check.is_ok())
        .map(|(item, _)| (item.initial_visibility, item.elapsed_hours))
        .collect();
    let mut scored = state
        .hermes()
        .calculate_visibility_scores(&pairs)
        .await
        .into_iter();

    let mut failed = 0usize;
    let mut results = Vec::with_capacity(req.items.len());
    for (item, check) in req.items.into_iter().zip(checks) {
        let result = match check {
            Err(e) => BatchItemResult::failed(item.profile_id, e.code, e.message),
            Ok(()) => match scored.next() {
                Some(Ok(s)) => BatchItemResult {
                    profile_id: item.profile_id,
                    score: Some(s.score),
                    decay_constant: Some(s.decay_constant),
                    error: None,
                },
                Some(Err(e)) => BatchItemResult::failed(
                    item.profile_id,
                    hermes_error_code(&e).to_string(),
                    e.to_string(),
                ),
                None => {
                    return Err(AppError::internal("Batch scoring returned fewer results than items"))
                }
            },
        };
        if result.error.is_some() {
            failed += 1;
        }
        results.push(result);
    }

    tracing::debug!(total = results.len(), failed, "Batch visibility scoring");

    Ok(ok(serde_json::json!({
        "results": results,
        "failed": failed,
    })))
}

#[derive(Debug, Deserialize)]
struct TimeImpactQuery {
    hour: Option<f64>,
}

async fn time_impact(
    State(state): State<AppState>,
    QueryParams(q): QueryParams<TimeImpactQuery>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let impact = state.hermes().calculate_time_impact(q.hour).await?;
    Ok(ok(impact))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRequest {
    profile_id: Option<String>,
    initial_visibility: f64,
    elapsed_hours: f64,
    hour: Option<f64>,
}

async fn report(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ReportRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    check_profile_id(req.profile_id.as_deref())?;
    let report = state
        .hermes()
        .visibility_report(
            req.profile_id,
            req.initial_visibility,
            req.elapsed_hours,
            req.hour,
        )
        .await?;
    Ok(ok(report))
}
