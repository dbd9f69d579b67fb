//! Simulated readings pushed through the normal evaluation pipeline.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiError, ApiResult};
use crate::models::RawReading;
use crate::pipeline::{self, Evaluation};
use crate::simulator::Simulator;
use crate::AppState;

// ---

const DEFAULT_HISTORY: usize = 288;
const MAX_HISTORY: usize = 10_000;
const HISTORY_SPACING_MINUTES: i64 = 5;

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/simulator/generate", post(generate))
        .route("/api/simulator/alert", post(generate_alert))
        .route("/api/simulator/history", post(history))
}

/// Run `f` on the shared simulator. The lock is released before returning.
pub(super) fn simulate<T>(state: &AppState, f: impl FnOnce(&mut Simulator) -> T) -> ApiResult<T> {
    let mut sim = state
        .simulator
        .lock()
        .map_err(|_| ApiError::Internal("simulator lock poisoned".to_string()))?;
    Ok(f(&mut sim))
}

async fn generate(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<Evaluation>)> {
    // ---
    let raw = simulate(&state, Simulator::reading)?;
    let eval = pipeline::evaluate(state.store.as_ref(), raw).await?;
    Ok((StatusCode::CREATED, Json(eval)))
}

async fn generate_alert(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<Evaluation>)> {
    // ---
    let raw = simulate(&state, Simulator::alert_reading)?;
    let eval = pipeline::evaluate(state.store.as_ref(), raw).await?;
    Ok((StatusCode::CREATED, Json(eval)))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    count: Option<usize>,
}

#[derive(Debug, Serialize)]
struct HistorySummary {
    readings: usize,
    alerts: usize,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

async fn history(
    Query(params): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<HistorySummary>)> {
    // ---
    let count = params.count.unwrap_or(DEFAULT_HISTORY);
    if !(1..=MAX_HISTORY).contains(&count) {
        return Err(ApiError::BadRequest(format!(
            "count must be between 1 and {MAX_HISTORY}"
        )));
    }

    let batch: Vec<RawReading> = simulate(&state, |sim| {
        sim.history(count, Duration::minutes(HISTORY_SPACING_MINUTES))
    })?;

    let mut readings = 0;
    let mut alerts = 0;
    let mut from = None;
    let mut to = None;
    for raw in batch {
        let eval = pipeline::evaluate(state.store.as_ref(), raw).await?;
        readings += 1;
        alerts += eval.alerts.len();
        from.get_or_insert(eval.reading.timestamp);
        to = Some(eval.reading.timestamp);
    }

    let (Some(from), Some(to)) = (from, to) else {
        return Err(ApiError::Internal("simulator produced no readings".to_string()));
    };

    info!("POST /api/simulator/history - {} readings, {} alerts", readings, alerts);
    Ok((
        StatusCode::CREATED,
        Json(HistorySummary {
            readings,
            alerts,
            from,
            to,
        }),
    ))
}
