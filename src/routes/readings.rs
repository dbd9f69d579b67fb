//! Reading endpoints: submit for evaluation, list, latest, delete.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use tracing::info;

use super::{ApiError, ApiResult, HoursQuery};
use crate::models::{Id, RawReading, Reading};
use crate::{pipeline, AppState};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/readings", get(list).post(create))
        .route("/api/readings/latest", get(latest))
        .route("/api/readings/{id}", delete(remove))
}

async fn latest(State(state): State<AppState>) -> ApiResult<Json<Reading>> {
    // ---
    state
        .store
        .latest_reading()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No readings recorded".to_string()))
}

async fn list(
    Query(params): Query<HoursQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Reading>>> {
    // ---
    let since = params.since()?;
    let readings = state.store.query_readings(since).await?;
    Ok(Json(readings))
}

async fn create(
    State(state): State<AppState>,
    Json(raw): Json<RawReading>,
) -> ApiResult<impl IntoResponse> {
    // ---
    let eval = pipeline::evaluate(state.store.as_ref(), raw).await?;
    info!(
        "POST /api/readings - reading {} stored as {} with {} alerts",
        eval.reading.id,
        eval.state(),
        eval.alerts.len()
    );
    Ok((StatusCode::CREATED, Json(eval)))
}

async fn remove(Path(id): Path<Id>, State(state): State<AppState>) -> ApiResult<StatusCode> {
    // ---
    if state.store.delete_reading(id).await? {
        info!("DELETE /api/readings/{} - removed with its alerts", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Reading {id} not found")))
    }
}
