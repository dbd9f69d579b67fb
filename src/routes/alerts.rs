//! Alert listing endpoints.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use super::{ApiResult, HoursQuery};
use crate::models::{Alert, AlertCount};
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/alerts", get(list))
        .route("/api/alerts/count", get(count))
}

/// Alerts of the window, newest first.
async fn list(
    Query(params): Query<HoursQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Alert>>> {
    // ---
    let since = params.since()?;
    Ok(Json(state.store.query_alerts(since).await?))
}

async fn count(
    Query(params): Query<HoursQuery>,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<AlertCount>>> {
    // ---
    let since = params.since()?;
    Ok(Json(state.store.count_alerts_by_variable(since).await?))
}
