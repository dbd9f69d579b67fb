use axum::Router;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::AppState;

mod alerts;
mod error;
mod health;
mod readings;
mod simulator;
mod telegram;

pub use error::{ApiError, ApiResult};

// ---

/// All API routes. Cross-origin requests are allowed from any origin so a
/// browser dashboard served elsewhere can call the API.
pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(alerts::router())
        .merge(simulator::router())
        .merge(telegram::router())
        .merge(health::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `?hours=N` window shared by the listing endpoints.
#[derive(Debug, Deserialize)]
struct HoursQuery {
    hours: Option<i64>,
}

const DEFAULT_HOURS: i64 = 24;
const MAX_HOURS: i64 = 24 * 366;

impl HoursQuery {
    fn since(&self) -> ApiResult<DateTime<Utc>> {
        // ---
        let hours = self.hours.unwrap_or(DEFAULT_HOURS);
        if !(1..=MAX_HOURS).contains(&hours) {
            return Err(ApiError::BadRequest(format!(
                "hours must be between 1 and {MAX_HOURS}"
            )));
        }
        Ok(Utc::now() - Duration::hours(hours))
    }
}
