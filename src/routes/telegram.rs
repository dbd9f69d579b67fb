//! Chat-bot endpoints: send simulated reports and read poller status.

use axum::{extract::State, routing::{get, post}, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::simulator::simulate;
use super::{ApiError, ApiResult};
use crate::models::{Measurements, QualityState};
use crate::report::{alert_report, reading_report};
use crate::simulator::Simulator;
use crate::state::TelegramState;
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/telegram/simulate", post(simulate_report))
        .route("/api/telegram/simulate-alert", post(simulate_alert))
        .route("/api/telegram/status", get(status))
}

fn telegram(state: &AppState) -> ApiResult<&TelegramState> {
    state.telegram.as_ref().ok_or(ApiError::ChatDisabled)
}

/// A simulated reading that was reported to the chat but not stored.
#[derive(Debug, Serialize)]
struct SentReport {
    message: &'static str,
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    measurements: Measurements,
    state: QualityState,
    alert_sent: bool,
}

async fn simulate_report(State(state): State<AppState>) -> ApiResult<Json<SentReport>> {
    // ---
    let tg = telegram(&state)?;
    let reading = simulate(&state, Simulator::reading)?.classified();

    tg.transport
        .send_text(tg.chat_id, &reading_report(&reading.measurements, reading.state))
        .await?;
    info!("POST /api/telegram/simulate - report sent ({})", reading.state);

    Ok(Json(SentReport {
        message: "Reading sent to chat",
        timestamp: reading.timestamp,
        measurements: reading.measurements,
        state: reading.state,
        alert_sent: false,
    }))
}

async fn simulate_alert(State(state): State<AppState>) -> ApiResult<Json<SentReport>> {
    // ---
    let tg = telegram(&state)?;
    let reading = simulate(&state, Simulator::alert_reading)?.classified();

    tg.transport
        .send_text(tg.chat_id, &reading_report(&reading.measurements, reading.state))
        .await?;

    let alert_sent = match alert_report(&reading.measurements) {
        Some(text) => {
            tg.transport.send_text(tg.chat_id, &text).await?;
            warn!("POST /api/telegram/simulate-alert - alert sent");
            true
        }
        None => false,
    };

    Ok(Json(SentReport {
        message: "Reading and alert sent to chat",
        timestamp: reading.timestamp,
        measurements: reading.measurements,
        state: reading.state,
        alert_sent,
    }))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    /// Outcome of the poller's last fetch.
    connected: bool,
    processed_count: u64,
    /// Outcome of a live round-trip made for this request.
    bot_reachable: bool,
}

async fn status(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    // ---
    let tg = telegram(&state)?;
    let snapshot = tg.status.snapshot();
    let bot_reachable = match tg.transport.check_connection().await {
        Ok(()) => true,
        Err(e) => {
            warn!("GET /api/telegram/status - bot unreachable: {}", e);
            false
        }
    };

    Ok(Json(StatusResponse {
        connected: snapshot.connected,
        processed_count: snapshot.processed_count,
        bot_reachable,
    }))
}
