//! Reading evaluation: classify, persist, derive and persist alerts.
//!
//! The store handle is passed in explicitly; the pipeline holds no state.
//! The reading write and the alert write are two separate store calls. If
//! the second fails the reading stays persisted and the error goes back to
//! the caller.

use serde::Serialize;

use crate::alerts::derive_alerts;
use crate::error::StoreError;
use crate::models::{Alert, NewAlert, QualityState, RawReading, Reading};
use crate::store::Store;

// ---

/// Outcome of evaluating one reading.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub reading: Reading,
    pub alerts: Vec<Alert>,
}

impl Evaluation {
    pub fn state(&self) -> QualityState {
        self.reading.state
    }
}

/// Evaluate a reading against `store`.
///
/// Performs exactly one reading write and at most one alert-batch write.
pub async fn evaluate(store: &dyn Store, raw: RawReading) -> Result<Evaluation, StoreError> {
    // ---
    let new = raw.classified();
    let id = store.insert_reading(&new).await?;
    let reading = new.with_id(id);

    tracing::debug!(reading_id = id, state = %reading.state, "reading stored");

    let batch: Vec<NewAlert> = derive_alerts(&reading.measurements)
        .into_iter()
        .map(|candidate| candidate.for_reading(&reading))
        .collect();

    let alerts = if batch.is_empty() {
        Vec::new()
    } else {
        let alerts = store.insert_alerts(&batch).await?;
        tracing::info!(reading_id = id, count = alerts.len(), "alerts stored");
        alerts
    };

    Ok(Evaluation { reading, alerts })
}
