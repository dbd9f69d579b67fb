//! In-process store.
//!
//! No native cascade: deleting a reading removes its alerts first and then
//! the reading itself.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Store;
use crate::error::StoreError;
use crate::models::{Alert, AlertCount, Id, NewAlert, NewReading, Reading};

// ---

#[derive(Debug, Default)]
struct Tables {
    next_reading_id: Id,
    next_alert_id: Id,
    readings: Vec<Reading>,
    alerts: Vec<Alert>,
}

/// Store that keeps readings and alerts in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_reading(&self, reading: &NewReading) -> Result<Id, StoreError> {
        // ---
        let mut tables = self.tables()?;
        tables.next_reading_id += 1;
        let id = tables.next_reading_id;
        tables.readings.push(reading.clone().with_id(id));
        Ok(id)
    }

    async fn insert_alerts(&self, alerts: &[NewAlert]) -> Result<Vec<Alert>, StoreError> {
        // ---
        if alerts.is_empty() {
            return Ok(Vec::new());
        }

        let mut tables = self.tables()?;
        if let Some(orphan) = alerts
            .iter()
            .find(|a| !tables.readings.iter().any(|r| r.id == a.reading_id))
        {
            return Err(StoreError::Constraint(format!(
                "alert references unknown reading {}",
                orphan.reading_id
            )));
        }

        let mut stored = Vec::with_capacity(alerts.len());
        for alert in alerts {
            tables.next_alert_id += 1;
            stored.push(alert.clone().with_id(tables.next_alert_id));
        }
        tables.alerts.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn query_readings(&self, since: DateTime<Utc>) -> Result<Vec<Reading>, StoreError> {
        // ---
        let tables = self.tables()?;
        let mut readings: Vec<Reading> = tables
            .readings
            .iter()
            .filter(|r| r.timestamp >= since)
            .cloned()
            .collect();
        readings.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(readings)
    }

    async fn latest_reading(&self) -> Result<Option<Reading>, StoreError> {
        // ---
        let tables = self.tables()?;
        Ok(tables
            .readings
            .iter()
            .max_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn query_alerts(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, StoreError> {
        // ---
        let tables = self.tables()?;
        let mut alerts: Vec<Alert> = tables
            .alerts
            .iter()
            .filter(|a| a.timestamp >= since)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(alerts)
    }

    async fn count_alerts_by_variable(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<AlertCount>, StoreError> {
        // ---
        let tables = self.tables()?;
        let mut counts: Vec<AlertCount> = Vec::new();
        for alert in tables.alerts.iter().filter(|a| a.timestamp >= since) {
            match counts.iter_mut().find(|c| c.variable == alert.variable) {
                Some(count) => count.total += 1,
                None => counts.push(AlertCount {
                    variable: alert.variable.clone(),
                    total: 1,
                }),
            }
        }
        counts.sort_by(|a, b| a.variable.cmp(&b.variable));
        Ok(counts)
    }

    async fn delete_reading(&self, id: Id) -> Result<bool, StoreError> {
        // ---
        let mut tables = self.tables()?;
        if !tables.readings.iter().any(|r| r.id == id) {
            return Ok(false);
        }

        tables.alerts.retain(|a| a.reading_id != id);
        tables.readings.retain(|r| r.id != id);
        Ok(true)
    }
}
