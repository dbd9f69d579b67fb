//! Durable store capability.
//!
//! The pipeline and the HTTP handlers only see [`Store`]. [`PgStore`] is the
//! production backend; [`MemoryStore`] keeps everything in process.
//!
//! The store is the only arbiter of write ordering and identity; no
//! transaction spans a reading write and its alert batch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{Alert, AlertCount, Id, NewAlert, NewReading, Reading};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// ---

#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a classified reading and return its identity.
    async fn insert_reading(&self, reading: &NewReading) -> Result<Id, StoreError>;

    /// Persist a batch of alerts. An empty batch performs no write.
    async fn insert_alerts(&self, alerts: &[NewAlert]) -> Result<Vec<Alert>, StoreError>;

    /// Readings taken at or after `since`, oldest first.
    async fn query_readings(&self, since: DateTime<Utc>) -> Result<Vec<Reading>, StoreError>;

    /// The most recent reading by timestamp.
    async fn latest_reading(&self) -> Result<Option<Reading>, StoreError>;

    /// Alerts raised at or after `since`, newest first.
    async fn query_alerts(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, StoreError>;

    async fn count_alerts_by_variable(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<AlertCount>, StoreError>;

    /// Delete a reading together with its alerts. Returns `false` if no
    /// such reading exists.
    async fn delete_reading(&self, id: Id) -> Result<bool, StoreError>;
}
