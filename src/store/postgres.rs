//! PostgreSQL store over a `sqlx` pool.
//!
//! Tables are created by [`crate::schema::create_schema`]. Alerts reference
//! their reading with `ON DELETE CASCADE`, so deleting a reading is a single
//! statement here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::Store;
use crate::error::StoreError;
use crate::models::{Alert, AlertCount, Id, Measurements, NewAlert, NewReading, Reading};

// ---

const READING_COLUMNS: &str = "id, timestamp, pm25, pm10, co2, tvoc, temperature, humidity, state";

const ALERT_COLUMNS: &str = "id, reading_id, timestamp, variable, value, threshold, message";

#[derive(Debug, sqlx::FromRow)]
struct ReadingRow {
    id: i64,
    timestamp: DateTime<Utc>,
    pm25: f64,
    pm10: f64,
    co2: f64,
    tvoc: f64,
    temperature: f64,
    humidity: f64,
    state: String,
}

impl TryFrom<ReadingRow> for Reading {
    type Error = StoreError;

    fn try_from(row: ReadingRow) -> Result<Self, Self::Error> {
        let state = row.state.parse().map_err(StoreError::Corrupt)?;
        Ok(Reading {
            id: row.id,
            timestamp: row.timestamp,
            measurements: Measurements {
                pm25: row.pm25,
                pm10: row.pm10,
                co2: row.co2,
                tvoc: row.tvoc,
                temperature: row.temperature,
                humidity: row.humidity,
            },
            state,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AlertRow {
    id: i64,
    reading_id: i64,
    timestamp: DateTime<Utc>,
    variable: String,
    value: f64,
    threshold: f64,
    message: String,
}

impl From<AlertRow> for Alert {
    fn from(row: AlertRow) -> Self {
        Alert {
            id: row.id,
            reading_id: row.reading_id,
            timestamp: row.timestamp,
            variable: row.variable,
            value: row.value,
            threshold: row.threshold,
            message: row.message,
        }
    }
}

/// Store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_reading(&self, reading: &NewReading) -> Result<Id, StoreError> {
        // ---
        let m = &reading.measurements;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO readings (
                timestamp, pm25, pm10, co2, tvoc, temperature, humidity, state
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(reading.timestamp)
        .bind(m.pm25)
        .bind(m.pm10)
        .bind(m.co2)
        .bind(m.tvoc)
        .bind(m.temperature)
        .bind(m.humidity)
        .bind(reading.state.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn insert_alerts(&self, alerts: &[NewAlert]) -> Result<Vec<Alert>, StoreError> {
        // ---
        if alerts.is_empty() {
            return Ok(Vec::new());
        }

        // One multi-row INSERT so the batch is a single write.
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO alerts (reading_id, timestamp, variable, value, threshold, message) ",
        );
        builder.push_values(alerts, |mut row, alert| {
            row.push_bind(alert.reading_id)
                .push_bind(alert.timestamp)
                .push_bind(&alert.variable)
                .push_bind(alert.value)
                .push_bind(alert.threshold)
                .push_bind(&alert.message);
        });
        builder.push(" RETURNING ");
        builder.push(ALERT_COLUMNS);

        let rows = builder
            .build_query_as::<AlertRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    StoreError::Constraint(db.message().to_string())
                }
                other => StoreError::Database(other),
            })?;
        Ok(rows.into_iter().map(Alert::from).collect())
    }

    async fn query_readings(&self, since: DateTime<Utc>) -> Result<Vec<Reading>, StoreError> {
        // ---
        let query = format!(
            "SELECT {READING_COLUMNS} FROM readings WHERE timestamp >= $1 ORDER BY timestamp ASC, id ASC"
        );
        let rows: Vec<ReadingRow> = sqlx::query_as(&query)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Reading::try_from).collect()
    }

    async fn latest_reading(&self) -> Result<Option<Reading>, StoreError> {
        // ---
        let query = format!(
            "SELECT {READING_COLUMNS} FROM readings ORDER BY timestamp DESC, id DESC LIMIT 1"
        );
        let row: Option<ReadingRow> = sqlx::query_as(&query).fetch_optional(&self.pool).await?;

        row.map(Reading::try_from).transpose()
    }

    async fn query_alerts(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, StoreError> {
        // ---
        let query = format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE timestamp >= $1 ORDER BY timestamp DESC, id DESC"
        );
        let rows: Vec<AlertRow> = sqlx::query_as(&query)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Alert::from).collect())
    }

    async fn count_alerts_by_variable(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<AlertCount>, StoreError> {
        // ---
        let counts = sqlx::query_as::<_, AlertCount>(
            r#"
            SELECT variable, COUNT(*) AS total
            FROM alerts
            WHERE timestamp >= $1
            GROUP BY variable
            ORDER BY variable
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn delete_reading(&self, id: Id) -> Result<bool, StoreError> {
        // ---
        let result = sqlx::query("DELETE FROM readings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
