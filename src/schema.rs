//! Database schema management for `airquality-sensorflow`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs`.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the database schema (idempotent).
///
/// Creates the `readings` table and the `alerts` table, whose rows are
/// removed together with their reading. Safe to call on every startup.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            id          BIGSERIAL PRIMARY KEY,
            timestamp   TIMESTAMPTZ      NOT NULL,
            pm25        DOUBLE PRECISION NOT NULL,
            pm10        DOUBLE PRECISION NOT NULL,
            co2         DOUBLE PRECISION NOT NULL,
            tvoc        DOUBLE PRECISION NOT NULL,
            temperature DOUBLE PRECISION NOT NULL,
            humidity    DOUBLE PRECISION NOT NULL,
            state       TEXT             NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id          BIGSERIAL PRIMARY KEY,
            reading_id  BIGINT           NOT NULL REFERENCES readings (id) ON DELETE CASCADE,
            timestamp   TIMESTAMPTZ      NOT NULL,
            variable    TEXT             NOT NULL,
            value       DOUBLE PRECISION NOT NULL,
            threshold   DOUBLE PRECISION NOT NULL,
            message     TEXT             NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_timestamp
            ON readings (timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_alerts_timestamp
            ON alerts (timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_alerts_reading_id
            ON alerts (reading_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
