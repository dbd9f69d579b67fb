//! Shared fakes for the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use airquality_sensorflow::models::{Alert, AlertCount, Id, NewAlert, NewReading, Reading};
use airquality_sensorflow::report::reading_report;
use airquality_sensorflow::store::{MemoryStore, Store};
use airquality_sensorflow::transport::{InboundMessage, Transport};
use airquality_sensorflow::{Measurements, QualityState, StoreError, TransportError};

pub const SOURCE_CHAT: i64 = -1001;
pub const OTHER_CHAT: i64 = 555;

/// Transport that replays scripted fetch results and records what it sees.
///
/// Once the script is exhausted every fetch returns an empty batch.
#[derive(Default)]
pub struct FakeTransport {
    script: Mutex<VecDeque<Result<Vec<InboundMessage>, TransportError>>>,
    pub offsets: Mutex<Vec<Option<i64>>>,
    pub sent: Mutex<Vec<(i64, String)>>,
    pub fail_checks: bool,
}

impl FakeTransport {
    pub fn scripted(script: Vec<Result<Vec<InboundMessage>, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    /// Transport whose connection check always fails.
    pub fn unreachable_bot() -> Self {
        Self {
            fail_checks: true,
            ..Default::default()
        }
    }

    pub fn offsets(&self) -> Vec<Option<i64>> {
        match self.offsets.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => Vec::new(),
        }
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch_messages(&self, offset: Option<i64>) -> Result<Vec<InboundMessage>, TransportError> {
        if let Ok(mut offsets) = self.offsets.lock() {
            offsets.push(offset);
        }
        let next = match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(_) => None,
        };
        next.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((chat_id, text.to_string()));
        }
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), TransportError> {
        if self.fail_checks {
            return Err(transport_down());
        }
        Ok(())
    }
}

pub fn transport_down() -> TransportError {
    TransportError::Api {
        method: "getUpdates",
        description: "Bad Gateway".to_string(),
    }
}

/// Store that fails the first `failures` reading writes, then behaves like
/// [`MemoryStore`].
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failures: usize,
    attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn failing_first(failures: usize) -> Self {
        Self {
            failures,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn insert_reading(&self, reading: &NewReading) -> Result<Id, StoreError> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.insert_reading(reading).await
    }

    async fn insert_alerts(&self, alerts: &[NewAlert]) -> Result<Vec<Alert>, StoreError> {
        self.inner.insert_alerts(alerts).await
    }

    async fn query_readings(&self, since: DateTime<Utc>) -> Result<Vec<Reading>, StoreError> {
        self.inner.query_readings(since).await
    }

    async fn latest_reading(&self) -> Result<Option<Reading>, StoreError> {
        self.inner.latest_reading().await
    }

    async fn query_alerts(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, StoreError> {
        self.inner.query_alerts(since).await
    }

    async fn count_alerts_by_variable(&self, since: DateTime<Utc>) -> Result<Vec<AlertCount>, StoreError> {
        self.inner.count_alerts_by_variable(since).await
    }

    async fn delete_reading(&self, id: Id) -> Result<bool, StoreError> {
        self.inner.delete_reading(id).await
    }
}

pub fn measurements(pm25: f64, co2: f64) -> Measurements {
    Measurements {
        pm25,
        pm10: 20.0,
        co2,
        tvoc: 85.0,
        temperature: 25.3,
        humidity: 48.0,
    }
}

/// A well-formed report from the source chat.
pub fn report(id: i64, m: &Measurements) -> InboundMessage {
    InboundMessage {
        id,
        chat_id: Some(SOURCE_CHAT),
        text: Some(reading_report(m, QualityState::Good)),
    }
}

pub fn message(id: i64, chat_id: i64, text: &str) -> InboundMessage {
    InboundMessage {
        id,
        chat_id: Some(chat_id),
        text: Some(text.to_string()),
    }
}

pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(0, 0).unwrap_or_default()
}
