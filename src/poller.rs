//! Chat-channel ingestion loop.
//!
//! The poller runs as one background task: `Idle -> Polling -> Draining ->
//! Idle` until its [`CancellationToken`] fires, then `Stopped`.
//!
//! * The cursor is the next message id not yet observed. It is owned by the
//!   task, lives only in memory, and only ever moves forward. It is advanced
//!   past a message *before* the message is processed, so a message that
//!   fails to parse or store is never fetched again by this process. After a
//!   restart already-seen messages may be delivered again (at-least-once).
//! * A failure on one message never stops the loop. Transport failures flip
//!   the connectivity flag and the loop carries on at the next tick.
//! * Status is published through [`PollerStatus`] (atomics), so readers never
//!   block the loop and may see a slightly stale value.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{StoreError, TransportError};
use crate::parser::{self, ParseError};
use crate::pipeline::{self, Evaluation};
use crate::store::Store;
use crate::transport::{InboundMessage, Transport};

// ---

/// Read-only view of the poller, shared with status endpoints.
#[derive(Debug, Default)]
pub struct PollerStatus {
    connected: AtomicBool,
    processed: AtomicU64,
}

/// Point-in-time copy of [`PollerStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub connected: bool,
    pub processed_count: u64,
}

impl PollerStatus {
    // ---
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            connected: self.connected.load(Ordering::Relaxed),
            processed_count: self.processed.load(Ordering::Relaxed),
        }
    }

    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    fn record_processed(&self) -> u64 {
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Static settings of a poller.
#[derive(Debug, Clone)]
pub struct PollerSettings {
    /// Only messages from this chat are ingested.
    pub source_chat_id: i64,
    /// Text an ingestible message must contain.
    pub marker: String,
    /// Sleep between iterations.
    pub interval: Duration,
}

/// What happened to one inbound message.
#[derive(Debug)]
pub enum MessageOutcome {
    /// Id below the cursor; observed earlier in this process.
    AlreadySeen,
    /// No text, wrong chat, or no marker.
    Ignored,
    Unparseable(ParseError),
    Stored(Evaluation),
    StoreFailed(StoreError),
}

/// Result of one fetch-and-drain step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub fetched: usize,
    pub stored: usize,
}

pub struct Poller {
    transport: Arc<dyn Transport>,
    store: Arc<dyn Store>,
    settings: PollerSettings,
    cursor: Option<i64>,
    status: Arc<PollerStatus>,
}

impl Poller {
    // ---
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn Store>, settings: PollerSettings) -> Self {
        Self {
            transport,
            store,
            settings,
            cursor: None,
            status: Arc::new(PollerStatus::default()),
        }
    }

    /// Handle for status readers.
    pub fn status(&self) -> Arc<PollerStatus> {
        Arc::clone(&self.status)
    }

    /// Next message id the poller will ask for.
    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    /// Run until `cancel` fires.
    ///
    /// Cancellation is checked before each iteration, during the fetch and
    /// during the sleep; a batch that has been fetched is always drained.
    pub async fn run(mut self, cancel: CancellationToken) {
        // ---
        tracing::info!(
            chat_id = self.settings.source_chat_id,
            interval_secs = self.settings.interval.as_secs(),
            "Chat poller started"
        );

        while !cancel.is_cancelled() {
            let fetched = tokio::select! {
                _ = cancel.cancelled() => break,
                fetched = self.fetch() => fetched,
            };
            if let Err(e) = self.handle_fetch(fetched).await {
                tracing::error!(error = %e, cursor = ?self.cursor, "Chat poll failed");
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        tracing::info!(cursor = ?self.cursor, "Chat poller stopped");
    }

    /// One Polling + Draining step. A transport failure is returned to the
    /// caller, not logged.
    pub async fn poll_once(&mut self) -> Result<BatchSummary, TransportError> {
        // ---
        let fetched = self.fetch().await;
        self.handle_fetch(fetched).await
    }

    async fn fetch(&self) -> Result<Vec<InboundMessage>, TransportError> {
        self.transport.fetch_messages(self.cursor).await
    }

    async fn handle_fetch(
        &mut self,
        fetched: Result<Vec<InboundMessage>, TransportError>,
    ) -> Result<BatchSummary, TransportError> {
        // ---
        match fetched {
            Ok(batch) => {
                self.status.set_connected(true);
                Ok(self.drain(batch).await)
            }
            Err(e) => {
                self.status.set_connected(false);
                Err(e)
            }
        }
    }

    /// Process a batch in ascending id order.
    pub async fn drain(&mut self, mut batch: Vec<InboundMessage>) -> BatchSummary {
        // ---
        batch.sort_by_key(|m| m.id);
        let mut summary = BatchSummary {
            fetched: batch.len(),
            stored: 0,
        };

        for message in batch {
            let id = message.id;
            match self.process(message).await {
                MessageOutcome::Stored(eval) => {
                    summary.stored += 1;
                    let total = self.status.record_processed();
                    tracing::info!(
                        message_id = id,
                        reading_id = eval.reading.id,
                        state = %eval.state(),
                        alerts = eval.alerts.len(),
                        total,
                        "Chat reading stored"
                    );
                }
                MessageOutcome::StoreFailed(e) => {
                    tracing::error!(message_id = id, error = %e, "Failed to store chat reading");
                }
                MessageOutcome::Unparseable(e) => {
                    tracing::debug!(message_id = id, error = %e, "Skipping unparseable chat message");
                }
                MessageOutcome::Ignored | MessageOutcome::AlreadySeen => {
                    tracing::trace!(message_id = id, "Skipping chat message");
                }
            }
        }

        summary
    }

    /// Advance the cursor past `message`, then try to ingest it.
    async fn process(&mut self, message: InboundMessage) -> MessageOutcome {
        // ---
        if self.cursor.is_some_and(|cursor| message.id < cursor) {
            return MessageOutcome::AlreadySeen;
        }
        self.cursor = Some(message.id + 1);

        let Some(text) = message.text.as_deref() else {
            return MessageOutcome::Ignored;
        };
        if message.chat_id != Some(self.settings.source_chat_id) || !text.contains(&self.settings.marker) {
            return MessageOutcome::Ignored;
        }

        let raw = match parser::parse(text) {
            Ok(raw) => raw,
            Err(e) => return MessageOutcome::Unparseable(e),
        };

        match pipeline::evaluate(self.store.as_ref(), raw).await {
            Ok(eval) => MessageOutcome::Stored(eval),
            Err(e) => MessageOutcome::StoreFailed(e),
        }
    }
}
