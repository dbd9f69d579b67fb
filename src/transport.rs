//! Chat-bot transport.
//!
//! [`Transport`] is what the poller and the HTTP handlers consume.
//! [`TelegramTransport`] implements it against the Telegram Bot HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

// ---

/// One inbound update from the chat channel.
///
/// `chat_id` and `text` are absent for updates that carry no text message;
/// the poller still has to see them so its cursor moves past.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: i64,
    pub chat_id: Option<i64>,
    pub text: Option<String>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch messages with `id >= offset` (all pending when `None`).
    ///
    /// May block server-side for a short, bounded time.
    async fn fetch_messages(&self, offset: Option<i64>) -> Result<Vec<InboundMessage>, TransportError>;

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    /// Cheap round-trip to verify the credentials and connectivity.
    async fn check_connection(&self) -> Result<(), TransportError>;
}

// ---

/// Extra time on top of the long-poll wait before the HTTP call gives up.
const CLIENT_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Serialize)]
struct GetUpdates<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

impl From<Update> for InboundMessage {
    fn from(update: Update) -> Self {
        let (chat_id, text) = match update.message {
            Some(message) => (Some(message.chat.id), message.text),
            None => (None, None),
        };
        InboundMessage {
            id: update.update_id,
            chat_id,
            text,
        }
    }
}

/// Telegram Bot API client.
#[derive(Debug, Clone)]
pub struct TelegramTransport {
    client: reqwest::Client,
    base_url: String,
    long_poll: Duration,
}

impl TelegramTransport {
    // ---
    pub fn new(api_url: &str, token: &str, long_poll: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(long_poll + CLIENT_TIMEOUT_MARGIN)
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            long_poll,
        })
    }

    async fn call<B, T>(&self, method: &'static str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized + Sync,
        T: for<'de> Deserialize<'de>,
    {
        // ---
        let url = format!("{}/{}", self.base_url, method);
        let response: ApiResponse<T> = self.client.post(&url).json(body).send().await?.json().await?;

        if !response.ok {
            return Err(TransportError::Api {
                method,
                description: response.description.unwrap_or_else(|| "no description".into()),
            });
        }
        response.result.ok_or(TransportError::EmptyResult(method))
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn fetch_messages(&self, offset: Option<i64>) -> Result<Vec<InboundMessage>, TransportError> {
        // ---
        let request = GetUpdates {
            offset,
            timeout: self.long_poll.as_secs(),
            allowed_updates: &["message"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &request).await?;

        tracing::trace!(count = updates.len(), ?offset, "getUpdates returned");
        Ok(updates.into_iter().map(InboundMessage::from).collect())
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        // ---
        let request = SendMessage { chat_id, text };
        let _sent: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), TransportError> {
        // ---
        let _me: serde_json::Value = self.call("getMe", &serde_json::json!({})).await?;
        Ok(())
    }
}
