//! Error types shared across the pipeline, the store and the transport.

use thiserror::Error;

/// Failures of the durable store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored value is invalid: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A write referenced a row that does not exist.
    #[error("constraint violated: {0}")]
    Constraint(String),
}

/// Failures talking to the chat-bot transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request URLs carry the bot token, so the URL is dropped on conversion.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("bot API rejected {method}: {description}")]
    Api {
        method: &'static str,
        description: String,
    },

    #[error("bot API returned no result for {0}")]
    EmptyResult(&'static str),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Http(e.without_url())
    }
}
