//! Air-quality backend: classifies sensor readings, derives and stores
//! threshold alerts, and mirrors readings through a chat bot that doubles as
//! a best-effort ingestion source.
//!
//! Data flow of the ingestion path:
//! `chat text -> parser -> pipeline -> store`, driven by [`poller::Poller`].

pub mod alerts;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod poller;
pub mod quality;
pub mod report;
pub mod routes;
pub mod schema;
pub mod simulator;
pub mod state;
pub mod store;
pub mod transport;

pub use config::Config;
pub use error::{StoreError, TransportError};
pub use models::{Alert, Measurements, QualityState, RawReading, Reading};
pub use state::{AppState, TelegramState};
