//! Shared application state handed to every axum handler.

use std::sync::{Arc, Mutex};

use crate::poller::PollerStatus;
use crate::simulator::Simulator;
use crate::store::Store;
use crate::transport::Transport;

// ---

/// Cheap to clone; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub simulator: Arc<Mutex<Simulator>>,
    /// `None` when no bot token is configured.
    pub telegram: Option<TelegramState>,
}

/// Handles the chat-bot endpoints need.
#[derive(Clone)]
pub struct TelegramState {
    pub transport: Arc<dyn Transport>,
    /// Destination of outbound reports.
    pub chat_id: i64,
    pub status: Arc<PollerStatus>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            simulator: Arc::new(Mutex::new(Simulator::new())),
            telegram: None,
        }
    }

    pub fn with_simulator(mut self, simulator: Simulator) -> Self {
        self.simulator = Arc::new(Mutex::new(simulator));
        self
    }

    pub fn with_telegram(mut self, telegram: TelegramState) -> Self {
        self.telegram = Some(telegram);
        self
    }
}
