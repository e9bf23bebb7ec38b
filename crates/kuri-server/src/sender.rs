//! Telegram-backed message transport.

use async_trait::async_trait;
use kuri_registry::{MessageSender, TransportError};
use telegram_client::TelegramClient;

/// Delivers notifications through the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramSender {
    client: TelegramClient,
}

impl TelegramSender {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send(&self, address: &str, text: &str) -> Result<(), TransportError> {
        self.client
            .send_message(address, text)
            .await
            .map_err(|e| TransportError::new(e.to_string()))
    }
}
