//! Token-addressed notification delivery.

use crate::error::TransportError;
use crate::registry::Registry;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// Outbound message transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Deliver `text` to `address`. No retries are expected of callers.
    async fn send(&self, address: &str, text: &str) -> Result<(), TransportError>;
}

/// Result of a notification that reached a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the transport successfully
    Sent,
    /// No user holds this token; the transport was not called
    UnknownToken,
}

impl Delivery {
    pub fn is_sent(self) -> bool {
        self == Delivery::Sent
    }
}

/// Resolves tokens and forwards messages to the transport.
#[derive(Clone)]
pub struct NotificationDispatcher {
    registry: Arc<Registry>,
    sender: Arc<dyn MessageSender>,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<Registry>, sender: Arc<dyn MessageSender>) -> Self {
        Self { registry, sender }
    }

    /// Send `message` to the user holding `token`.
    ///
    /// An unknown token is `Ok(Delivery::UnknownToken)`; only transport
    /// failures are errors.
    #[instrument(skip_all)]
    pub async fn notify(&self, token: &str, message: &str) -> Result<Delivery, TransportError> {
        let Some(user) = self.registry.get_by_token(token) else {
            info!("Invalid token");
            return Ok(Delivery::UnknownToken);
        };

        info!(
            user_id = %user.user_id,
            chat_id = %user.delivery_address,
            "Delivering message"
        );
        self.sender.send(&user.delivery_address, message).await?;
        Ok(Delivery::Sent)
    }
}
