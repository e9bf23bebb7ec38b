//! Kuri registry - the token registry behind the notification relay.
//!
//! Maps platform users to secret tokens and delivery addresses:
//! - Issues tokens that are unique across every stored and issued value
//! - Keeps a dual user/token index consistent under concurrent access
//! - Flushes to durable storage in the background, only when dirty
//! - Resolves a token to its delivery address and hands the message to a transport

pub mod codec;
pub mod dispatch;
pub mod error;
pub mod issuer;
pub mod persistence;
pub mod record;
pub mod registry;
pub mod storage;

pub use codec::TokenCodec;
pub use dispatch::{Delivery, MessageSender, NotificationDispatcher};
pub use error::{RegistryError, RegistryResult, TransportError};
pub use issuer::TokenIssuer;
pub use persistence::{spawn_persistence, FlushOutcome, PersistenceHandle, PersistenceLoop};
pub use record::UserRecord;
pub use registry::Registry;
pub use storage::{JsonFileStore, MemoryStore, Storage, Store};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(&self, address: &str, text: &str) -> Result<(), TransportError> {
            self.sent
                .lock()
                .unwrap()
                .push((address.to_string(), text.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_register_then_notify_scenario() {
        tokio_test::block_on(async {
            let registry = Arc::new(Registry::new());
            let issuer = TokenIssuer::new(&registry, TokenCodec::default());
            let sender = Arc::new(RecordingSender::default());
            let dispatcher = NotificationDispatcher::new(registry.clone(), sender.clone());

            let issued = issuer.generate_unused_token();
            registry.register("42", &issued, "chat-7").unwrap();

            assert!(registry.is_registered(Some("42"), None).unwrap());
            let record = registry.resolve(None, Some(&issued)).unwrap().unwrap();
            assert_eq!(record.delivery_address, "chat-7");

            assert_eq!(dispatcher.notify(&issued, "hi").await.unwrap(), Delivery::Sent);
            assert_eq!(
                dispatcher.notify("bad-token", "hi").await.unwrap(),
                Delivery::UnknownToken
            );

            let sent = sender.sent.lock().unwrap();
            assert_eq!(sent.as_slice(), &[("chat-7".to_string(), "hi".to_string())]);
        });
    }

    #[tokio::test]
    async fn test_dirty_flag_across_persistence_ticks() {
        let registry = Arc::new(Registry::new());
        registry.register("42", "tok", "chat-7").unwrap();
        assert!(registry.is_dirty());

        let healthy = PersistenceLoop::new(
            registry.clone(),
            Arc::new(MemoryStore::new()),
            Duration::from_secs(10),
        );
        healthy.tick().await;
        assert!(!registry.is_dirty());

        registry.register("43", "tok-2", "chat-8").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let failing = PersistenceLoop::new(
            registry.clone(),
            Arc::new(JsonFileStore::new(blocker.join("users.json"))),
            Duration::from_secs(10),
        );

        assert_eq!(failing.tick().await, FlushOutcome::Failed);
        assert!(registry.is_dirty());
    }
}
