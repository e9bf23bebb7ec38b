//! Register command - hands out the user's private token.

use crate::commands::{CommandContext, CommandHandler};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use kuri_registry::{Registry, RegistryError, TokenIssuer, UserRecord};
use std::sync::Arc;
use telegram_client::BotMessage;
use tracing::{debug, info};

pub struct RegisterHandler {
    registry: Arc<Registry>,
    issuer: Arc<TokenIssuer>,
}

impl RegisterHandler {
    pub fn new(registry: Arc<Registry>, issuer: Arc<TokenIssuer>) -> Self {
        Self { registry, issuer }
    }

    /// Return the user's record, creating it on first registration.
    ///
    /// A registered user keeps their original token and chat. If a
    /// concurrent registration for the same user wins the race, its record
    /// is returned.
    pub fn register_user(&self, user_id: &str, delivery_address: &str) -> AppResult<UserRecord> {
        if let Some(record) = self.registry.get_by_user(user_id) {
            debug!(user_id = %user_id, "User has already registered");
            return Ok(record);
        }

        let token = self.issuer.generate_unused_token();
        match self.registry.register(user_id, &token, delivery_address) {
            Ok(record) => {
                info!(user_id = %user_id, chat_id = %delivery_address, "Registered user");
                Ok(record)
            }
            Err(RegistryError::DuplicateUser(_)) => self
                .registry
                .get_by_user(user_id)
                .ok_or_else(|| RegistryError::DuplicateUser(user_id.to_string()).into()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CommandHandler for RegisterHandler {
    fn name(&self) -> &str {
        "register"
    }

    fn description(&self) -> &str {
        "get your private token"
    }

    async fn execute(&self, message: &BotMessage, _ctx: &CommandContext<'_>) -> AppResult<String> {
        let user_id = message.user_id.ok_or(AppError::NoSender)?;
        debug!(user_id, "User wants to register");

        let record = self.register_user(&user_id.to_string(), &message.reply_target())?;
        Ok(format!(
            "Your token: {}\nTreat this as a password!",
            record.token
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuri_registry::TokenCodec;
    use std::collections::HashSet;

    fn handler() -> (RegisterHandler, Arc<Registry>) {
        let registry = Arc::new(Registry::new());
        let issuer = Arc::new(TokenIssuer::new(&registry, TokenCodec::default()));
        (RegisterHandler::new(registry.clone(), issuer), registry)
    }

    fn message(user_id: i64, chat_id: i64) -> BotMessage {
        BotMessage {
            user_id: Some(user_id),
            username: None,
            chat_id,
            text: "/register".into(),
            date: 0,
        }
    }

    async fn run(handler: &RegisterHandler, msg: &BotMessage) -> String {
        handler
            .execute(msg, &CommandContext { manual: "" })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_registration_issues_token() {
        let (handler, registry) = handler();

        let reply = run(&handler, &message(42, 700)).await;

        let record = registry.get_by_user("42").unwrap();
        assert_eq!(record.delivery_address, "700");
        assert_eq!(
            reply,
            format!("Your token: {}\nTreat this as a password!", record.token)
        );
        assert!(registry.is_dirty());
    }

    #[tokio::test]
    async fn test_repeat_registration_returns_same_token() {
        let (handler, registry) = handler();

        let first = run(&handler, &message(42, 700)).await;
        let second = run(&handler, &message(42, 999)).await;

        assert_eq!(first, second);
        assert_eq!(registry.count(), 1);
        // The original chat stays the delivery address
        assert_eq!(registry.get_by_user("42").unwrap().delivery_address, "700");
    }

    #[tokio::test]
    async fn test_missing_sender_is_an_error() {
        let (handler, _) = handler();
        let mut msg = message(42, 700);
        msg.user_id = None;

        let result = handler
            .execute(&msg, &CommandContext { manual: "" })
            .await;
        assert!(matches!(result, Err(AppError::NoSender)));
    }

    #[test]
    fn test_concurrent_same_user_gets_one_token() {
        let (handler, registry) = handler();
        let handler = Arc::new(handler);

        let tokens: HashSet<String> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    let handler = handler.clone();
                    s.spawn(move || handler.register_user("42", "700").unwrap().token)
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(tokens.len(), 1);
        assert_eq!(registry.count(), 1);
    }
}
