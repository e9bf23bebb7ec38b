//! Howto command - explains how scripts can reach the user.

use crate::commands::{CommandContext, CommandHandler};
use crate::error::AppResult;
use async_trait::async_trait;
use telegram_client::BotMessage;

pub struct HowtoHandler {
    api_base: String,
}

impl HowtoHandler {
    /// `api_base` is the public API root, ending with a slash.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }
}

#[async_trait]
impl CommandHandler for HowtoHandler {
    fn name(&self) -> &str {
        "howto"
    }

    fn description(&self) -> &str {
        "learn how to let Kuri send you messages"
    }

    async fn execute(&self, _message: &BotMessage, _ctx: &CommandContext<'_>) -> AppResult<String> {
        Ok(format!(
            "First, get your token by using `/register`.\n\
             Then, GET or POST on {}message with parameter `token` and `message`.\n\
             Finally, Kuri will repeat that message to you, via Telegram!",
            self.api_base
        ))
    }
}
