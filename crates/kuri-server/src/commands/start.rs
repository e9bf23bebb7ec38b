//! Start command - greets the user and shows the command manual.

use crate::commands::{CommandContext, CommandHandler};
use crate::error::AppResult;
use async_trait::async_trait;
use telegram_client::BotMessage;

pub struct StartHandler;

impl StartHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StartHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandHandler for StartHandler {
    fn name(&self) -> &str {
        "start"
    }

    fn description(&self) -> &str {
        "show this help menu"
    }

    async fn execute(&self, _message: &BotMessage, ctx: &CommandContext<'_>) -> AppResult<String> {
        Ok(format!("Hello, this is Kuri!\n{}", ctx.manual))
    }
}
