//! Bot command handlers.

mod howto;
mod register;
mod start;

pub use howto::HowtoHandler;
pub use register::RegisterHandler;
pub use start::StartHandler;

use crate::error::AppResult;
use async_trait::async_trait;
use kuri_registry::{Registry, TokenIssuer};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use telegram_client::BotMessage;
use tracing::{debug, error};

/// Reply sent when a handler fails.
pub const FAILURE_REPLY: &str = "Sorry, something went wrong.";

/// Per-invocation data a handler may need from the table.
pub struct CommandContext<'a> {
    /// Generated usage manual for all registered commands
    pub manual: &'a str,
}

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name without the slash (e.g. "register").
    fn name(&self) -> &str;

    /// Completes the sentence "Type '/name' to ...".
    fn description(&self) -> &str;

    /// Only run for messages that have a sending user.
    fn user_only(&self) -> bool {
        true
    }

    /// Execute the command and produce the reply text.
    async fn execute(&self, message: &BotMessage, ctx: &CommandContext<'_>) -> AppResult<String>;
}

/// Command name to handler mapping, built once at startup.
#[derive(Default)]
pub struct CommandTable {
    handlers: Vec<Box<dyn CommandHandler>>,
    by_name: HashMap<String, usize>,
    manual: OnceLock<String>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler. A name that is already taken is rejected.
    pub fn register(&mut self, handler: Box<dyn CommandHandler>) -> bool {
        let name = handler.name().to_string();
        if self.by_name.contains_key(&name) {
            error!("Command `{}` has already been registered. Cannot register more than once.", name);
            return false;
        }

        self.by_name.insert(name.clone(), self.handlers.len());
        self.handlers.push(handler);
        self.manual = OnceLock::new();
        debug!("Registered command {}", name);
        true
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Usage manual, one line per command in registration order.
    pub fn manual(&self) -> &str {
        self.manual.get_or_init(|| {
            self.handlers
                .iter()
                .map(|h| format!("Type '/{}' to {}.\n", h.name(), h.description()))
                .collect()
        })
    }

    fn find(&self, name: &str) -> Option<&dyn CommandHandler> {
        self.by_name
            .get(name)
            .map(|&idx| self.handlers[idx].as_ref())
    }

    /// Run the command in `message`, if any, and return the reply.
    ///
    /// Messages that are not commands, unknown commands and user-only
    /// commands without a sender produce no reply.
    pub async fn respond(&self, message: &BotMessage) -> Option<String> {
        let name = message.command()?;
        let Some(handler) = self.find(name) else {
            debug!("Ignoring unknown command /{}", name);
            return None;
        };

        if handler.user_only() && message.user_id.is_none() {
            debug!("Ignoring /{} without a sending user", name);
            return None;
        }

        let ctx = CommandContext {
            manual: self.manual(),
        };
        match handler.execute(message, &ctx).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                error!("Command /{} failed: {}", name, e);
                Some(FAILURE_REPLY.to_string())
            }
        }
    }
}

/// Build the bot's command table.
pub fn build_command_table(
    registry: Arc<Registry>,
    issuer: Arc<TokenIssuer>,
    api_base: impl Into<String>,
) -> CommandTable {
    let mut table = CommandTable::new();
    table.register(Box::new(StartHandler::new()));
    table.register(Box::new(RegisterHandler::new(registry, issuer)));
    table.register(Box::new(HowtoHandler::new(api_base)));
    table
}
