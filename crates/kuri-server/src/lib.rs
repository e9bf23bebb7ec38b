//! Kuri - a Telegram bot that relays HTTP requests to chats by token.
//!
//! Users talk to the bot to get a private token. Anything that can make an
//! HTTP request can then post a message to that token and have it delivered
//! to the user's chat.

pub mod api;
pub mod bot;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod sender;

pub use config::Config;
pub use error::{ApiError, AppError, AppResult};
pub use sender::TelegramSender;

/// Name and version shown at the API root.
pub fn greeting() -> String {
    format!("Kuri {}", env!("CARGO_PKG_VERSION"))
}
