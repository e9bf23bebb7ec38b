//! Telegram Bot API client.

mod client;
mod error;
mod receiver;
mod types;

pub use client::{ClientOptions, TelegramClient, DEFAULT_API_URL};
pub use error::TelegramError;
pub use receiver::UpdateReceiver;
pub use types::*;
