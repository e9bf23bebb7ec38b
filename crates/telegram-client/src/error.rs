//! Telegram client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error ({code:?}): {description}")]
    Api {
        code: Option<i32>,
        description: String,
    },

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs embed the bot token
        TelegramError::Http(e.without_url())
    }
}
