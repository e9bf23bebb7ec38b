//! Telegram Bot API types.

use serde::{Deserialize, Serialize};

/// Envelope around every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i32>,
}

/// Telegram user or bot.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub date: i64,
    pub text: Option<String>,
}

/// One entry from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// `getUpdates` request body.
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Long polling timeout in seconds
    pub timeout: u64,
    pub allowed_updates: Vec<String>,
}

/// `sendMessage` request body.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    /// Numeric chat id or `@channelusername`
    pub chat_id: String,
    pub text: String,
}

/// Parsed message for bot processing.
#[derive(Debug, Clone)]
pub struct BotMessage {
    /// Sender's user id; absent for channel posts.
    pub user_id: Option<i64>,
    /// Sender's username, if any.
    pub username: Option<String>,
    /// Chat the message arrived in.
    pub chat_id: i64,
    /// The message text.
    pub text: String,
    /// Unix timestamp.
    pub date: i64,
}

impl BotMessage {
    /// Extract a bot message from an update. Non-text updates yield `None`.
    pub fn from_update(update: &Update) -> Option<Self> {
        let message = update.message.as_ref()?;
        let text = message.text.clone()?;

        Some(Self {
            user_id: message.from.as_ref().map(|u| u.id),
            username: message.from.as_ref().and_then(|u| u.username.clone()),
            chat_id: message.chat.id,
            text,
            date: message.date,
        })
    }

    /// Command name without the leading `/` or a trailing `@botname`.
    ///
    /// `"/register@kuri_bot now"` yields `Some("register")`.
    pub fn command(&self) -> Option<&str> {
        let first = self.text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        (!name.is_empty()).then_some(name)
    }

    /// Text after the command word, trimmed.
    pub fn arguments(&self) -> &str {
        let text = self.text.trim_start();
        match text.find(char::is_whitespace) {
            Some(idx) => text[idx..].trim(),
            None => "",
        }
    }

    /// Reply target for this message.
    pub fn reply_target(&self) -> String {
        self.chat_id.to_string()
    }
}
