//! Telegram Bot API HTTP client.

use crate::error::TelegramError;
use crate::types::*;
use reqwest::{Client, Proxy};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Public Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// HTTP connection options.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Proxy for all requests (e.g. `http://127.0.0.1:8118`)
    pub proxy: Option<String>,
    /// Maximum idle connections kept per host
    pub pool_size: usize,
    pub connect_timeout: Duration,
    /// Timeout for ordinary calls; long polls add their own wait on top
    pub read_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            pool_size: 8,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
        }
    }
}

/// Telegram Bot API client.
///
/// The bot token is part of every request URL and is kept in a
/// `SecretString` so it never shows up in debug output.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: SecretString,
    read_timeout: Duration,
}

impl TelegramClient {
    /// Create a new Telegram client.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, TelegramError> {
        let mut builder = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.read_timeout)
            .pool_max_idle_per_host(options.pool_size);

        if let Some(proxy) = &options.proxy {
            let proxy = Proxy::all(proxy).map_err(|e| TelegramError::InvalidProxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: SecretString::new(token.into()),
            read_timeout: options.read_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.base_url,
            self.token.expose_secret(),
            method
        )
    }

    async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.method_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let parsed: ApiResponse<T> = match serde_json::from_slice(&bytes) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                return Err(TelegramError::Api {
                    code: Some(i32::from(status.as_u16())),
                    description: String::from_utf8_lossy(&bytes).into_owned(),
                })
            }
        };

        match (parsed.ok, parsed.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TelegramError::Api {
                code: parsed.error_code,
                description: parsed
                    .description
                    .unwrap_or_else(|| format!("{} failed", method)),
            }),
        }
    }

    /// Fetch the bot's own account.
    #[instrument(skip(self))]
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    /// Check if the Bot API is reachable with this token.
    pub async fn health_check(&self) -> bool {
        self.get_me().await.is_ok()
    }

    /// Long-poll for updates after `offset`.
    #[instrument(skip(self))]
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: poll_timeout.as_secs(),
            allowed_updates: vec!["message".to_string()],
        };

        let updates: Vec<Update> = self
            .call("getUpdates", &request, Some(self.read_timeout + poll_timeout))
            .await?;
        debug!("Received {} updates", updates.len());
        Ok(updates)
    }

    /// Send a text message to a chat.
    #[instrument(skip(self, text))]
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        let request = SendMessageRequest {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
        };

        match self.call::<_, Message>("sendMessage", &request, None).await {
            Ok(_) => {
                debug!("Sent message to {}", chat_id);
                Ok(())
            }
            Err(TelegramError::Api { description, .. }) => {
                warn!("Send failed: {}", description);
                Err(TelegramError::SendFailed(description))
            }
            Err(e) => Err(e),
        }
    }

    /// Reply in the chat a message came from.
    pub async fn reply(&self, original: &BotMessage, text: &str) -> Result<(), TelegramError> {
        self.send_message(&original.reply_target(), text).await
    }
}
