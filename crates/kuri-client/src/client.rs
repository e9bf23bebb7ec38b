//! HTTP client for the Kuri message API.

use crate::error::ClientError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Public Kuri endpoint, used when no usable root is given.
pub const DEFAULT_API_ROOT: &str = "https://kimikuri.keuin.cc/api/";

/// Roots no longer than a bare scheme cannot name a server.
const MIN_ROOT_LEN: usize = "http://".len();

/// Sends messages to the Telegram account behind one token.
#[derive(Clone)]
pub struct KuriClient {
    client: Client,
    api_root: String,
    token: String,
}

impl KuriClient {
    /// Create a client for `token` against `api_root`.
    ///
    /// A missing trailing slash is added. A root too short to be a URL falls
    /// back to [`DEFAULT_API_ROOT`].
    pub fn new(api_root: &str, token: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_root: normalize_root(api_root),
            token: token.into(),
        })
    }

    /// Root all requests are made against, always ending in `/`.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Ask Kuri to deliver `message`.
    ///
    /// Returns `Ok(false)` when the server answers but does not report
    /// success: a bad status, a body that is not JSON, or an unknown token.
    #[instrument(skip(self, message))]
    pub async fn send_message(&self, message: &str) -> Result<bool, ClientError> {
        let url = format!("{}message", self.api_root);

        let response = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str()), ("message", message)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            error!("Bad HTTP status code: {}", status.as_u16());
            return Ok(false);
        }

        let body = response.text().await?;
        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(json) => {
                debug!("Response: {}", json);
                Ok(json.get("success") == Some(&serde_json::Value::Bool(true)))
            }
            Err(_) => {
                error!("Bad response: {}", body);
                Ok(false)
            }
        }
    }
}

fn normalize_root(api_root: &str) -> String {
    let mut root = api_root.to_string();
    if !root.ends_with('/') {
        root.push('/');
    }

    if root.len() > MIN_ROOT_LEN {
        root
    } else {
        DEFAULT_API_ROOT.to_string()
    }
}
