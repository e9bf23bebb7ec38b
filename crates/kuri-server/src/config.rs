//! Configuration for the Kuri server.
//!
//! Sources, later ones winning:
//! 1. `kuri.{toml,json,yaml}` in the working directory, or the file named
//!    by `KURI_CONFIG_FILE`
//! 2. Environment variables such as `KURI_BOT__TOKEN` (a `.env` file is
//!    loaded first if present)

use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use telegram_client::ClientOptions;

/// Shortest token the server will issue, in bytes.
pub const MIN_TOKEN_BYTES: usize = 16;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Telegram bot configuration
    pub bot: BotConfig,

    /// Registry storage configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// HTTP API configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Admin console configuration
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Bot API token from @BotFather
    pub token: SecretString,

    /// Bot API endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Proxy used to reach the Bot API
    #[serde(default)]
    pub proxy: Option<String>,

    /// Idle connections kept to the Bot API
    #[serde(default = "default_pool_connection_size")]
    pub pool_connection_size: usize,

    #[serde(default = "default_bot_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    #[serde(default = "default_bot_timeout", with = "humantime_serde")]
    pub read_timeout: Duration,

    /// Long polling wait for `getUpdates`
    #[serde(default = "default_poll_timeout", with = "humantime_serde")]
    pub poll_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Path to the users file
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,

    /// Enable persistence (if false, registry is in-memory only)
    #[serde(default = "default_true")]
    pub persist: bool,

    /// How often dirty state is flushed
    #[serde(default = "default_flush_interval", with = "humantime_serde")]
    pub flush_interval: Duration,

    /// Random bytes per issued token
    #[serde(default = "default_token_size_bytes")]
    pub token_size_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL of the API, shown by `/howto`
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Longest accepted notification, in characters
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsoleConfig {
    /// Read admin commands from stdin
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Log level; defaults to `debug` in debug mode, `info` otherwise
    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub format: LogFormat,

    /// Debug mode
    #[serde(default)]
    pub debug: bool,
}

impl LogConfig {
    pub fn effective_level(&self) -> &str {
        match &self.level {
            Some(level) => level,
            None if self.debug => "debug",
            None => "info",
        }
    }
}

// Default implementations
impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
            persist: true,
            flush_interval: default_flush_interval(),
            token_size_bytes: default_token_size_bytes(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            api_base: default_api_base(),
            max_message_length: default_max_message_length(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
        }
    }
}

// Default value functions
fn default_api_url() -> String {
    telegram_client::DEFAULT_API_URL.into()
}

fn default_pool_connection_size() -> usize {
    8
}

fn default_bot_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("users.json")
}

fn default_true() -> bool {
    true
}

fn default_flush_interval() -> Duration {
    kuri_registry::persistence::DEFAULT_FLUSH_INTERVAL
}

fn default_token_size_bytes() -> usize {
    kuri_registry::codec::DEFAULT_TOKEN_BYTES
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    7777
}

fn default_api_base() -> String {
    "http://localhost:7777/".into()
}

fn default_max_message_length() -> usize {
    100
}

fn default_global_rpm() -> u32 {
    60
}

impl Config {
    /// Load configuration from the config file and environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let file = match std::env::var("KURI_CONFIG_FILE") {
            Ok(path) => config::File::with_name(&path).required(true),
            Err(_) => config::File::with_name("kuri").required(false),
        };

        let builder = config::Config::builder().add_source(file).add_source(
            config::Environment::with_prefix("KURI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Self::build(builder)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml: &str) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml));
        Self::build(builder)
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run safely with.
    pub fn validate(&self) -> Result<()> {
        if self.bot.token.expose_secret().trim().is_empty() {
            bail!("bot.token must not be empty");
        }
        if self.registry.token_size_bytes < MIN_TOKEN_BYTES {
            bail!(
                "registry.token_size_bytes must be at least {} (got {})",
                MIN_TOKEN_BYTES,
                self.registry.token_size_bytes
            );
        }
        if self.registry.flush_interval.is_zero() {
            bail!("registry.flush_interval must be greater than zero");
        }
        if self.server.max_message_length == 0 {
            bail!("server.max_message_length must be greater than zero");
        }
        Ok(())
    }
}

impl BotConfig {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            proxy: self.proxy.clone(),
            pool_size: self.pool_connection_size,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid server.listen_addr: {}", self.listen_addr))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// `api_base` with a trailing slash.
    pub fn api_base(&self) -> String {
        if self.api_base.ends_with('/') {
            self.api_base.clone()
        } else {
            format!("{}/", self.api_base)
        }
    }
}
