//! `kuri-send` - deliver a message to your Telegram through Kuri.

use clap::Parser;
use kuri_client::{KuriClient, DEFAULT_API_ROOT};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Send a message to the Telegram account behind a Kuri token.
#[derive(Parser, Debug)]
#[command(name = "kuri-send", version, about)]
struct Cli {
    /// Kuri API root
    #[arg(long, env = "KURI_API_ROOT", default_value = DEFAULT_API_ROOT)]
    api_root: String,

    /// Your private token, from the bot's /register command
    #[arg(long, env = "KURI_TOKEN")]
    token: String,

    /// Message text
    #[arg(long)]
    message: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = match KuriClient::new(&cli.api_root, cli.token) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return ExitCode::from(2);
        }
    };

    match client.send_message(&cli.message).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            eprintln!("Failed to send message.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Failed to send message: {}", e);
            ExitCode::FAILURE
        }
    }
}
