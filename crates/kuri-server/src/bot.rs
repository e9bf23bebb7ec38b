//! Bot update loop.

use crate::commands::CommandTable;
use std::sync::Arc;
use std::time::Duration;
use telegram_client::{BotMessage, TelegramClient, UpdateReceiver};
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tracing::{debug, error, info};

/// Answer one incoming message.
pub async fn handle_message(client: &TelegramClient, table: &CommandTable, message: &BotMessage) {
    let Some(reply) = table.respond(message).await else {
        return;
    };

    if let Err(e) = client.reply(message, &reply).await {
        error!("Failed to send reply to chat {}: {}", message.chat_id, e);
    }
}

/// Poll for updates and dispatch commands until `shutdown` fires.
///
/// Each message is handled on its own task so a slow reply does not hold
/// up the poll loop.
pub async fn run_bot(
    client: TelegramClient,
    table: Arc<CommandTable>,
    poll_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let receiver = UpdateReceiver::new(client.clone(), poll_timeout);
    let mut stream = Box::pin(receiver.stream());

    info!("Listening for bot commands ({} registered)", table.len());

    loop {
        tokio::select! {
            Some(message) = stream.next() => {
                let client = client.clone();
                let table = table.clone();
                tokio::spawn(async move {
                    handle_message(&client, &table, &message).await;
                });
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    debug!("Bot loop stopped");
}
