//! Interactive admin console on stdin.

use kuri_registry::Registry;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, error, info};

const USAGE: &str = "\
Usages:
  help, h, ?  show this message
  users       list all registered users
  exit        stop the server
";

/// What the console asked the process to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// The operator typed `exit`
    Exit,
    /// Input was closed
    Eof,
}

/// Read admin commands from `input` until `exit` or end of input.
pub async fn run_console<R, W>(registry: &Registry, input: R, mut output: W) -> io::Result<ConsoleExit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let command = line.trim().to_ascii_lowercase();
        debug!("Console command: {}", command);

        let reply = match command.as_str() {
            "" => continue,
            "help" | "h" | "?" => USAGE.to_string(),
            "users" => list_users(registry),
            "exit" => return Ok(ConsoleExit::Exit),
            _ => "Invalid input. run `help` to show usages.\n".to_string(),
        };

        output.write_all(reply.as_bytes()).await?;
        output.flush().await?;
    }

    Ok(ConsoleExit::Eof)
}

/// Run the console and request a server shutdown when the operator types
/// `exit`. Closed input only ends the console.
pub async fn serve_console<R, W>(
    registry: &Registry,
    input: R,
    output: W,
    shutdown: &watch::Sender<bool>,
) -> Option<ConsoleExit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match run_console(registry, input, output).await {
        Ok(ConsoleExit::Exit) => {
            info!("Shutdown requested from console");
            let _ = shutdown.send(true);
            Some(ConsoleExit::Exit)
        }
        Ok(ConsoleExit::Eof) => {
            info!("Console input closed, server keeps running");
            Some(ConsoleExit::Eof)
        }
        Err(e) => {
            error!("Console failed: {}", e);
            None
        }
    }
}

fn list_users(registry: &Registry) -> String {
    let users = registry.list_all();
    if users.is_empty() {
        return "(no user registered)\n".to_string();
    }

    let mut out: String = users
        .iter()
        .map(|u| {
            format!(
                "User ID: {}, Chat ID: {}, Token: {}\n",
                u.user_id, u.delivery_address, u.token
            )
        })
        .collect();
    out.push_str(&format!("{} user(s) totally.\n", users.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn run(registry: &Registry, input: &str) -> (ConsoleExit, String) {
        let mut output = Vec::new();
        let exit = run_console(registry, BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();
        (exit, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn test_users_listing() {
        let registry = Registry::new();
        registry.register("2", "tok-b", "chat-2").unwrap();
        registry.register("1", "tok-a", "chat-1").unwrap();

        let (exit, output) = run(&registry, "users\n").await;

        assert_eq!(exit, ConsoleExit::Eof);
        assert_eq!(
            output,
            "User ID: 1, Chat ID: chat-1, Token: tok-a\n\
             User ID: 2, Chat ID: chat-2, Token: tok-b\n\
             2 user(s) totally.\n"
        );
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let (_, output) = run(&Registry::new(), "users\n").await;
        assert_eq!(output, "(no user registered)\n");
    }

    #[tokio::test]
    async fn test_help_aliases_and_invalid_input() {
        let (_, output) = run(&Registry::new(), "h\n\n  ?  \nfoo\n").await;

        assert_eq!(output.matches("Usages:").count(), 2);
        assert!(output.ends_with("Invalid input. run `help` to show usages.\n"));
    }

    #[tokio::test]
    async fn test_commands_ignore_case() {
        let registry = Registry::new();
        registry.register("1", "tok-a", "chat-1").unwrap();

        let (exit, output) = run(&registry, "HELP\nUsers\nEXIT\n").await;

        assert_eq!(exit, ConsoleExit::Exit);
        assert!(output.starts_with("Usages:"));
        assert!(output.ends_with("1 user(s) totally.\n"));
        assert!(!output.contains("Invalid input"));
    }

    #[tokio::test]
    async fn test_closed_input_keeps_server_running() {
        let (tx, rx) = watch::channel(false);

        let input = BufReader::new(&b"users\n"[..]);
        let exit = serve_console(&Registry::new(), input, Vec::<u8>::new(), &tx).await;

        assert_eq!(exit, Some(ConsoleExit::Eof));
        assert!(!*rx.borrow());
    }

    #[tokio::test]
    async fn test_exit_requests_shutdown() {
        let (tx, rx) = watch::channel(false);

        let input = BufReader::new(&b"exit\n"[..]);
        let exit = serve_console(&Registry::new(), input, Vec::<u8>::new(), &tx).await;

        assert_eq!(exit, Some(ConsoleExit::Exit));
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn test_exit_stops_reading() {
        let (exit, output) = run(&Registry::new(), "exit\nusers\n").await;

        assert_eq!(exit, ConsoleExit::Exit);
        assert!(output.is_empty());
    }
}
