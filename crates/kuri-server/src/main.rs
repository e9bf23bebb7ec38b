//! Kuri server - entry point.

use kuri_registry::{
    spawn_persistence, NotificationDispatcher, Registry, Storage, Store, TokenCodec, TokenIssuer,
};
use kuri_server::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    bot::run_bot,
    commands::build_command_table,
    config::{Config, LogConfig, LogFormat},
    console::serve_console,
    AppError, AppResult, TelegramSender,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use telegram_client::TelegramClient;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Grace period for blocking tasks (the console's stdin read) at exit.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(AppError::Config(e).exit_code());
        }
    };

    init_logging(&config.log);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to start the async runtime: {}", e);
            std::process::exit(AppError::Io(e).exit_code());
        }
    };

    let result = runtime.block_on(run(config));
    // A pending stdin read cannot be cancelled
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(config: Config) -> AppResult<()> {
    info!("Starting {}", kuri_server::greeting());
    if config.log.debug {
        warn!("Debug mode is on. Do not use it in production.");
    }

    // Initialize storage
    let store: Arc<dyn Storage> = if config.registry.persist {
        info!("Using registry file {}", config.registry.path.display());
        Arc::new(Store::json(config.registry.path.clone()))
    } else {
        info!("Persistence disabled, using in-memory storage");
        Arc::new(Store::memory())
    };

    // Load existing registry
    let registry = Arc::new(Registry::load_from(store.as_ref()).await?);
    info!("Loaded registry with {} users", registry.count());

    let issuer = Arc::new(TokenIssuer::new(
        &registry,
        TokenCodec::new(config.registry.token_size_bytes),
    ));

    // Initialize the bot
    let client = TelegramClient::new(
        config.bot.api_url.clone(),
        config.bot.token.expose_secret(),
        config.bot.client_options(),
    )?;
    let me = client.get_me().await?;
    info!(
        "Logged in as @{}",
        me.username.as_deref().unwrap_or(&me.first_name)
    );

    let persistence = spawn_persistence(
        registry.clone(),
        store.clone(),
        config.registry.flush_interval,
    );

    let dispatcher = NotificationDispatcher::new(
        registry.clone(),
        Arc::new(TelegramSender::new(client.clone())),
    );
    let table = Arc::new(build_command_table(
        registry.clone(),
        issuer,
        config.server.api_base(),
    ));

    // HTTP API
    let state = AppState::new(
        registry.clone(),
        dispatcher,
        config.server.max_message_length,
    );
    let rate_limit = RateLimitState::new(config.rate_limit.global_per_minute);
    let app = create_router_with_rate_limit(state, rate_limit);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut server_shutdown = shutdown_rx.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.wait_for(|stop| *stop).await;
            })
            .await
    });

    let bot = tokio::spawn(run_bot(
        client,
        table,
        config.bot.poll_timeout,
        shutdown_rx.clone(),
    ));

    if config.console.enabled {
        let registry = registry.clone();
        let console_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            let stdin = BufReader::new(tokio::io::stdin());
            serve_console(&registry, stdin, tokio::io::stdout(), &console_tx).await;
        });
    }

    let mut stop = shutdown_rx.clone();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
        _ = stop.wait_for(|stop| *stop) => info!("Shutdown requested"),
    }

    info!("Shutting down...");
    let _ = shutdown_tx.send(true);

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Server error: {}", e),
        Err(e) => error!("Server task failed: {}", e),
    }
    if let Err(e) = bot.await {
        error!("Bot task failed: {}", e);
    }

    let outcome = persistence.shutdown().await;
    info!("Final registry flush: {:?}", outcome);
    Ok(())
}

fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log.effective_level()));

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}
