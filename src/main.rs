use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aria2_notifier::config::{AppConfig, CliConfig, FileConfig};
use aria2_notifier::queue::{MemoryQueue, QueueProducer, RedisQueue};
use aria2_notifier::{Aria2Client, CompletionNotifier, Dispatcher, NotificationChannel};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if !path.is_file() {
        return Err(format!("Config file does not exist: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Redis connection URL (e.g. redis://127.0.0.1:6379/0).
    #[clap(long)]
    pub url: Option<String>,

    /// Name of the Redis list receiving completed download paths.
    #[clap(long)]
    pub queue: Option<String>,

    /// aria2 RPC endpoint (e.g. http://127.0.0.1:6800/jsonrpc).
    #[clap(long)]
    pub rpc: Option<String>,

    /// aria2 RPC secret token.
    #[clap(long)]
    pub secret: Option<String>,

    /// Timeout in seconds for aria2 status queries.
    #[clap(long)]
    pub rpc_timeout_secs: Option<u64>,

    /// Log paths instead of pushing them to Redis.
    #[clap(long)]
    pub dry_run: bool,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            url: args.url.clone(),
            queue: args.queue.clone(),
            rpc: args.rpc.clone(),
            secret: args.secret.clone(),
            rpc_timeout_secs: args.rpc_timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    let queue: Arc<dyn QueueProducer> = if cli_args.dry_run {
        warn!("Dry run: paths are logged, not enqueued");
        Arc::new(MemoryQueue::new())
    } else {
        Arc::new(RedisQueue::open(&app_config.url)?)
    };

    let resolver = Arc::new(Aria2Client::new(
        &app_config.rpc,
        app_config.secret.clone(),
        app_config.rpc_timeout_secs,
    )?);
    let notifier = Arc::new(CompletionNotifier::new(
        resolver,
        queue,
        app_config.queue.clone(),
    ));
    let dispatcher = Dispatcher::new(notifier);

    let channel = NotificationChannel::connect(&app_config.rpc, app_config.keepalive).await?;
    info!(
        "Listening on {} and enqueueing to '{}'",
        channel.url(),
        app_config.queue
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            shutdown.cancel();
        }
    });

    let end = channel.run(&dispatcher, shutdown).await;
    if end.is_expected() {
        info!("Bye");
        Ok(())
    } else {
        anyhow::bail!("Notification channel stopped unexpectedly: {:?}", end)
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, initiating graceful shutdown");
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Received Ctrl+C, initiating graceful shutdown");
}
