use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aria2_notifier::config::{CliConfig, FileConfig, QueueConfig};
use aria2_notifier::queue::{MemoryQueue, QueueProducer, RedisQueue};
use aria2_notifier::scan;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if !path.is_file() {
        return Err(format!("Config file does not exist: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
#[command(about = "Push finished downloads to the work queue by hand")]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Redis connection URL (e.g. redis://127.0.0.1:6379/0).
    #[clap(long)]
    pub url: Option<String>,

    /// Name of the Redis list receiving paths.
    #[clap(long)]
    pub queue: Option<String>,

    /// Log paths instead of pushing them to Redis.
    #[clap(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: InnerCommand,
}

#[derive(Subcommand, Debug)]
enum InnerCommand {
    /// aria2 on-download-complete hook: enqueues <PATH> unless <FILE_COUNT> is 0.
    Hook {
        gid: String,
        file_count: u64,
        path: PathBuf,
    },

    /// Enqueues a file, or every non-ignored file below a directory.
    Scan { path: PathBuf },
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            url: args.url.clone(),
            queue: args.queue.clone(),
            ..Default::default()
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
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = QueueConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    let paths = match &cli_args.command {
        InnerCommand::Hook {
            gid,
            file_count,
            path,
        } => {
            info!("Hook gid = {}, files = {}", gid, file_count);
            scan::hook_paths(*file_count, path)
        }
        InnerCommand::Scan { path } => scan::collect_files(path, &config.ignore_list())?,
    };
    if paths.is_empty() {
        info!("Nothing to enqueue");
        return Ok(());
    }

    let queue: Arc<dyn QueueProducer> = if cli_args.dry_run {
        warn!("Dry run: paths are logged, not enqueued");
        Arc::new(MemoryQueue::new())
    } else {
        Arc::new(RedisQueue::open(&config.url)?)
    };

    let count = scan::enqueue_files(queue.as_ref(), &config.queue, &paths).await?;
    info!("Enqueued {} path(s) to '{}'", count, config.queue);
    Ok(())
}
