mod file_config;

pub use file_config::{FileConfig, KeepaliveConfig};

use crate::aria2::websocket_endpoint;
use crate::notifier::{KeepaliveSettings, DEFAULT_PROBE_INTERVAL, DEFAULT_PROBE_TIMEOUT};
use crate::scan::{normalize_extension, IgnoreList};
use anyhow::{anyhow, bail, Result};
use std::time::Duration;

pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub url: Option<String>,
    pub queue: Option<String>,
    pub rpc: Option<String>,
    pub secret: Option<String>,
    pub rpc_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Redis connection URL
    pub url: String,
    /// Queue (Redis list) name
    pub queue: String,
    /// aria2 RPC endpoint
    pub rpc: String,
    /// aria2 RPC secret, empty when unset
    pub secret: String,
    pub rpc_timeout_secs: u64,
    pub keepalive: KeepaliveSettings,
}

/// Settings needed by the enqueue CLI, which never talks to aria2.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub url: String,
    pub queue: String,
    /// Lowercase extensions without leading dots
    pub ignore_ext: Vec<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let url = required("url", file.url.or_else(|| cli.url.clone()))?;
        let queue = required("queue", file.queue.or_else(|| cli.queue.clone()))?;
        let rpc = required("rpc", file.rpc.or_else(|| cli.rpc.clone()))?;
        websocket_endpoint(&rpc)?;

        let secret = file
            .secret
            .or_else(|| cli.secret.clone())
            .unwrap_or_default();

        let rpc_timeout_secs = file
            .rpc_timeout_secs
            .or(cli.rpc_timeout_secs)
            .unwrap_or(DEFAULT_RPC_TIMEOUT_SECS);
        if rpc_timeout_secs == 0 {
            bail!("rpc_timeout_secs must be greater than zero");
        }

        let keepalive_file = file.keepalive.unwrap_or_default();
        let keepalive = KeepaliveSettings {
            interval: keepalive_file
                .interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PROBE_INTERVAL),
            write_timeout: keepalive_file
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PROBE_TIMEOUT),
        };
        if keepalive.interval.is_zero() {
            bail!("keepalive.interval_secs must be greater than zero");
        }
        if keepalive.write_timeout.is_zero() {
            bail!("keepalive.timeout_secs must be greater than zero");
        }

        Ok(Self {
            url,
            queue,
            rpc,
            secret,
            rpc_timeout_secs,
            keepalive,
        })
    }
}

impl QueueConfig {
    /// Same precedence as [`AppConfig::resolve`], without the aria2 settings.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let url = required("url", file.url.or_else(|| cli.url.clone()))?;
        let queue = required("queue", file.queue.or_else(|| cli.queue.clone()))?;
        let ignore_ext = file
            .ignore_ext
            .unwrap_or_default()
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| !e.is_empty())
            .collect();

        Ok(Self {
            url,
            queue,
            ignore_ext,
        })
    }

    pub fn ignore_list(&self) -> IgnoreList {
        IgnoreList::new(&self.ignore_ext)
    }
}

fn required(key: &str, value: Option<String>) -> Result<String> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        anyhow!(
            "{} must be specified via --{} or in config file",
            key,
            key.replace('_', "-")
        )
    })
}
