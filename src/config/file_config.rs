use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// Redis connection URL
    pub url: Option<String>,
    /// Name of the Redis list receiving completed paths
    pub queue: Option<String>,
    /// aria2 RPC endpoint
    pub rpc: Option<String>,
    /// aria2 RPC secret token
    pub secret: Option<String>,
    pub rpc_timeout_secs: Option<u64>,
    /// Extensions skipped when scanning directories
    pub ignore_ext: Option<Vec<String>>,

    pub keepalive: Option<KeepaliveConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct KeepaliveConfig {
    pub interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
