//! Host configuration

use anyhow::{Context, Result};
use cmdproc_core::ProcessorConfig;
use std::time::Duration;

/// Configuration for the command host
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Client id used for input lines that do not name one
    pub client_id: u32,
    /// How often queued replies are written out
    pub drain_interval: Duration,
    /// How long to wait for queued commands after input ends
    pub shutdown_grace: Duration,
    /// Processor settings
    pub processor: ProcessorConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            client_id: 0,
            drain_interval: Duration::from_millis(50),
            shutdown_grace: Duration::from_secs(5),
            processor: ProcessorConfig::default(),
        }
    }
}

impl HostConfig {
    /// Defaults overridden by `CMDPROC_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("CMDPROC_CLIENT_ID") {
            config.client_id = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid CMDPROC_CLIENT_ID: {}", raw))?;
        }
        if let Some(raw) = lookup("CMDPROC_DRAIN_INTERVAL_MS") {
            config.drain_interval = parse_millis("CMDPROC_DRAIN_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("CMDPROC_SHUTDOWN_GRACE_MS") {
            config.shutdown_grace = parse_millis("CMDPROC_SHUTDOWN_GRACE_MS", &raw)?;
        }

        Ok(config)
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration> {
    let ms: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Invalid {}: {}", key, raw))?;
    if ms == 0 {
        anyhow::bail!("{} must be greater than zero", key);
    }
    Ok(Duration::from_millis(ms))
}
