// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Configuration for the Obvious gateway.
#[derive(Debug, Clone, Parser)]
#[command(name = "obvious-gateway", version, about = "Token-managing proxy for the Obvious API")]
pub struct GatewayConfig {
    /// Base URL of the upstream Obvious API (required).
    #[arg(long, env = "OBVIOUS_BASE_URL")]
    pub base_url: Option<String>,

    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "GATEWAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 3000, env = "PORT")]
    pub port: u16,

    /// Seconds between background token refreshes.
    #[arg(long, default_value_t = 600, env = "GATEWAY_REFRESH_INTERVAL_SECS")]
    pub refresh_interval_secs: u64,

    /// Seconds before retrying after a failed background refresh.
    #[arg(long, default_value_t = 60, env = "GATEWAY_RETRY_INTERVAL_SECS")]
    pub retry_interval_secs: u64,

    /// Timeout for every outbound upstream request, in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "GATEWAY_UPSTREAM_TIMEOUT_MS")]
    pub upstream_timeout_ms: u64,

    /// JSON file holding extra alarm records appended to every `/alarms` listing.
    #[arg(long, env = "GATEWAY_SUPPLEMENTAL_ALARMS")]
    pub supplemental_alarms: Option<PathBuf>,

    /// Log format (json or text).
    #[arg(long, default_value = "text", env = "GATEWAY_LOG_FORMAT")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    #[arg(long, default_value = "info", env = "GATEWAY_LOG_LEVEL")]
    pub log_level: String,
}

impl GatewayConfig {
    /// Reject configurations the gateway cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let base_url = self.base_url()?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            anyhow::bail!("OBVIOUS_BASE_URL must be an http(s) URL, got {base_url:?}");
        }
        if self.refresh_interval_secs == 0 {
            anyhow::bail!("--refresh-interval-secs must be greater than zero");
        }
        if self.retry_interval_secs == 0 {
            anyhow::bail!("--retry-interval-secs must be greater than zero");
        }
        if self.upstream_timeout_ms == 0 {
            anyhow::bail!("--upstream-timeout-ms must be greater than zero");
        }
        match self.log_format.as_str() {
            "json" | "text" => Ok(()),
            other => anyhow::bail!("unknown log format {other:?} (expected json or text)"),
        }
    }

    /// Upstream base URL with any trailing slash removed.
    pub fn base_url(&self) -> anyhow::Result<&str> {
        match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url.trim_end_matches('/')),
            _ => anyhow::bail!("OBVIOUS_BASE_URL is not configured"),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
