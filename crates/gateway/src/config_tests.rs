// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

use super::GatewayConfig;

fn parse(args: &[&str]) -> GatewayConfig {
    GatewayConfig::parse_from(args)
}

#[test]
fn defaults_match_reference_deployment() -> anyhow::Result<()> {
    let config = parse(&["obvious-gateway", "--base-url", "https://obvious.example"]);
    config.validate()?;
    assert_eq!(config.port, 3000);
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.refresh_interval(), Duration::from_secs(600));
    assert_eq!(config.retry_interval(), Duration::from_secs(60));
    assert_eq!(config.upstream_timeout(), Duration::from_secs(30));
    Ok(())
}

#[test]
fn base_url_trailing_slash_is_trimmed() -> anyhow::Result<()> {
    let config = parse(&["obvious-gateway", "--base-url", "https://obvious.example/api/"]);
    assert_eq!(config.base_url()?, "https://obvious.example/api");
    Ok(())
}

#[test]
fn custom_intervals_are_parsed() -> anyhow::Result<()> {
    let config = parse(&[
        "obvious-gateway",
        "--base-url",
        "http://localhost:9000",
        "--refresh-interval-secs",
        "120",
        "--retry-interval-secs",
        "5",
    ]);
    config.validate()?;
    assert_eq!(config.refresh_interval(), Duration::from_secs(120));
    assert_eq!(config.retry_interval(), Duration::from_secs(5));
    Ok(())
}

#[yare::parameterized(
    missing_base_url = { &["obvious-gateway"], "OBVIOUS_BASE_URL is not configured" },
    blank_base_url   = { &["obvious-gateway", "--base-url", "  "], "OBVIOUS_BASE_URL is not configured" },
    not_http         = { &["obvious-gateway", "--base-url", "ftp://x"], "must be an http(s) URL" },
    zero_refresh     = { &["obvious-gateway", "--base-url", "http://x", "--refresh-interval-secs", "0"],
                         "--refresh-interval-secs" },
    zero_retry       = { &["obvious-gateway", "--base-url", "http://x", "--retry-interval-secs", "0"],
                         "--retry-interval-secs" },
    bad_log_format   = { &["obvious-gateway", "--base-url", "http://x", "--log-format", "xml"],
                         "unknown log format" },
)]
fn invalid_config(args: &[&str], expected_substr: &str) {
    let config = parse(args);
    crate::assert_err_contains!(config.validate(), expected_substr);
}
