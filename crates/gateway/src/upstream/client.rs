// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the Obvious API.

use std::time::Duration;

use reqwest::Client;

use crate::alarms::AlarmQuery;
use crate::upstream::{Credentials, Upstream, UpstreamError, UpstreamFuture};

const SIGNIN_PATH: &str = "/authentication/api/signin";
const ALARMS_PATH: &str = "/alarms/api/Alarm";
const MYSELF_PATH: &str = "/authentication/api/Passport/myself";

/// reqwest-backed [`Upstream`] implementation.
///
/// Clone is cheap; the inner `reqwest::Client` shares its connection pool.
#[derive(Clone)]
pub struct ObviousClient {
    base_url: String,
    client: Client,
}

impl ObviousClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        // reqwest is built without a bundled provider; building a client panics without one.
        let _ = rustls::crypto::ring::default_provider().install_default();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.into(), client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json(resp: reqwest::Response) -> Result<serde_json::Value, UpstreamError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::from_status(status.as_u16(), &body));
        }
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
    }
}

impl Upstream for ObviousClient {
    fn signin<'a>(&'a self, credentials: &'a Credentials) -> UpstreamFuture<'a, String> {
        Box::pin(async move {
            let resp = self
                .client
                .get(self.url(SIGNIN_PATH))
                .query(&[
                    ("username", credentials.username.as_str()),
                    ("password", credentials.password.as_str()),
                ])
                .send()
                .await?;
            let body = Self::read_json(resp).await?;
            body.get("token").and_then(|t| t.as_str()).map(str::to_owned).ok_or_else(|| {
                UpstreamError::InvalidResponse("signin response has no token field".to_owned())
            })
        })
    }

    fn list_alarms<'a>(
        &'a self,
        token: &'a str,
        query: &'a AlarmQuery,
    ) -> UpstreamFuture<'a, serde_json::Value> {
        Box::pin(async move {
            let resp = self
                .client
                .get(self.url(ALARMS_PATH))
                .bearer_auth(token)
                .query(query)
                .send()
                .await?;
            Self::read_json(resp).await
        })
    }

    fn myself<'a>(&'a self, token: &'a str) -> UpstreamFuture<'a, serde_json::Value> {
        Box::pin(async move {
            let resp = self.client.get(self.url(MYSELF_PATH)).bearer_auth(token).send().await?;
            Self::read_json(resp).await
        })
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
