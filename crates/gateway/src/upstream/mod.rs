// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream Obvious API: the call seam, its HTTP client, and failure classification.

pub mod client;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

use crate::alarms::AlarmQuery;

/// Maximum length kept from a non-JSON upstream error body.
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Boxed future returned by [`Upstream`] calls.
pub type UpstreamFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UpstreamError>> + Send + 'a>>;

/// Calls the gateway makes against the Obvious API.
///
/// Object-safe for use as `Arc<dyn Upstream>`.
pub trait Upstream: Send + Sync + 'static {
    /// Exchange credentials for a bearer token. Needs no prior token.
    fn signin<'a>(&'a self, credentials: &'a Credentials) -> UpstreamFuture<'a, String>;

    /// List alarms with the caller's pagination/filter/sort parameters.
    fn list_alarms<'a>(
        &'a self,
        token: &'a str,
        query: &'a AlarmQuery,
    ) -> UpstreamFuture<'a, serde_json::Value>;

    /// Fetch the passport profile of the authenticated user.
    fn myself<'a>(&'a self, token: &'a str) -> UpstreamFuture<'a, serde_json::Value>;
}

/// Username/password pair used for signin.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Classified failure of an upstream call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    /// The upstream answered 401 or 403.
    #[error("upstream rejected the request ({status})")]
    Unauthorized { status: u16, details: serde_json::Value },

    /// Transport failure or any other non-2xx status.
    #[error("upstream unavailable: {message}")]
    Unavailable { status: Option<u16>, message: String, details: serde_json::Value },

    /// A 2xx response whose body was not what the call expects.
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    /// Re-authentication was requested before any credentials were captured.
    #[error("no credentials captured, login required")]
    NoCredentials,
}

impl UpstreamError {
    /// Classify a non-2xx upstream response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let details = serde_json::from_str(body)
            .unwrap_or_else(|_| serde_json::Value::String(truncate_body(body)));
        match status {
            401 | 403 => Self::Unauthorized { status, details },
            _ => Self::Unavailable {
                status: Some(status),
                message: format!("upstream returned {status}"),
                details,
            },
        }
    }

    /// Whether this failure should trigger a re-authentication.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Payload to surface to HTTP callers as `details`.
    pub fn details(&self) -> serde_json::Value {
        match self {
            Self::Unauthorized { details, .. } | Self::Unavailable { details, .. } => {
                details.clone()
            }
            Self::InvalidResponse(msg) => serde_json::Value::String(msg.clone()),
            Self::NoCredentials => serde_json::Value::String(self.to_string()),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        let message = e.to_string();
        Self::Unavailable {
            status: e.status().map(|s| s.as_u16()),
            details: serde_json::Value::String(message.clone()),
            message,
        }
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_owned();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

/// Short, log-safe prefix of a bearer token.
pub fn fingerprint(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{prefix}…")
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
