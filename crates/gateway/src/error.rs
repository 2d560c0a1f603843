// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for the gateway API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// A guarded request arrived before any successful login.
    MissingToken,
    /// `/auth` could not obtain a token from the upstream.
    AuthenticationFailed,
    /// The upstream still rejected the token after one inline re-authentication.
    UpstreamUnauthorized,
    /// Transport failure or non-auth error status from the upstream.
    UpstreamUnavailable,
    BadRequest,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MissingToken => 401,
            Self::AuthenticationFailed => 401,
            Self::UpstreamUnauthorized => 401,
            Self::UpstreamUnavailable => 500,
            Self::BadRequest => 400,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::UpstreamUnauthorized => "UPSTREAM_UNAUTHORIZED",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::BadRequest => "BAD_REQUEST",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_response(
        &self,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> ErrorResponse {
        ErrorResponse { error: message.into(), code: self.as_str().to_owned(), details }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_error_response(message, details)))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error response envelope: human-readable message, machine-readable code,
/// and the upstream's own error payload when there is one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
