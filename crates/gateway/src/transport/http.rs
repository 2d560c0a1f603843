// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the gateway.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::alarms::{self, AlarmQuery, AlarmSummary};
use crate::error::ErrorCode;
use crate::guard::{with_auth_retry, GuardError};
use crate::session::RefreshKind;
use crate::state::AppState;
use crate::upstream::Credentials;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<RefreshStatus>,
}

#[derive(Debug, Serialize)]
pub struct RefreshStatus {
    pub kind: RefreshKind,
    pub due_in_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub username: String,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let refresh = s.session.pending_refresh().map(|p| RefreshStatus {
        kind: p.kind,
        due_in_secs: p.due.saturating_duration_since(Instant::now()).as_secs(),
    });
    Json(HealthResponse {
        status: "running".to_owned(),
        authenticated: s.session.is_authenticated(),
        refresh,
    })
}

/// `POST /auth`: sign in upstream, keep the token, and start the refresh cycle.
pub async fn login(
    State(s): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return ErrorCode::BadRequest
                .to_http_response(
                    "request body must be JSON with username and password",
                    Some(serde_json::Value::String(rejection.body_text())),
                )
                .into_response();
        }
    };

    if req.username.trim().is_empty() || req.password.is_empty() {
        return ErrorCode::BadRequest
            .to_http_response("username and password are required", None)
            .into_response();
    }

    match s.session.login(Credentials::new(req.username, req.password)).await {
        Ok(token) => Json(LoginResponse { token }).into_response(),
        Err(e) => ErrorCode::AuthenticationFailed
            .to_http_response("Failed to authenticate with Obvious.", Some(e.details()))
            .into_response(),
    }
}

/// `GET /alarms`: upstream alarm listing plus supplemental records.
pub async fn list_alarms(
    State(s): State<Arc<AppState>>,
    Query(query): Query<AlarmQuery>,
) -> Response {
    match fetch_alarms(&s, &query).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => guard_error_response(e, "Failed to retrieve alarms."),
    }
}

/// `GET /alarms/summary`: counts over the same listing.
pub async fn alarm_summary(
    State(s): State<Arc<AppState>>,
    Query(query): Query<AlarmQuery>,
) -> Response {
    match fetch_alarms(&s, &query).await {
        Ok(list) => Json(AlarmSummary::from_alarms(&list)).into_response(),
        Err(e) => guard_error_response(e, "Failed to retrieve alarms."),
    }
}

/// `GET /self`: username of the authenticated upstream account.
pub async fn whoami(State(s): State<Arc<AppState>>) -> Response {
    let upstream = s.session.upstream();
    let profile =
        with_auth_retry(&s.session, |token| async move { upstream.myself(&token).await }).await;

    match profile {
        Ok(profile) => match profile.get("username").and_then(|u| u.as_str()) {
            Some(username) => {
                Json(WhoamiResponse { username: username.to_owned() }).into_response()
            }
            None => ErrorCode::UpstreamUnavailable
                .to_http_response(
                    "Failed to get user info",
                    Some(serde_json::Value::String("profile has no username field".to_owned())),
                )
                .into_response(),
        },
        Err(e) => guard_error_response(e, "Failed to get user info"),
    }
}

// -- Helpers ------------------------------------------------------------------

async fn fetch_alarms(
    s: &AppState,
    query: &AlarmQuery,
) -> Result<Vec<serde_json::Value>, GuardError> {
    let upstream = s.session.upstream();
    let listing =
        with_auth_retry(&s.session, |token| async move { upstream.list_alarms(&token, query).await })
            .await?;
    Ok(alarms::merge(listing, &s.supplemental_alarms))
}

/// Map a guarded-call failure to its HTTP response.
fn guard_error_response(err: GuardError, failure_message: &str) -> Response {
    match err {
        GuardError::MissingToken => ErrorCode::MissingToken
            .to_http_response("Authorization token is missing. Please authenticate first.", None)
            .into_response(),
        GuardError::Upstream(e) if e.is_unauthorized() => {
            tracing::warn!(err = %e, "upstream still rejects token after re-authentication");
            ErrorCode::UpstreamUnauthorized
                .to_http_response("Authorization token is expired or invalid.", Some(e.details()))
                .into_response()
        }
        GuardError::Upstream(e) => {
            tracing::warn!(err = %e, "{failure_message}");
            ErrorCode::UpstreamUnavailable
                .to_http_response(failure_message, Some(e.details()))
                .into_response()
        }
    }
}
