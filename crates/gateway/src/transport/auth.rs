// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ErrorCode;
use crate::guard::{require_token, GuardError};
use crate::state::AppState;

/// Axum middleware that rejects data-plane requests until a login has succeeded.
///
/// The guarded handler never runs, and nothing is sent upstream, without a token.
pub async fn token_guard(
    state: State<Arc<AppState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Err(GuardError::MissingToken) = require_token(&state.session) {
        tracing::debug!(path = %req.uri().path(), "rejecting request without upstream token");
        return ErrorCode::MissingToken
            .to_http_response("Authorization token is missing. Please authenticate first.", None)
            .into_response();
    }

    next.run(req).await
}
