// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the gateway.

pub mod auth;
pub mod http;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the axum `Router` with all gateway routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Data plane: rejected before the handler runs until a login succeeds.
    let guarded = Router::new()
        .route("/alarms", get(http::list_alarms))
        .route("/protected-resource", get(http::list_alarms))
        .route("/alarms/summary", get(http::alarm_summary))
        .route("/self", get(http::whoami))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::token_guard));

    Router::new()
        // Health (no guard)
        .route("/api/v1/health", get(http::health))
        // Login
        .route("/auth", post(http::login))
        .route("/auth-obvious", post(http::login))
        .merge(guarded)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
