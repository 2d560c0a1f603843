// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Obvious gateway: authenticating proxy for the Obvious incident-management API.

pub mod alarms;
pub mod config;
pub mod error;
pub mod guard;
pub mod session;
pub mod state;
pub mod test_support;
pub mod transport;
pub mod upstream;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::session::{RefreshPolicy, Session};
use crate::state::AppState;
use crate::transport::build_router;
use crate::upstream::client::ObviousClient;
use crate::upstream::Upstream;

/// Run the gateway until shutdown.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let base_url = config.base_url()?.to_owned();
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let supplemental_alarms = match config.supplemental_alarms {
        Some(ref path) => alarms::load_supplemental(path)?,
        None => vec![],
    };

    let upstream: Arc<dyn Upstream> =
        Arc::new(ObviousClient::new(base_url.clone(), config.upstream_timeout())?);
    let policy = RefreshPolicy {
        interval: config.refresh_interval(),
        retry_interval: config.retry_interval(),
    };
    let session = Session::new(upstream, policy);
    let state = Arc::new(AppState::new(Arc::clone(&session), supplemental_alarms));

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            tracing::info!("shutdown requested");
            shutdown.cancel();
        });
    }

    tracing::info!(
        upstream = %base_url,
        refresh_secs = policy.interval.as_secs(),
        retry_secs = policy.retry_interval.as_secs(),
        supplemental = state.supplemental_alarms.len(),
        "obvious-gateway listening on {addr}"
    );
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    session.shutdown();
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(err = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
