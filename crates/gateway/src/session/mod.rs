// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream session: the current bearer token, the credentials that obtained
//! it, and the background refresh that keeps it fresh.

pub mod scheduler;

use std::sync::atomic::{AtomicU64, AtomicUsize};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::upstream::{fingerprint, Credentials, Upstream, UpstreamError};

pub use scheduler::{PendingRefresh, RefreshInfo, RefreshKind};

/// Delays used by the refresh scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Delay after a successful (re-)authentication.
    pub interval: Duration,
    /// Delay after a failed background refresh.
    pub retry_interval: Duration,
}

impl RefreshPolicy {
    pub fn delay_for(&self, kind: RefreshKind) -> Duration {
        match kind {
            RefreshKind::Full => self.interval,
            RefreshKind::Retry => self.retry_interval,
        }
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self { interval: Duration::from_secs(600), retry_interval: Duration::from_secs(60) }
    }
}

/// Credentials from the latest successful login, numbered so a refresh can
/// tell whether they were replaced while it was in flight.
#[derive(Clone)]
struct Captured {
    generation: u64,
    credentials: Credentials,
}

/// Process-lifetime authentication state shared by every handler.
///
/// Token and credential updates are single assignments under a short lock
/// with no await in between, so readers see either the old or the new value.
pub struct Session {
    upstream: Arc<dyn Upstream>,
    policy: RefreshPolicy,
    token: RwLock<Option<String>>,
    credentials: RwLock<Option<Captured>>,
    pending: Mutex<Option<PendingRefresh>>,
    next_timer_id: AtomicU64,
    live_timers: Arc<AtomicUsize>,
    shutdown: CancellationToken,
}

impl Session {
    pub fn new(upstream: Arc<dyn Upstream>, policy: RefreshPolicy) -> Arc<Self> {
        Arc::new(Self {
            upstream,
            policy,
            token: RwLock::new(None),
            credentials: RwLock::new(None),
            pending: Mutex::new(None),
            next_timer_id: AtomicU64::new(0),
            live_timers: Arc::new(AtomicUsize::new(0)),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn upstream(&self) -> &dyn Upstream {
        self.upstream.as_ref()
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Current bearer token, if any login has succeeded.
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// Username of the captured credentials.
    pub fn username(&self) -> Option<String> {
        self.credentials.read().as_ref().map(|c| c.credentials.username.clone())
    }

    /// Explicit login: authenticate with `credentials` and, on success,
    /// capture them for every later refresh.
    ///
    /// On failure the session is left untouched and no retry is scheduled.
    pub async fn login(self: &Arc<Self>, credentials: Credentials) -> Result<String, UpstreamError> {
        self.authenticate(credentials, None).await
    }

    /// Re-authenticate with the captured credentials.
    ///
    /// If a login replaces the credentials while the signin is in flight, the
    /// result is dropped and the token from that login is returned instead.
    pub async fn reauthenticate(self: &Arc<Self>) -> Result<String, UpstreamError> {
        let captured = self.credentials.read().clone().ok_or(UpstreamError::NoCredentials)?;
        self.authenticate(captured.credentials, Some(captured.generation)).await
    }

    /// One signin exchange. `generation` is the captured generation a refresh
    /// started from, or `None` for an explicit login.
    ///
    /// Success replaces the token and arms a full-interval refresh.
    async fn authenticate(
        self: &Arc<Self>,
        credentials: Credentials,
        generation: Option<u64>,
    ) -> Result<String, UpstreamError> {
        let token = match self.upstream.signin(&credentials).await {
            Ok(token) => token,
            Err(e) => {
                warn!(username = %credentials.username, err = %e, "authentication failed");
                return Err(e);
            }
        };
        let username = credentials.username.clone();

        {
            // Token and credentials change together under the credentials lock.
            let mut captured = self.credentials.write();
            let current = captured.as_ref().map(|c| c.generation);
            match generation {
                Some(started) if current != Some(started) => {
                    debug!(username = %username, "credentials replaced during refresh, dropping token");
                    return self.token().ok_or(UpstreamError::NoCredentials);
                }
                Some(_) => {}
                None => {
                    let generation = current.map_or(1, |g| g + 1);
                    *captured = Some(Captured { generation, credentials });
                }
            }
            *self.token.write() = Some(token.clone());
        }

        info!(username = %username, token = %fingerprint(&token), "token acquired");
        self.arm(RefreshKind::Full);
        Ok(token)
    }

    /// Cancel the pending refresh and stop arming new ones.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        if let Some(prev) = self.pending.lock().take() {
            prev.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
