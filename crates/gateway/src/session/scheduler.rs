// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Self-rearming token refresh timer.
//!
//! Each arm spawns one delayed task and stores its handle in the session,
//! cancelling whatever handle was there before. A firing task re-authenticates;
//! success re-arms at the full interval (via the authenticator), failure at the
//! retry interval.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::Session;

/// Which delay a pending refresh was armed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshKind {
    /// Regular cycle after a successful authentication.
    Full,
    /// Short retry after a failed background refresh.
    Retry,
}

/// Handle to the single scheduled re-authentication.
pub struct PendingRefresh {
    id: u64,
    kind: RefreshKind,
    due: Instant,
    cancel: CancellationToken,
}

impl PendingRefresh {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Read-only view of the pending refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshInfo {
    pub kind: RefreshKind,
    pub due: Instant,
}

/// Decrements the live-timer count when a countdown task ends, however it ends.
struct LiveTimer(Arc<AtomicUsize>);

impl LiveTimer {
    fn start(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(count))
    }
}

impl Drop for LiveTimer {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Session {
    /// Kind and due time of the pending refresh, if one is armed.
    pub fn pending_refresh(&self) -> Option<RefreshInfo> {
        self.pending.lock().as_ref().map(|p| RefreshInfo { kind: p.kind, due: p.due })
    }

    /// Number of refresh countdowns that have not yet fired or observed cancellation.
    pub fn live_timers(&self) -> usize {
        self.live_timers.load(Ordering::SeqCst)
    }

    /// Replace any pending refresh with a new one of `kind`.
    pub(crate) fn arm(self: &Arc<Self>, kind: RefreshKind) {
        self.arm_with(kind, true);
    }

    /// Arm only when nothing else has armed in the meantime.
    pub(crate) fn arm_if_idle(self: &Arc<Self>, kind: RefreshKind) {
        self.arm_with(kind, false);
    }

    fn arm_with(self: &Arc<Self>, kind: RefreshKind, replace: bool) {
        if self.shutdown.is_cancelled() {
            debug!("session shut down, not arming refresh");
            return;
        }

        let delay = self.policy.delay_for(kind);
        let id = self.next_timer_id.fetch_add(1, Ordering::Relaxed);
        let cancel = self.shutdown.child_token();
        let live = LiveTimer::start(&self.live_timers);
        {
            let mut slot = self.pending.lock();
            if let Some(prev) = slot.as_ref() {
                if !replace {
                    debug!(kind = ?prev.kind, "refresh already armed, keeping it");
                    return;
                }
                prev.cancel();
            }
            *slot = Some(PendingRefresh {
                id,
                kind,
                due: Instant::now() + delay,
                cancel: cancel.clone(),
            });
        }
        debug!(?kind, delay_secs = delay.as_secs(), "token refresh armed");

        let session = Arc::clone(self);
        tokio::spawn(async move {
            {
                let _live = live;
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            session.fire(id).await;
        });
    }

    /// Timer callback: re-authenticate, re-arming short on failure.
    async fn fire(self: &Arc<Self>, id: u64) {
        {
            let mut slot = self.pending.lock();
            // Replaced after the countdown finished.
            if slot.as_ref().map(|p| p.id) != Some(id) {
                return;
            }
            slot.take();
        }

        info!("refreshing token");
        if let Err(e) = self.reauthenticate().await {
            warn!(
                err = %e,
                retry_secs = self.policy.retry_interval.as_secs(),
                "token refresh failed, keeping previous token"
            );
            self.arm_if_idle(RefreshKind::Retry);
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
