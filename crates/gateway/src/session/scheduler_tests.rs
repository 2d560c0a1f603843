// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer branches under a paused tokio clock. Sleeping in the test advances
//! time to the next deadline, so every refresh fires deterministically.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::test_support::{test_session, unavailable, MockUpstream};
use crate::upstream::Credentials;

use super::*;

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn assert_due(info: Option<RefreshInfo>, kind: RefreshKind, at: Instant) {
    let info = info.expect("expected a pending refresh");
    assert_eq!(info.kind, kind);
    assert!(
        info.due >= at && info.due < at + secs(1),
        "refresh due {:?} after expected",
        info.due.saturating_duration_since(at)
    );
}

#[tokio::test(start_paused = true)]
async fn rearming_cancels_previous_timer() -> anyhow::Result<()> {
    let upstream = Arc::new(MockUpstream::new().with_signin(vec![Ok("abc123".into())]));
    let session = test_session(&upstream);

    session.login(Credentials::new("alice", "secret")).await?;
    assert_eq!(session.live_timers(), 1);

    session.login(Credentials::new("alice", "secret")).await?;
    session.login(Credentials::new("alice", "secret")).await?;
    // Let the cancelled countdowns observe cancellation.
    sleep(Duration::from_millis(1)).await;
    assert_eq!(session.live_timers(), 1);

    // Only the newest timer fires.
    sleep(secs(601)).await;
    assert_eq!(upstream.signin_calls(), 4);
    assert_eq!(session.live_timers(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn successful_refresh_rearms_full_interval() -> anyhow::Result<()> {
    let upstream =
        Arc::new(MockUpstream::new().with_signin(vec![Ok("t1".into()), Ok("t2".into())]));
    let session = test_session(&upstream);

    let start = Instant::now();
    session.login(Credentials::new("alice", "secret")).await?;
    assert_due(session.pending_refresh(), RefreshKind::Full, start + secs(600));

    sleep(secs(599)).await;
    assert_eq!(upstream.signin_calls(), 1, "refresh fired early");
    assert_eq!(session.token().as_deref(), Some("t1"));

    sleep(secs(2)).await;
    assert_eq!(upstream.signin_calls(), 2);
    assert_eq!(session.token().as_deref(), Some("t2"));
    assert_due(session.pending_refresh(), RefreshKind::Full, start + secs(1200));
    assert_eq!(session.live_timers(), 1);
    assert_eq!(upstream.signins()[1], Credentials::new("alice", "secret"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_token_and_retries_sooner() -> anyhow::Result<()> {
    let upstream = Arc::new(MockUpstream::new().with_signin(vec![
        Ok("t1".into()),
        Err(unavailable(500)),
        Ok("t3".into()),
    ]));
    let session = test_session(&upstream);

    let start = Instant::now();
    session.login(Credentials::new("alice", "secret")).await?;

    sleep(secs(601)).await;
    assert_eq!(upstream.signin_calls(), 2);
    assert_eq!(session.token().as_deref(), Some("t1"), "stale token must be kept");
    assert_due(session.pending_refresh(), RefreshKind::Retry, start + secs(660));
    assert_eq!(session.live_timers(), 1);

    sleep(secs(58)).await;
    assert_eq!(upstream.signin_calls(), 2, "retry fired early");

    sleep(secs(2)).await;
    assert_eq!(upstream.signin_calls(), 3);
    assert_eq!(session.token().as_deref(), Some("t3"));
    assert_due(session.pending_refresh(), RefreshKind::Full, start + secs(1260));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn persistent_failure_keeps_retrying_at_short_interval() -> anyhow::Result<()> {
    let upstream =
        Arc::new(MockUpstream::new().with_signin(vec![Ok("t1".into()), Err(unavailable(502))]));
    let session = test_session(&upstream);
    session.login(Credentials::new("alice", "secret")).await?;

    sleep(secs(601)).await;
    assert_eq!(upstream.signin_calls(), 2);
    for expected in 3..=5 {
        sleep(secs(60)).await;
        assert_eq!(upstream.signin_calls(), expected);
        assert_eq!(session.pending_refresh().map(|p| p.kind), Some(RefreshKind::Retry));
    }
    assert_eq!(session.token().as_deref(), Some("t1"));
    assert_eq!(session.live_timers(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn inline_reauthentication_replaces_retry_timer() -> anyhow::Result<()> {
    let upstream = Arc::new(MockUpstream::new().with_signin(vec![
        Ok("t1".into()),
        Err(unavailable(500)),
        Ok("t3".into()),
    ]));
    let session = test_session(&upstream);
    session.login(Credentials::new("alice", "secret")).await?;

    sleep(secs(601)).await;
    assert_eq!(session.pending_refresh().map(|p| p.kind), Some(RefreshKind::Retry));

    let now = Instant::now();
    session.reauthenticate().await?;
    assert_due(session.pending_refresh(), RefreshKind::Full, now + secs(600));
    sleep(Duration::from_millis(1)).await;
    assert_eq!(session.live_timers(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_cycle() -> anyhow::Result<()> {
    let upstream = Arc::new(MockUpstream::new().with_signin(vec![Ok("t1".into())]));
    let session = test_session(&upstream);
    session.login(Credentials::new("alice", "secret")).await?;

    session.shutdown();
    sleep(secs(3600)).await;
    assert_eq!(upstream.signin_calls(), 1);
    assert_eq!(session.live_timers(), 0);
    Ok(())
}
