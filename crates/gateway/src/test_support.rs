// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: a scripted upstream and assertion helpers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::alarms::AlarmQuery;
use crate::session::{RefreshPolicy, Session};
use crate::upstream::{Credentials, Upstream, UpstreamError, UpstreamFuture};

/// Queue of canned results. Pops until one remains, then repeats it.
struct Script<T: Clone> {
    queue: Mutex<VecDeque<Result<T, UpstreamError>>>,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self { queue: Mutex::new(VecDeque::new()) }
    }

    fn set(&self, results: Vec<Result<T, UpstreamError>>) {
        *self.queue.lock() = results.into();
    }

    fn next(&self) -> Result<T, UpstreamError> {
        let mut queue = self.queue.lock();
        if queue.len() > 1 {
            if let Some(result) = queue.pop_front() {
                return result;
            }
        }
        queue.front().cloned().unwrap_or_else(|| Err(unavailable(500)))
    }
}

/// In-memory [`Upstream`] with scripted responses and call accounting.
pub struct MockUpstream {
    signin: Script<String>,
    alarms: Script<serde_json::Value>,
    myself: Script<serde_json::Value>,
    signin_calls: AtomicU32,
    alarms_calls: AtomicU32,
    myself_calls: AtomicU32,
    signins: Mutex<Vec<Credentials>>,
    bearer_tokens: Mutex<Vec<String>>,
}

impl Default for MockUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUpstream {
    pub fn new() -> Self {
        Self {
            signin: Script::new(),
            alarms: Script::new(),
            myself: Script::new(),
            signin_calls: AtomicU32::new(0),
            alarms_calls: AtomicU32::new(0),
            myself_calls: AtomicU32::new(0),
            signins: Mutex::new(Vec::new()),
            bearer_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn with_signin(self, results: Vec<Result<String, UpstreamError>>) -> Self {
        self.signin.set(results);
        self
    }

    pub fn with_alarms(self, results: Vec<Result<serde_json::Value, UpstreamError>>) -> Self {
        self.alarms.set(results);
        self
    }

    pub fn with_myself(self, results: Vec<Result<serde_json::Value, UpstreamError>>) -> Self {
        self.myself.set(results);
        self
    }

    /// Replace the signin script mid-test.
    pub fn script_signin(&self, results: Vec<Result<String, UpstreamError>>) {
        self.signin.set(results);
    }

    pub fn signin_calls(&self) -> u32 {
        self.signin_calls.load(Ordering::SeqCst)
    }

    pub fn alarms_calls(&self) -> u32 {
        self.alarms_calls.load(Ordering::SeqCst)
    }

    pub fn myself_calls(&self) -> u32 {
        self.myself_calls.load(Ordering::SeqCst)
    }

    /// Total outbound calls of any kind.
    pub fn total_calls(&self) -> u32 {
        self.signin_calls() + self.alarms_calls() + self.myself_calls()
    }

    /// Credentials seen by signin, in call order.
    pub fn signins(&self) -> Vec<Credentials> {
        self.signins.lock().clone()
    }

    /// Bearer tokens presented to data-plane calls, in call order.
    pub fn bearer_tokens(&self) -> Vec<String> {
        self.bearer_tokens.lock().clone()
    }
}

impl Upstream for MockUpstream {
    fn signin<'a>(&'a self, credentials: &'a Credentials) -> UpstreamFuture<'a, String> {
        self.signin_calls.fetch_add(1, Ordering::SeqCst);
        self.signins.lock().push(credentials.clone());
        let result = self.signin.next();
        Box::pin(async move { result })
    }

    fn list_alarms<'a>(
        &'a self,
        token: &'a str,
        _query: &'a AlarmQuery,
    ) -> UpstreamFuture<'a, serde_json::Value> {
        self.alarms_calls.fetch_add(1, Ordering::SeqCst);
        self.bearer_tokens.lock().push(token.to_owned());
        let result = self.alarms.next();
        Box::pin(async move { result })
    }

    fn myself<'a>(&'a self, token: &'a str) -> UpstreamFuture<'a, serde_json::Value> {
        self.myself_calls.fetch_add(1, Ordering::SeqCst);
        self.bearer_tokens.lock().push(token.to_owned());
        let result = self.myself.next();
        Box::pin(async move { result })
    }
}

/// A 401 from the upstream.
pub fn unauthorized() -> UpstreamError {
    UpstreamError::Unauthorized {
        status: 401,
        details: serde_json::json!({ "message": "token expired" }),
    }
}

/// A non-auth error status from the upstream.
pub fn unavailable(status: u16) -> UpstreamError {
    UpstreamError::Unavailable {
        status: Some(status),
        message: format!("upstream returned {status}"),
        details: serde_json::json!({ "message": "internal error" }),
    }
}

/// Session over `upstream` with the reference 10 minute / 1 minute policy.
pub fn test_session(upstream: &Arc<MockUpstream>) -> Arc<Session> {
    let upstream: Arc<dyn Upstream> = Arc::clone(upstream) as Arc<dyn Upstream>;
    Session::new(upstream, RefreshPolicy::default())
}

/// Assert that a `Result` is `Err` and its message contains `$substr`.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
