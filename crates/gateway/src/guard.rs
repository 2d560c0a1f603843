// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token gate and single inline re-authentication for data-plane calls.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::session::Session;
use crate::upstream::UpstreamError;

/// Failure of a guarded call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GuardError {
    /// No login has succeeded yet; nothing was sent upstream.
    #[error("authorization token is missing, authenticate first")]
    MissingToken,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Current token, or [`GuardError::MissingToken`].
pub fn require_token(session: &Session) -> Result<String, GuardError> {
    session.token().ok_or(GuardError::MissingToken)
}

/// Run `call` with the session token. If the upstream rejects it, re-authenticate
/// once with the captured credentials and retry once with the new token.
///
/// A second failure, or a failed re-authentication, is returned as is.
pub async fn with_auth_retry<T, F, Fut>(session: &Arc<Session>, mut call: F) -> Result<T, GuardError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let token = require_token(session)?;
    match call(token).await {
        Err(e) if e.is_unauthorized() => {
            debug!(err = %e, "upstream rejected token, re-authenticating once");
            let fresh = match session.reauthenticate().await {
                Ok(token) => token,
                Err(reauth) => {
                    warn!(err = %reauth, "inline re-authentication failed");
                    return Err(GuardError::Upstream(e));
                }
            };
            Ok(call(fresh).await?)
        }
        result => Ok(result?),
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
