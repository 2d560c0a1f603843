// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::session::Session;

/// Shared gateway state handed to every handler.
pub struct AppState {
    pub session: Arc<Session>,
    /// Extra alarm records appended to every upstream listing.
    pub supplemental_alarms: Vec<serde_json::Value>,
}

impl AppState {
    pub fn new(session: Arc<Session>, supplemental_alarms: Vec<serde_json::Value>) -> Self {
        Self { session, supplemental_alarms }
    }
}
