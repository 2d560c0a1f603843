// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alarm listing support: query pass-through, supplemental records, summary.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Query parameters forwarded verbatim to the upstream alarm listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmQuery {
    #[serde(rename = "Filters", default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
    #[serde(rename = "Sorts", default, skip_serializing_if = "Option::is_none")]
    pub sorts: Option<String>,
    #[serde(rename = "Page", default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(rename = "PageSize", default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Load the supplemental alarm records file. The file must hold a JSON array.
pub fn load_supplemental(path: &Path) -> anyhow::Result<Vec<serde_json::Value>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {} as JSON", path.display()))?;
    match parsed {
        serde_json::Value::Array(records) => Ok(records),
        _ => anyhow::bail!("{} must contain a JSON array of alarms", path.display()),
    }
}

/// Combine an upstream listing with the supplemental records.
///
/// An array response is extended; any other value becomes the first element.
pub fn merge(upstream: serde_json::Value, supplemental: &[serde_json::Value]) -> Vec<serde_json::Value> {
    let mut combined = match upstream {
        serde_json::Value::Array(records) => records,
        other => vec![other],
    };
    combined.extend_from_slice(supplemental);
    combined
}

/// Aggregate counts over a set of alarm records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSummary {
    pub total: usize,
    /// Records whose `status` is `Opened`.
    pub open: usize,
    /// Distinct categories in first-seen order.
    pub categories: Vec<String>,
    /// Distinct severities in first-seen order.
    pub severities: Vec<String>,
    /// Record count keyed by `YYYY-MM` of `creationDate`.
    pub by_month: BTreeMap<String, usize>,
}

impl AlarmSummary {
    pub fn from_alarms(alarms: &[serde_json::Value]) -> Self {
        let mut summary = Self { total: alarms.len(), ..Self::default() };
        for alarm in alarms {
            if alarm.get("status").and_then(|s| s.as_str()) == Some("Opened") {
                summary.open += 1;
            }
            push_distinct(&mut summary.categories, alarm.get("category"));
            push_distinct(&mut summary.severities, alarm.get("severity"));
            if let Some(month) = alarm.get("creationDate").and_then(|d| d.as_str()).and_then(year_month)
            {
                *summary.by_month.entry(month).or_default() += 1;
            }
        }
        summary
    }
}

fn push_distinct(seen: &mut Vec<String>, value: Option<&serde_json::Value>) {
    if let Some(s) = value.and_then(|v| v.as_str()) {
        if !s.is_empty() && !seen.iter().any(|x| x == s) {
            seen.push(s.to_owned());
        }
    }
}

/// `2025-02-26T12:10:00.000Z` -> `2025-02`.
fn year_month(date: &str) -> Option<String> {
    let prefix = date.get(..7)?;
    let bytes = prefix.as_bytes();
    let digits = |r: std::ops::Range<usize>| bytes[r].iter().all(u8::is_ascii_digit);
    if digits(0..4) && bytes[4] == b'-' && digits(5..7) {
        Some(prefix.to_owned())
    } else {
        None
    }
}

#[cfg(test)]
#[path = "alarms_tests.rs"]
mod tests;
