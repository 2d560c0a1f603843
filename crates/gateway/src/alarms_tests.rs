// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use serde_json::json;

use super::*;

#[test]
fn merge_appends_supplemental_to_array() {
    let extra = vec![json!({ "id": "local-1" })];
    let merged = merge(json!([{ "id": "u1" }, { "id": "u2" }]), &extra);
    let ids: Vec<&str> = merged.iter().filter_map(|a| a["id"].as_str()).collect();
    assert_eq!(ids, vec!["u1", "u2", "local-1"]);
}

#[test]
fn merge_wraps_non_array_response() {
    let extra = vec![json!({ "id": "local-1" })];
    let merged = merge(json!({ "items": [], "total": 0 }), &extra);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0]["total"], 0);
    assert_eq!(merged[1]["id"], "local-1");
}

#[test]
fn query_serializes_upstream_parameter_names() -> anyhow::Result<()> {
    let query = AlarmQuery {
        sorts: Some("-creationDate".to_owned()),
        search: Some("tunis".to_owned()),
        ..Default::default()
    };
    let value = serde_json::to_value(&query)?;
    assert_eq!(value, json!({ "Sorts": "-creationDate", "search": "tunis" }));
    Ok(())
}

#[test]
fn summary_counts_open_categories_and_months() {
    let alarms = vec![
        json!({ "status": "Opened", "category": "Theft", "severity": "High",
                "creationDate": "2025-02-26T12:10:00.000Z" }),
        json!({ "status": "Closed", "category": "Assault", "severity": "Unknown",
                "creationDate": "2025-02-01T08:00:00Z" }),
        json!({ "status": "Opened", "category": "Theft", "severity": null,
                "creationDate": "2025-03-10T00:00:00Z" }),
        json!({ "status": "Opened", "creationDate": 45713 }),
    ];

    let summary = AlarmSummary::from_alarms(&alarms);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.open, 3);
    assert_eq!(summary.categories, vec!["Theft", "Assault"]);
    assert_eq!(summary.severities, vec!["High", "Unknown"]);
    assert_eq!(summary.by_month.get("2025-02"), Some(&2));
    assert_eq!(summary.by_month.get("2025-03"), Some(&1));
    assert_eq!(summary.by_month.len(), 2);
}

#[test]
fn summary_of_nothing_is_empty() {
    assert_eq!(AlarmSummary::from_alarms(&[]), AlarmSummary::default());
}

#[yare::parameterized(
    iso        = { "2025-02-26T12:10:00.000Z", Some("2025-02") },
    date_only  = { "2024-12-01", Some("2024-12") },
    too_short  = { "2025-0", None },
    not_a_date = { "yesterday", None },
)]
fn year_month_prefix(input: &str, expected: Option<&str>) {
    assert_eq!(year_month(input).as_deref(), expected);
}

#[test]
fn load_supplemental_requires_array() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join(format!("obvious-gateway-alarms-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;

    let good = dir.join("good.json");
    std::fs::File::create(&good)?.write_all(br#"[{"id":"x"}]"#)?;
    let records = load_supplemental(&good)?;
    assert_eq!(records.len(), 1);

    let bad = dir.join("bad.json");
    std::fs::File::create(&bad)?.write_all(br#"{"id":"x"}"#)?;
    crate::assert_err_contains!(load_supplemental(&bad), "JSON array");

    let malformed = dir.join("malformed.json");
    std::fs::File::create(&malformed)?.write_all(b"[{not json")?;
    crate::assert_err_contains!(load_supplemental(&malformed), "failed to parse");
    crate::assert_err_contains!(load_supplemental(&malformed), "malformed.json");

    crate::assert_err_contains!(load_supplemental(&dir.join("missing.json")), "failed to read");

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}
