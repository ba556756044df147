//! Payload expansion.
//! One template row with `Payloads = "A|B|C"` becomes three sibling panel rows,
//! each titled `"<template> <payload>"` with `${scid}` replaced by the payload in
//! the table name and source id.

use crate::config::ConfigRow;
use crate::query::DEFAULT_SOURCE_ID;

pub const PAYLOAD_PLACEHOLDER: &str = "${scid}";
const PAYLOAD_DELIMITER: char = '|';

/// Expands every eligible row in place order. Rows without payloads pass through.
pub fn expand(rows: Vec<ConfigRow>) -> Vec<ConfigRow> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let payloads = payload_values(&row);
        if payloads.is_empty() {
            out.push(row);
            continue;
        }
        out.extend(payloads.iter().map(|payload| expand_one(&row, payload)));
    }
    out
}

fn payload_values(row: &ConfigRow) -> Vec<String> {
    if row.is_additional_target || row.panel_template.is_none() {
        return Vec::new();
    }
    row.payloads
        .as_deref()
        .map(|raw| {
            raw.split(PAYLOAD_DELIMITER)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn expand_one(row: &ConfigRow, payload: &str) -> ConfigRow {
    let template = row.panel_template.as_deref().unwrap_or_default();
    let source_id = row.source_id.as_deref().unwrap_or(DEFAULT_SOURCE_ID);

    ConfigRow {
        panel_title: Some(format!("{template} {payload}")),
        table_name: row
            .table_name
            .as_ref()
            .map(|t| t.replace(PAYLOAD_PLACEHOLDER, payload)),
        source_id: Some(source_id.replace(PAYLOAD_PLACEHOLDER, payload)),
        payloads: None,
        ..row.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(template: &str, payloads: Option<&str>, table: Option<&str>) -> ConfigRow {
        ConfigRow {
            section: "Payloads".into(),
            panel_template: Some(template.into()),
            payloads: payloads.map(Into::into),
            table_name: table.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn test_expand_substitutes_placeholder_and_titles() {
        let rows = expand(vec![panel("TEMP", Some("A|B"), Some("T_${scid}"))]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].table_name.as_deref(), Some("T_A"));
        assert_eq!(rows[1].table_name.as_deref(), Some("T_B"));
        assert_eq!(rows[0].panel_title.as_deref(), Some("TEMP A"));
        assert_eq!(rows[1].panel_title.as_deref(), Some("TEMP B"));
        assert_eq!(rows[0].source_id.as_deref(), Some("A"));
        assert!(rows.iter().all(|r| r.payloads.is_none()));
    }

    #[test]
    fn test_expand_preserves_order_and_count() {
        let extra = ConfigRow {
            section: "Payloads".into(),
            is_additional_target: true,
            payloads: Some("X|Y".into()),
            ..Default::default()
        };
        let rows = vec![
            panel("PLAIN", None, None),
            panel("TEMP", Some("A| B |C"), Some("T_${scid}")),
            extra.clone(),
            panel("LAST", None, None),
        ];
        let out = expand(rows);
        // 4 rows - 1 expandable + 3 payloads
        assert_eq!(out.len(), 6);
        assert_eq!(out[0].panel_template.as_deref(), Some("PLAIN"));
        assert_eq!(out[3].table_name.as_deref(), Some("T_C"));
        assert_eq!(out[4], extra);
        assert_eq!(out[5].panel_template.as_deref(), Some("LAST"));
    }

    #[test]
    fn test_explicit_source_id_is_substituted() {
        let mut row = panel("TEMP", Some("SC1"), None);
        row.source_id = Some("fleet-${scid}".into());
        let out = expand(vec![row]);
        assert_eq!(out[0].source_id.as_deref(), Some("fleet-SC1"));
        assert_eq!(out[0].table_name, None);
    }

    #[test]
    fn test_rows_without_template_are_not_expanded() {
        let row = ConfigRow {
            section: "Payloads".into(),
            panel_title: Some("Titled".into()),
            payloads: Some("A|B".into()),
            ..Default::default()
        };
        let out = expand(vec![row.clone()]);
        assert_eq!(out, vec![row]);
    }
}
