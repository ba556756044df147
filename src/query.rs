//! SQL text for panel targets.
//! State-timeline panels need the timestamp column for their time axis; every
//! other panel type reads the latest value only.

use crate::config::ConfigRow;

pub const DEFAULT_ENG_FIELD: &str = "eng_str";
pub const DEFAULT_TIME_FIELD: &str = "ert";
pub const DEFAULT_TABLE_NAME: &str = "STATE_MACH_TARGET_STATE";
pub const DEFAULT_SOURCE_ID: &str = "${scid}";

pub const STATE_TIMELINE: &str = "state-timeline";

/// Column names for one target, with per-field defaults applied.
struct QueryParts<'a> {
    field: &'a str,
    time: &'a str,
    table: &'a str,
    source_id: &'a str,
    alias: &'a str,
}

impl<'a> QueryParts<'a> {
    fn from_row(row: &'a ConfigRow) -> Self {
        Self {
            field: row.eng_field.as_deref().unwrap_or(DEFAULT_ENG_FIELD),
            time: row.time_field.as_deref().unwrap_or(DEFAULT_TIME_FIELD),
            table: row.table_name.as_deref().unwrap_or(DEFAULT_TABLE_NAME),
            source_id: row.source_id.as_deref().unwrap_or(DEFAULT_SOURCE_ID),
            alias: row.column_alias.as_deref().unwrap_or(" "),
        }
    }
}

/// Builds the raw SQL for `row`, choosing the builder by the owning panel's type.
pub fn build_query(row: &ConfigRow, panel_type: &str) -> String {
    let parts = QueryParts::from_row(row);
    if panel_type == STATE_TIMELINE {
        state_timeline_query(&parts)
    } else {
        standard_query(&parts)
    }
}

fn state_timeline_query(p: &QueryParts<'_>) -> String {
    [
        "SELECT".to_string(),
        format!("  \"{}\" AS \"{}\",", p.field, p.alias),
        format!("  from_unixtime(\"{}\") AS \"time\"", p.time),
        "FROM".to_string(),
        format!("  \"{}\"", p.table),
        "WHERE".to_string(),
        format!("  \"{}\" >= $__timeFrom::bigint", p.time),
        format!("  AND \"{}\" <= $__timeTo::bigint", p.time),
        format!("  AND \"spacecraft_id\" = '{}'", p.source_id),
        format!("ORDER BY \"{}\" ASC", p.time),
        String::new(),
    ]
    .join("\r\n")
}

fn standard_query(p: &QueryParts<'_>) -> String {
    [
        "SELECT".to_string(),
        format!("  \"{}\" AS \"{}\"", p.field, p.alias),
        "FROM".to_string(),
        format!("  \"{}\"", p.table),
        "WHERE".to_string(),
        format!("  \"{}\" >= $__timeFrom::bigint", p.time),
        format!("  AND \"{}\" <= $__timeTo::bigint", p.time),
        format!("  AND \"spacecraft_id\" = '{}'", p.source_id),
        format!("ORDER BY \"{}\" DESC", p.time),
        String::new(),
    ]
    .join("\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_query_defaults() {
        let sql = build_query(&ConfigRow::default(), "stat");
        assert_eq!(
            sql,
            concat!(
                "SELECT\r\n",
                "  \"eng_str\" AS \" \"\r\n",
                "FROM\r\n",
                "  \"STATE_MACH_TARGET_STATE\"\r\n",
                "WHERE\r\n",
                "  \"ert\" >= $__timeFrom::bigint\r\n",
                "  AND \"ert\" <= $__timeTo::bigint\r\n",
                "  AND \"spacecraft_id\" = '${scid}'\r\n",
                "ORDER BY \"ert\" DESC\r\n",
            )
        );
    }

    #[test]
    fn test_state_timeline_query_includes_time_column() {
        let row = ConfigRow {
            eng_field: Some("mode".into()),
            time_field: Some("scet".into()),
            table_name: Some("ACS_MODE".into()),
            source_id: Some("SC7".into()),
            column_alias: Some("ACS Mode".into()),
            ..Default::default()
        };
        let sql = build_query(&row, STATE_TIMELINE);
        assert!(sql.contains("\"mode\" AS \"ACS Mode\",\r\n"));
        assert!(sql.contains("from_unixtime(\"scet\") AS \"time\""));
        assert!(sql.contains("FROM\r\n  \"ACS_MODE\""));
        assert!(sql.contains("'SC7'"));
        assert!(sql.ends_with("ORDER BY \"scet\" ASC\r\n"));
    }
}
