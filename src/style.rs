//! Style table: per-template grid size and value-coloring rules.
//!
//! Built once per generation run by scanning style-bearing rows. The first row
//! for a template wins; later rows for the same template never overwrite it.
//! Lookups always succeed and fall back to `StyleEntry::default()`.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::config::ConfigRow;
use crate::layout::GRID_WIDTH;

pub const DEFAULT_PANEL_WIDTH: u32 = 5;
pub const DEFAULT_PANEL_HEIGHT: u32 = 5;
/// Tallest panel accepted; larger heights are clamped.
pub const MAX_PANEL_HEIGHT: u32 = 1000;
pub const DEFAULT_MAPPING_COLOR: &str = "green";
pub const DEFAULT_THRESHOLD_COLOR: &str = "transparent";

const LIST_DELIMITER: char = '|';

/// One `value:color:text` entry; `index` is its position in the source list.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueMapping {
    pub value: String,
    pub color: String,
    pub text: String,
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThresholdStep {
    pub color: String,
    #[serde(serialize_with = "integral_as_int")]
    pub value: f64,
}

/// Writes `0` rather than `0.0` for whole-number step values.
fn integral_as_int<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StyleEntry {
    pub grid_height: u32,
    pub grid_width: u32,
    pub value_mappings: Vec<ValueMapping>,
    /// Ascending by value, never empty.
    pub threshold_steps: Vec<ThresholdStep>,
}

impl Default for StyleEntry {
    fn default() -> Self {
        Self {
            grid_height: DEFAULT_PANEL_HEIGHT,
            grid_width: DEFAULT_PANEL_WIDTH,
            value_mappings: Vec::new(),
            threshold_steps: default_steps(),
        }
    }
}

impl StyleEntry {
    /// Builds an entry from a row's style columns, defaulting anything missing or malformed.
    pub fn from_row(row: &ConfigRow) -> Self {
        let template = row.template_key();
        Self {
            grid_height: parse_grid_size(
                row.grid_height.as_deref(),
                DEFAULT_PANEL_HEIGHT,
                MAX_PANEL_HEIGHT,
                template,
                "Grid_Height",
            ),
            grid_width: parse_grid_size(
                row.grid_width.as_deref(),
                DEFAULT_PANEL_WIDTH,
                GRID_WIDTH,
                template,
                "Grid_Width",
            ),
            value_mappings: row
                .mappings
                .as_deref()
                .map(parse_mappings)
                .unwrap_or_default(),
            threshold_steps: row
                .thresholds
                .as_deref()
                .map(parse_thresholds)
                .unwrap_or_else(default_steps),
        }
    }

    /// Grafana `fieldConfig.defaults.mappings` value.
    pub fn mappings_json(&self) -> Value {
        if self.value_mappings.is_empty() {
            return json!([]);
        }
        let mut options = Map::new();
        for mapping in &self.value_mappings {
            options.insert(
                mapping.value.clone(),
                json!({
                    "color": mapping.color,
                    "index": mapping.index,
                    "text": mapping.text,
                }),
            );
        }
        json!([{ "options": options, "type": "value" }])
    }

    /// Grafana `fieldConfig.defaults.thresholds` value.
    pub fn thresholds_json(&self) -> Value {
        json!({ "mode": "absolute", "steps": self.threshold_steps })
    }
}

fn default_steps() -> Vec<ThresholdStep> {
    vec![ThresholdStep {
        color: DEFAULT_THRESHOLD_COLOR.to_string(),
        value: 0.0,
    }]
}

/// Accepts `"5"` and integral floats like `"5.0"`; out-of-range values are
/// clamped to `[1, max]`, garbage falls back to `default`.
fn parse_grid_size(
    raw: Option<&str>,
    default: u32,
    max: u32,
    template: &str,
    column: &str,
) -> u32 {
    let Some(raw) = raw else {
        return default;
    };
    let parsed = raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i64)
    });

    match parsed {
        Some(v) if v >= 1 => {
            let clamped = v.min(max as i64) as u32;
            if clamped as i64 != v {
                warn!(template, column, value = v, max, "grid size clamped");
            }
            clamped
        }
        _ => {
            warn!(template, column, raw, default, "invalid grid size, using default");
            default
        }
    }
}

/// Parses `SAFE:light-green:Payload Safe|FAULT:red`.
/// Color defaults to `green`, text defaults to the value.
pub fn parse_mappings(raw: &str) -> Vec<ValueMapping> {
    let mut mappings = Vec::new();
    for (index, token) in raw.split(LIST_DELIMITER).enumerate() {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let mut parts = token.splitn(3, ':');
        let value = parts.next().unwrap_or_default().trim();
        if value.is_empty() {
            warn!(token, "skipping mapping without a value");
            continue;
        }
        let color = parts
            .next()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_MAPPING_COLOR);
        let text = parts
            .next()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(value);

        mappings.push(ValueMapping {
            value: value.to_string(),
            color: color.to_string(),
            text: text.to_string(),
            index,
        });
    }
    mappings
}

/// Parses `0:green|1:#EAB839|2:red` into ascending steps.
/// Non-numeric values are skipped; an empty result yields the transparent default.
pub fn parse_thresholds(raw: &str) -> Vec<ThresholdStep> {
    let mut steps: Vec<ThresholdStep> = raw
        .split(LIST_DELIMITER)
        .filter_map(|token| {
            let (value, color) = token.split_once(':')?;
            match value.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Some(ThresholdStep {
                    color: color.trim().to_string(),
                    value,
                }),
                _ => {
                    warn!(token, "skipping non-numeric threshold");
                    None
                }
            }
        })
        .collect();

    if steps.is_empty() {
        return default_steps();
    }
    steps.sort_by(|a, b| a.value.total_cmp(&b.value));
    steps
}

/// Template name -> style, in first-seen order.
#[derive(Debug, Default)]
pub struct StyleTable {
    entries: IndexMap<String, StyleEntry>,
    fallback: StyleEntry,
}

impl StyleTable {
    /// Scans every row once; first style-bearing row per template wins.
    pub fn build<'a>(rows: impl IntoIterator<Item = &'a ConfigRow>) -> Self {
        let mut table = Self::default();
        for row in rows {
            let Some(template) = row.panel_template.as_deref() else {
                continue;
            };
            if !row.has_style() || table.entries.contains_key(template) {
                continue;
            }
            table
                .entries
                .insert(template.to_string(), StyleEntry::from_row(row));
        }
        table
    }

    pub fn resolve(&self, template: &str) -> &StyleEntry {
        self.entries.get(template).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_row(template: &str, height: Option<&str>, width: Option<&str>) -> ConfigRow {
        ConfigRow {
            section: "S".into(),
            panel_template: Some(template.into()),
            grid_height: height.map(Into::into),
            grid_width: width.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn test_thresholds_sorted_ascending() {
        let steps = parse_thresholds("2:red|0:green|1:#EAB839");
        let colors: Vec<_> = steps.iter().map(|s| s.color.as_str()).collect();
        assert_eq!(colors, ["green", "#EAB839", "red"]);
        assert!(steps.windows(2).all(|w| w[0].value <= w[1].value));
    }

    #[test]
    fn test_thresholds_skip_non_numeric() {
        let steps = parse_thresholds("abc:red|5:blue|nocolon");
        assert_eq!(
            steps,
            vec![ThresholdStep {
                color: "blue".into(),
                value: 5.0
            }]
        );
    }

    #[test]
    fn test_thresholds_all_invalid_fall_back() {
        let steps = parse_thresholds("high:red|low:green");
        assert_eq!(steps, default_steps());
    }

    #[test]
    fn test_mappings_defaults_and_indices() {
        let mappings = parse_mappings("SAFE:light-green:Payload Safe|FAULT:red|IDLE");
        assert_eq!(mappings.len(), 3);
        assert_eq!(mappings[0].text, "Payload Safe");
        assert_eq!(mappings[1].text, "FAULT");
        assert_eq!(mappings[2].color, DEFAULT_MAPPING_COLOR);
        assert_eq!(mappings[2].text, "IDLE");
        let indices: Vec<_> = mappings.iter().map(|m| m.index).collect();
        assert_eq!(indices, [0, 1, 2]);
    }

    #[test]
    fn test_mappings_keep_text_with_colons() {
        let mappings = parse_mappings("1:red:Mode: Safe");
        assert_eq!(mappings[0].text, "Mode: Safe");
    }

    #[test]
    fn test_mappings_json_shape() {
        let entry = StyleEntry {
            value_mappings: parse_mappings("ON:green:On|OFF:red:Off"),
            ..Default::default()
        };
        let json = entry.mappings_json();
        assert_eq!(json[0]["type"], "value");
        assert_eq!(json[0]["options"]["OFF"]["index"], 1);
        assert_eq!(json[0]["options"]["ON"]["color"], "green");
        assert_eq!(StyleEntry::default().mappings_json(), json!([]));
    }

    #[test]
    fn test_first_write_wins() {
        let rows = vec![
            style_row("T1", Some("4"), Some("6")),
            style_row("T1", Some("9"), Some("12")),
        ];
        let table = StyleTable::build(&rows);
        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve("T1").grid_height, 4);
        assert_eq!(table.resolve("T1").grid_width, 6);
    }

    #[test]
    fn test_rows_without_size_do_not_claim_template() {
        let rows = vec![
            style_row("T1", None, None),
            style_row("T1", None, Some("10")),
        ];
        let table = StyleTable::build(&rows);
        let entry = table.resolve("T1");
        assert_eq!(entry.grid_width, 10);
        assert_eq!(entry.grid_height, DEFAULT_PANEL_HEIGHT);
    }

    #[test]
    fn test_resolve_miss_returns_defaults() {
        let table = StyleTable::build(&Vec::<ConfigRow>::new());
        assert_eq!(table.resolve("unknown"), &StyleEntry::default());
    }

    #[test]
    fn test_grid_size_parsing() {
        let rows = vec![
            style_row("float", Some("3.0"), Some("7.0")),
            style_row("wide", Some("2"), Some("40")),
            style_row("junk", Some("tall"), Some("0")),
        ];
        let table = StyleTable::build(&rows);
        assert_eq!(table.resolve("float").grid_height, 3);
        assert_eq!(table.resolve("float").grid_width, 7);
        assert_eq!(table.resolve("wide").grid_width, GRID_WIDTH);
        assert_eq!(table.resolve("junk").grid_height, DEFAULT_PANEL_HEIGHT);
        assert_eq!(table.resolve("junk").grid_width, DEFAULT_PANEL_WIDTH);
    }

    #[test]
    fn test_huge_height_is_clamped() {
        let rows = vec![
            style_row("sci", Some("1e10"), None),
            style_row("big", Some("5000000000"), None),
        ];
        let table = StyleTable::build(&rows);
        assert_eq!(table.resolve("sci").grid_height, MAX_PANEL_HEIGHT);
        assert_eq!(table.resolve("big").grid_height, MAX_PANEL_HEIGHT);
    }

    #[test]
    fn test_whole_threshold_values_serialize_as_integers() {
        let entry = StyleEntry {
            threshold_steps: parse_thresholds("0:green|2.5:red"),
            ..Default::default()
        };
        let text = serde_json::to_string(&entry.thresholds_json()).unwrap();
        assert!(text.contains(r#""value":0}"#), "{text}");
        assert!(text.contains(r#""value":2.5}"#), "{text}");

        let default = serde_json::to_string(&StyleEntry::default().thresholds_json()).unwrap();
        assert_eq!(
            default,
            r#"{"mode":"absolute","steps":[{"color":"transparent","value":0}]}"#
        );
    }
}
