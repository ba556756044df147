//! Config module.
//! Reads the dashboard configuration table (CSV) into typed `ConfigRow` records.
//! Uses `csv` + serde; blank cells become `None` so later stages only test presence.
//! The optional style table shares the same columns and record type.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use tracing::warn;

/// One record of the configuration table.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ConfigRow {
    /// Section name (`Row` column). Blank only in style tables.
    #[serde(rename = "Row", default, deserialize_with = "trimmed")]
    pub section: String,
    #[serde(rename = "Panel_Template", default, deserialize_with = "blank_as_none")]
    pub panel_template: Option<String>,
    #[serde(rename = "Panel_Title", default, deserialize_with = "blank_as_none")]
    pub panel_title: Option<String>,
    #[serde(rename = "Panel_Type", default, deserialize_with = "blank_as_none")]
    pub panel_type: Option<String>,
    #[serde(rename = "Is_Additional_Target", default, deserialize_with = "flag")]
    pub is_additional_target: bool,
    #[serde(rename = "Layout", default, deserialize_with = "blank_as_none")]
    pub layout: Option<String>,
    #[serde(rename = "Grid_Height", default, deserialize_with = "blank_as_none")]
    pub grid_height: Option<String>,
    #[serde(rename = "Grid_Width", default, deserialize_with = "blank_as_none")]
    pub grid_width: Option<String>,
    #[serde(rename = "Mappings", default, deserialize_with = "blank_as_none")]
    pub mappings: Option<String>,
    #[serde(rename = "Thresholds", default, deserialize_with = "blank_as_none")]
    pub thresholds: Option<String>,
    #[serde(rename = "Eng_Str_Field", default, deserialize_with = "blank_as_none")]
    pub eng_field: Option<String>,
    #[serde(rename = "Time_Field", default, deserialize_with = "blank_as_none")]
    pub time_field: Option<String>,
    #[serde(rename = "Table_Name", default, deserialize_with = "blank_as_none")]
    pub table_name: Option<String>,
    #[serde(
        rename = "Spacecraft_ID",
        alias = "Source_ID",
        default,
        deserialize_with = "blank_as_none"
    )]
    pub source_id: Option<String>,
    #[serde(rename = "Column_Alias", default, deserialize_with = "blank_as_none")]
    pub column_alias: Option<String>,
    #[serde(rename = "Payloads", default, deserialize_with = "blank_as_none")]
    pub payloads: Option<String>,

    /// 1-based data line in the source table, for error messages.
    #[serde(skip)]
    pub line: usize,
}

impl ConfigRow {
    /// Template name, falling back to the title. This is the key used for style
    /// lookup and layout partitioning.
    pub fn template_key(&self) -> &str {
        self.panel_template
            .as_deref()
            .or(self.panel_title.as_deref())
            .unwrap_or("")
    }

    /// Whether the row carries any grid-size style information.
    pub fn has_style(&self) -> bool {
        self.grid_height.is_some() || self.grid_width.is_some()
    }
}

/// Boolean-like cell values accepted for `Is_Additional_Target`.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "1.0" | "x"
    )
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(blank_as_none(deserializer)?.unwrap_or_default())
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(blank_as_none(deserializer)?.is_some_and(|s| is_truthy(&s)))
}

/// Loads the main configuration table. Failure here is fatal for the run.
pub fn load_rows(path: &Path) -> Result<Vec<ConfigRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open configuration table: {}", path.display()))?;
    read_rows(file).with_context(|| {
        format!("Failed to parse configuration table: {}", path.display())
    })
}

/// Loads the optional style table. A missing file is not an error: the
/// generator proceeds with default styles.
pub fn load_style_rows(path: &Path) -> Result<Vec<ConfigRow>> {
    if !path.exists() {
        warn!(path = %path.display(), "style table not found, using default styles");
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open style table: {}", path.display()))?;
    read_rows(file).with_context(|| format!("Failed to parse style table: {}", path.display()))
}

/// Parses CSV records from any reader.
pub fn read_rows<R: std::io::Read>(reader: R) -> Result<Vec<ConfigRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<ConfigRow>().enumerate() {
        let mut row =
            record.with_context(|| format!("Malformed record at data line {}", index + 1))?;
        row.line = index + 1;
        rows.push(row);
    }
    Ok(rows)
}
