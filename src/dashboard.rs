//! Dashboard generation.
//! Drives one run end to end: sections in first-seen order, each with a row
//! header, payload expansion, classification, layout and assembly. The vertical
//! cursor only ever moves down across sections.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, info};

use crate::classify::classify;
use crate::config::ConfigRow;
use crate::error::InputError;
use crate::expand::expand;
use crate::layout::{Cursor, layout, section_bottom};
use crate::panel::{PanelDescriptor, PanelJson, RowJson, assemble};
use crate::style::StyleTable;

pub const DEFAULT_TITLE: &str = "Generated Dashboard";
const SCHEMA_VERSION: u32 = 41;
const TIME_FROM: &str = "2025-09-11T02:30:00.000Z";
const TIME_TO: &str = "2025-09-11T23:20:00.000Z";

/// Per-run document parameters. `uid` is injected so identical input can
/// produce identical output.
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub title: String,
    pub uid: String,
}

impl GenerateOptions {
    pub fn new(title: Option<&str>) -> Self {
        Self {
            title: title.unwrap_or(DEFAULT_TITLE).to_string(),
            uid: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// One vertical band: its header plus the panels placed under it.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub name: String,
    pub header_id: u32,
    pub header_y: u32,
    pub panels: Vec<PanelDescriptor>,
}

#[derive(Clone, Debug)]
pub struct Dashboard {
    pub title: String,
    pub uid: String,
    pub sections: Vec<Section>,
}

/// Runs the whole pipeline over in-memory rows. `style_rows` come from an
/// optional separate style table and take precedence over the main rows.
pub fn generate(
    rows: Vec<ConfigRow>,
    style_rows: &[ConfigRow],
    options: &GenerateOptions,
) -> Result<Dashboard, InputError> {
    if let Some(row) = rows.iter().find(|r| r.section.is_empty()) {
        return Err(InputError::MissingSection { line: row.line });
    }

    let styles = StyleTable::build(style_rows.iter().chain(rows.iter()));
    info!("Loaded styles for {} panel templates", styles.len());

    let mut by_section: IndexMap<String, Vec<ConfigRow>> = IndexMap::new();
    for row in rows {
        by_section.entry(row.section.clone()).or_default().push(row);
    }

    let mut sections = Vec::with_capacity(by_section.len());
    let mut next_id = 1u32;
    let mut y = 0u32;

    for (name, section_rows) in by_section {
        let header_id = next_id;
        let header_y = y;
        next_id += 1;
        y = y.saturating_add(1);

        let groups = classify(expand(section_rows))?;
        let (placed, _) = layout(groups, &styles, Cursor { x: 0, y });
        let bottom = section_bottom(&placed, &styles, y);

        let panels: Vec<PanelDescriptor> = placed
            .iter()
            .map(|group| {
                let panel = assemble(group, next_id, &styles);
                next_id += 1;
                panel
            })
            .collect();

        debug!(section = %name, panels = panels.len(), top = header_y, bottom, "section laid out");
        y = bottom;

        sections.push(Section {
            name,
            header_id,
            header_y,
            panels,
        });
    }

    Ok(Dashboard {
        title: options.title.clone(),
        uid: options.uid.clone(),
        sections,
    })
}

// *************** Document ***************

#[derive(Serialize)]
#[serde(untagged)]
enum PanelEntry<'a> {
    Row(RowJson<'a>),
    Panel(PanelJson<'a>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardJson<'a> {
    annotations: Value,
    editable: bool,
    fiscal_year_start_month: u32,
    graph_tooltip: u32,
    id: Option<u32>,
    links: Vec<Value>,
    panels: Vec<PanelEntry<'a>>,
    preload: bool,
    schema_version: u32,
    tags: Vec<String>,
    templating: Value,
    time: Value,
    timepicker: Value,
    timezone: &'static str,
    title: &'a str,
    uid: &'a str,
    version: u32,
}

impl Dashboard {
    fn to_json(&self) -> DashboardJson<'_> {
        let mut panels = Vec::new();
        for section in &self.sections {
            panels.push(PanelEntry::Row(RowJson::new(
                &section.name,
                section.header_id,
                section.header_y,
            )));
            panels.extend(section.panels.iter().map(|p| PanelEntry::Panel(p.to_json())));
        }

        DashboardJson {
            annotations: json!({
                "list": [{
                    "builtIn": 1,
                    "datasource": { "type": "grafana", "uid": "-- Grafana --" },
                    "enable": true,
                    "hide": true,
                    "iconColor": "rgba(0, 211, 255, 1)",
                    "name": "Annotations & Alerts",
                    "type": "dashboard",
                }]
            }),
            editable: true,
            fiscal_year_start_month: 0,
            graph_tooltip: 0,
            id: None,
            links: Vec::new(),
            panels,
            preload: false,
            schema_version: SCHEMA_VERSION,
            tags: Vec::new(),
            templating: templating(),
            time: json!({ "from": TIME_FROM, "to": TIME_TO }),
            timepicker: json!({}),
            timezone: "utc",
            title: &self.title,
            uid: &self.uid,
            version: 1,
        }
    }

    /// Pretty-printed document text.
    pub fn render(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_json()).context("Failed to serialize dashboard")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.render()?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write dashboard to {}", path.display()))?;
        info!(path = %path.display(), "dashboard written");
        Ok(())
    }
}

/// Spacecraft and data source variables referenced by every query.
fn templating() -> Value {
    let scid_query = concat!(
        "SELECT DISTINCT \"spacecraft_id\" \n",
        "FROM \"MDC_ACMODE\"\n",
        "WHERE \"spacecraft_id\" IS NOT NULL;",
    );
    json!({
        "list": [
            {
                "current": { "text": "TM004DUP", "value": "TM004DUP" },
                "datasource": { "type": "influxdb", "uid": "${DataSource}" },
                "definition": scid_query,
                "description": "",
                "label": "Spacecraft",
                "name": "scid",
                "options": [],
                "query": {
                    "query": scid_query,
                    "refId": "InfluxVariableQueryEditor-VariableQuery",
                },
                "refresh": 1,
                "regex": "",
                "type": "query",
            },
            {
                "current": {
                    "text": "influxdb-sql-thunder-max-telemetry-mr-30-b",
                    "value": "eex74u67acirkd",
                },
                "label": "Data Source",
                "name": "DataSource",
                "options": [],
                "query": "influxdb",
                "refresh": 1,
                "regex": "",
                "type": "datasource",
            },
        ]
    })
}
