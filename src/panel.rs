//! Panel assembly.
//! Freezes a positioned `PanelGroup` into a `PanelDescriptor`: resolved style,
//! grid position, and targets labelled `A`..`H` in row order. The Grafana JSON
//! shape lives in the borrowed `*Json` types below.

use serde::Serialize;
use serde_json::{Value, json};

use crate::classify::{MAX_TARGETS, PanelGroup};
use crate::layout::{GRID_WIDTH, Position};
use crate::query::build_query;
use crate::style::{StyleEntry, StyleTable};

pub const REF_IDS: [char; MAX_TARGETS] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];
pub const DEFAULT_PANEL_TYPE: &str = "stat";
pub const UNTITLED: &str = "Untitled";
const PLUGIN_VERSION: &str = "12.1.0-247000";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GridPos {
    pub h: u32,
    pub w: u32,
    pub x: u32,
    pub y: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    pub ref_id: char,
    pub raw_sql: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanelDescriptor {
    pub id: u32,
    pub title: String,
    pub panel_type: String,
    pub grid_pos: GridPos,
    pub style: StyleEntry,
    pub targets: Vec<Target>,
}

/// Builds the descriptor for a group the layout engine has already placed.
/// An unplaced group lands at the origin.
pub fn assemble(group: &PanelGroup, id: u32, styles: &StyleTable) -> PanelDescriptor {
    let head = group.representative();
    let style = styles.resolve(&group.template_name).clone();
    let position = group.position.unwrap_or(Position { x: 0, y: 0 });
    let panel_type = head
        .panel_type
        .clone()
        .unwrap_or_else(|| DEFAULT_PANEL_TYPE.to_string());

    let targets = group
        .targets
        .iter()
        .zip(REF_IDS)
        .map(|(row, ref_id)| Target {
            ref_id,
            raw_sql: build_query(row, &panel_type),
        })
        .collect();

    PanelDescriptor {
        id,
        title: head
            .panel_title
            .clone()
            .or_else(|| head.panel_template.clone())
            .unwrap_or_else(|| UNTITLED.to_string()),
        grid_pos: GridPos {
            h: style.grid_height,
            w: style.grid_width,
            x: position.x,
            y: position.y,
        },
        panel_type,
        style,
        targets,
    }
}

// *************** Grafana JSON ***************

#[derive(Serialize)]
pub struct Datasource {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub uid: &'static str,
}

pub const INFLUX_DATASOURCE: Datasource = Datasource {
    kind: "influxdb",
    uid: "${DataSource}",
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelJson<'a> {
    datasource: Datasource,
    field_config: Value,
    grid_pos: GridPos,
    id: u32,
    options: Value,
    plugin_version: &'static str,
    targets: Vec<TargetJson<'a>>,
    title: &'a str,
    #[serde(rename = "type")]
    panel_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetJson<'a> {
    dataset: &'static str,
    editor_mode: &'static str,
    format: &'static str,
    raw_query: bool,
    raw_sql: &'a str,
    ref_id: String,
    sql: Value,
}

#[derive(Serialize)]
pub struct RowJson<'a> {
    collapsed: bool,
    #[serde(rename = "gridPos")]
    grid_pos: GridPos,
    id: u32,
    panels: Vec<Value>,
    title: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

impl<'a> RowJson<'a> {
    /// Full-width, one-unit-tall section header.
    pub fn new(title: &'a str, id: u32, y: u32) -> Self {
        Self {
            collapsed: false,
            grid_pos: GridPos {
                h: 1,
                w: GRID_WIDTH,
                x: 0,
                y,
            },
            id,
            panels: Vec::new(),
            title,
            kind: "row",
        }
    }
}

impl PanelDescriptor {
    pub fn to_json(&self) -> PanelJson<'_> {
        PanelJson {
            datasource: INFLUX_DATASOURCE,
            field_config: json!({
                "defaults": {
                    "color": { "mode": "thresholds" },
                    "mappings": self.style.mappings_json(),
                    "thresholds": self.style.thresholds_json(),
                },
                "overrides": [],
            }),
            grid_pos: self.grid_pos,
            id: self.id,
            options: json!({
                "colorMode": "background",
                "graphMode": "none",
                "justifyMode": "auto",
                "orientation": "auto",
                "percentChangeColorMode": "standard",
                "reduceOptions": { "calcs": ["last"], "fields": "", "values": false },
                "showPercentChange": false,
                "textMode": "value_and_name",
                "wideLayout": true,
            }),
            plugin_version: PLUGIN_VERSION,
            targets: self.targets.iter().map(Target::to_json).collect(),
            title: &self.title,
            panel_type: &self.panel_type,
        }
    }
}

impl Target {
    pub fn to_json(&self) -> TargetJson<'_> {
        TargetJson {
            dataset: "iox",
            editor_mode: "code",
            format: "table",
            raw_query: true,
            raw_sql: &self.raw_sql,
            ref_id: self.ref_id.to_string(),
            sql: json!({
                "columns": [{ "parameters": [], "type": "function" }],
                "groupBy": [{ "property": { "type": "string" }, "type": "groupBy" }],
            }),
        }
    }
}
