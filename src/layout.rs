//! Layout engine.
//! Places panel groups on the 24-column dashboard grid. Groups are first
//! partitioned by (template, strategy) in first-seen order, then each partition
//! is flowed left-to-right under its strategy:
//! - `horizontal`: own line(s), line break before and after.
//! - `sequential`: continuous flow from the cursor, wrapping at the grid edge.
//! - `auto`: one fit check for the whole partition, then no per-panel wrapping.
//!   A partition wider than the grid overflows past the right edge.

use indexmap::IndexMap;
use std::fmt;
use tracing::{debug, warn};

use crate::classify::PanelGroup;
use crate::style::StyleTable;

pub const GRID_WIDTH: u32 = 24;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutStrategy {
    Horizontal,
    #[default]
    Sequential,
    Auto,
}

impl LayoutStrategy {
    /// Case-insensitive; blank or unknown values mean sequential.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Self::Horizontal,
            "sequential" | "" => Self::Sequential,
            "auto" => Self::Auto,
            other => {
                warn!(layout = other, "unknown layout strategy, using sequential");
                Self::Sequential
            }
        }
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutStrategy::Horizontal => write!(f, "horizontal"),
            LayoutStrategy::Sequential => write!(f, "sequential"),
            LayoutStrategy::Auto => write!(f, "auto"),
        }
    }
}

/// Top-left grid cell of a placed panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub x: u32,
    pub y: u32,
}

/// Running placement state for one section.
struct Flow {
    cursor: Cursor,
    /// Tallest panel on the current line.
    line_height: u32,
}

impl Flow {
    /// Moves to the start of the next line. `fallback` is used when the current
    /// line was started by an earlier call and its height is unknown.
    fn break_line(&mut self, fallback: u32) {
        if self.cursor.x == 0 {
            return;
        }
        let advance = if self.line_height > 0 { self.line_height } else { fallback };
        self.cursor.y = self.cursor.y.saturating_add(advance);
        self.cursor.x = 0;
        self.line_height = 0;
    }

    fn place(&mut self, group: &mut PanelGroup, width: u32, height: u32) {
        group.position = Some(Position {
            x: self.cursor.x,
            y: self.cursor.y,
        });
        self.cursor.x += width;
        self.line_height = self.line_height.max(height);
    }

    /// Places with wrapping: breaks before a panel that would cross the right
    /// edge and after one that reaches it.
    fn place_wrapping(&mut self, group: &mut PanelGroup, width: u32, height: u32) {
        if self.cursor.x + width > GRID_WIDTH {
            self.break_line(height);
        }
        self.place(group, width, height);
        if self.cursor.x >= GRID_WIDTH {
            self.break_line(height);
        }
    }
}

/// Positions every group and returns them in placement order with the final cursor.
pub fn layout(
    groups: Vec<PanelGroup>,
    styles: &StyleTable,
    cursor: Cursor,
) -> (Vec<PanelGroup>, Cursor) {
    let mut partitions: IndexMap<(String, LayoutStrategy), Vec<PanelGroup>> = IndexMap::new();
    for group in groups {
        partitions
            .entry((group.template_name.clone(), group.layout))
            .or_default()
            .push(group);
    }

    let mut flow = Flow {
        cursor,
        line_height: 0,
    };
    let mut placed = Vec::new();

    for ((template, strategy), mut members) in partitions {
        let style = styles.resolve(&template);
        let (width, height) = (style.grid_width, style.grid_height);

        match strategy {
            LayoutStrategy::Horizontal => {
                flow.break_line(height);
                for group in &mut members {
                    flow.place_wrapping(group, width, height);
                }
                flow.break_line(height);
            }
            LayoutStrategy::Auto => {
                let total = width * members.len() as u32;
                if flow.cursor.x + total > GRID_WIDTH {
                    flow.break_line(height);
                }
                for group in &mut members {
                    flow.place(group, width, height);
                }
            }
            LayoutStrategy::Sequential => {
                for group in &mut members {
                    flow.place_wrapping(group, width, height);
                }
            }
        }

        debug!(
            template = %template,
            strategy = %strategy,
            panels = members.len(),
            cursor_x = flow.cursor.x,
            cursor_y = flow.cursor.y,
            "placed partition"
        );
        placed.extend(members);
    }

    (placed, flow.cursor)
}

/// Lowest grid row occupied by any placed group, or `floor` when nothing was placed.
pub fn section_bottom(groups: &[PanelGroup], styles: &StyleTable, floor: u32) -> u32 {
    groups
        .iter()
        .filter_map(|g| {
            let pos = g.position?;
            Some(pos.y.saturating_add(styles.resolve(&g.template_name).grid_height))
        })
        .max()
        .unwrap_or(floor)
        .max(floor)
}
