//! Row classification.
//! Turns one section's rows into panel groups: a row with a template or title
//! opens a group, additional-target rows attach to the most recently opened one.

use tracing::debug;

use crate::config::ConfigRow;
use crate::error::InputError;
use crate::layout::{LayoutStrategy, Position};

/// Upper bound on queries per panel (ref ids `A`..`H`).
pub const MAX_TARGETS: usize = 8;

/// A panel under construction: its first row plus every row that queries into it.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelGroup {
    /// Template name, or the title when no template is given.
    pub template_name: String,
    pub layout: LayoutStrategy,
    /// Index 0 is the row that opened the group.
    pub targets: Vec<ConfigRow>,
    pub position: Option<Position>,
}

impl PanelGroup {
    fn open(row: ConfigRow) -> Self {
        Self {
            template_name: row.template_key().to_string(),
            layout: LayoutStrategy::parse(row.layout.as_deref()),
            targets: vec![row],
            position: None,
        }
    }

    pub fn representative(&self) -> &ConfigRow {
        &self.targets[0]
    }
}

/// Groups rows in order. Orphan additional targets and targets past
/// `MAX_TARGETS` are dropped; a non-target row without template or title is rejected.
pub fn classify(rows: Vec<ConfigRow>) -> Result<Vec<PanelGroup>, InputError> {
    let mut groups: Vec<PanelGroup> = Vec::new();

    for row in rows {
        if !row.is_additional_target {
            if row.panel_template.is_none() && row.panel_title.is_none() {
                return Err(InputError::UnnamedPanel {
                    section: row.section,
                    line: row.line,
                });
            }
            groups.push(PanelGroup::open(row));
            continue;
        }

        let Some(group) = groups.last_mut() else {
            debug!(
                section = %row.section,
                line = row.line,
                "dropping additional target with no panel before it"
            );
            continue;
        };
        if group.targets.len() >= MAX_TARGETS {
            debug!(
                panel = %group.template_name,
                line = row.line,
                "panel already has {MAX_TARGETS} targets, dropping row"
            );
            continue;
        }
        group.targets.push(row);
    }

    Ok(groups)
}
