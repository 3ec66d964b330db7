//! Column assignment for automatic nodes.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::LayoutConfig;

use super::size::estimate_size;
use super::DiagramNode;

/// Column key used for nodes whose group has no column of its own.
pub const FALLBACK_COLUMN: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ColumnSlot {
    Canonical(usize),
    Group(usize),
    Fallback,
}

/// Resolved left-to-right column order for one set of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPlan {
    canonical: Vec<String>,
    groups: Vec<String>,
}

impl ColumnPlan {
    pub fn new(nodes: &[DiagramNode], config: &LayoutConfig) -> Self {
        let canonical = config.columns.clone();
        let mut groups: Vec<String> = Vec::new();
        if config.group_columns {
            for node in nodes {
                let group = node.group.trim();
                if group.is_empty() || canonical.iter().any(|c| c == group) {
                    continue;
                }
                if !groups.iter().any(|g| g == group) {
                    groups.push(group.to_string());
                }
            }
            groups.sort();
        }
        Self { canonical, groups }
    }

    fn slot(&self, group: &str) -> ColumnSlot {
        let group = group.trim();
        if let Some(idx) = self.canonical.iter().position(|c| c == group) {
            return ColumnSlot::Canonical(idx);
        }
        if let Some(idx) = self.groups.iter().position(|g| g == group) {
            return ColumnSlot::Group(idx);
        }
        ColumnSlot::Fallback
    }

    fn index(&self, slot: ColumnSlot) -> usize {
        match slot {
            ColumnSlot::Canonical(idx) => idx,
            ColumnSlot::Group(idx) => self.canonical.len() + idx,
            ColumnSlot::Fallback => self.canonical.len() + self.groups.len(),
        }
    }

    /// Column index a group is placed in.
    pub fn column_index(&self, group: &str) -> usize {
        self.index(self.slot(group))
    }

    /// Column keys in left-to-right order, fallback last.
    pub fn column_names(&self) -> Vec<&str> {
        self.canonical
            .iter()
            .chain(self.groups.iter())
            .map(String::as_str)
            .chain(std::iter::once(FALLBACK_COLUMN))
            .collect()
    }
}

/// Places every automatic node into its column and stacks each column from
/// the top margin. Manual nodes are left untouched.
pub fn layout_automatic(nodes: &mut [DiagramNode], config: &LayoutConfig) {
    let plan = ColumnPlan::new(nodes, config);

    let mut columns: BTreeMap<ColumnSlot, Vec<usize>> = BTreeMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        if node.manual {
            continue;
        }
        columns.entry(plan.slot(&node.group)).or_default().push(idx);
    }

    for (slot, mut members) in columns {
        // Keep the previous pass's vertical order so re-layout does not shuffle.
        members.sort_by(|a, b| {
            nodes[*a]
                .position
                .y
                .partial_cmp(&nodes[*b].position.y)
                .unwrap_or(Ordering::Equal)
        });

        let x = config.origin_x + plan.index(slot) as f32 * config.column_spacing;
        let mut running_y = config.top_margin;
        for idx in members {
            let node = &mut nodes[idx];
            node.size = estimate_size(node, &config.node);
            node.position.x = x;
            node.position.y = running_y;
            running_y += node.size.height + config.gap;
        }

        if slot == ColumnSlot::Fallback {
            log::debug!(x; "Placed unmapped groups in fallback column");
        }
    }
}
