use unicode_width::UnicodeWidthStr;

use crate::config::NodeSizeConfig;

use super::{DiagramNode, Size};

/// Estimated box size of a node from its content and collapse state.
///
/// Collapsed nodes show only their header. Expanded nodes add one row per
/// field, capped at `max_visible_rows` so wide tables do not dominate a
/// column.
pub fn estimate_size(node: &DiagramNode, config: &NodeSizeConfig) -> Size {
    let body_height = if node.collapsed {
        0.0
    } else {
        let rows = node.field_count.min(config.max_visible_rows);
        rows as f32 * config.row_height + config.padding
    };

    Size {
        width: estimate_width(&node.label, config),
        height: config.header_height + body_height,
    }
}

fn estimate_width(label: &str, config: &NodeSizeConfig) -> f32 {
    if !config.fit_label {
        return config.width;
    }
    let label_width = UnicodeWidthStr::width(label) as f32 * config.char_width;
    let upper = config.max_width.max(config.width);
    (label_width + config.label_padding).clamp(config.width, upper)
}
