use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Which graph view a layout is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DiagramKind {
    /// Staging tables -> glossary term -> model tables.
    Erd,
    /// A focus term and its related terms, grouped by domain.
    Glossary,
}

impl DiagramKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Erd => "erd",
            Self::Glossary => "glossary",
        }
    }

    /// Column key of the focus node.
    pub fn center_group(self) -> &'static str {
        match self {
            Self::Erd => "glossary",
            Self::Glossary => "focus",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSizeConfig {
    /// Fixed width, or the minimum width when `fit_label` is set.
    pub width: f32,
    pub header_height: f32,
    pub row_height: f32,
    pub padding: f32,
    pub max_visible_rows: usize,
    pub fit_label: bool,
    pub max_width: f32,
    pub char_width: f32,
    pub label_padding: f32,
}

impl NodeSizeConfig {
    pub fn erd() -> Self {
        Self {
            width: 256.0,
            header_height: 48.0,
            row_height: 28.0,
            padding: 16.0,
            max_visible_rows: 8,
            fit_label: false,
            max_width: 256.0,
            char_width: 8.0,
            label_padding: 32.0,
        }
    }

    pub fn glossary() -> Self {
        Self {
            width: 220.0,
            header_height: 56.0,
            row_height: 24.0,
            padding: 12.0,
            max_visible_rows: 6,
            fit_label: true,
            max_width: 360.0,
            char_width: 8.0,
            label_padding: 32.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node: NodeSizeConfig,
    /// Canonical column order, left to right.
    pub columns: Vec<String>,
    /// Give unknown groups their own columns instead of the shared fallback.
    pub group_columns: bool,
    pub origin_x: f32,
    pub top_margin: f32,
    pub column_spacing: f32,
    /// Minimum vertical gap between stacked or colliding nodes.
    pub gap: f32,
    pub collision_iterations: usize,
    pub collapsed_by_default: bool,
}

impl LayoutConfig {
    pub fn erd() -> Self {
        Self {
            node: NodeSizeConfig::erd(),
            columns: vec![
                "staging".to_string(),
                "glossary".to_string(),
                "model".to_string(),
            ],
            group_columns: false,
            origin_x: 50.0,
            top_margin: 50.0,
            column_spacing: 400.0,
            gap: 40.0,
            collision_iterations: 3,
            collapsed_by_default: false,
        }
    }

    pub fn glossary() -> Self {
        Self {
            node: NodeSizeConfig::glossary(),
            columns: vec![DiagramKind::Glossary.center_group().to_string()],
            group_columns: true,
            origin_x: 50.0,
            top_margin: 100.0,
            column_spacing: 350.0,
            gap: 40.0,
            collision_iterations: 3,
            collapsed_by_default: true,
        }
    }

    pub fn for_kind(kind: DiagramKind) -> Self {
        match kind {
            DiagramKind::Erd => Self::erd(),
            DiagramKind::Glossary => Self::glossary(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::erd()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub erd: LayoutConfig,
    pub glossary: LayoutConfig,
}

impl Config {
    pub fn layout(&self, kind: DiagramKind) -> &LayoutConfig {
        match kind {
            DiagramKind::Erd => &self.erd,
            DiagramKind::Glossary => &self.glossary,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            erd: LayoutConfig::erd(),
            glossary: LayoutConfig::glossary(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeSizeConfigFile {
    width: Option<f32>,
    header_height: Option<f32>,
    row_height: Option<f32>,
    padding: Option<f32>,
    max_visible_rows: Option<usize>,
    fit_label: Option<bool>,
    max_width: Option<f32>,
    char_width: Option<f32>,
    label_padding: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node: Option<NodeSizeConfigFile>,
    columns: Option<Vec<String>>,
    group_columns: Option<bool>,
    origin_x: Option<f32>,
    top_margin: Option<f32>,
    column_spacing: Option<f32>,
    gap: Option<f32>,
    collision_iterations: Option<usize>,
    collapsed_by_default: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    erd: Option<LayoutConfigFile>,
    glossary: Option<LayoutConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = json5::from_str(&contents)?;
    log::debug!(path:% = path.display(); "Loaded layout configuration");

    if let Some(erd) = parsed.erd {
        apply_layout_overrides(&mut config.erd, erd);
    }
    if let Some(glossary) = parsed.glossary {
        apply_layout_overrides(&mut config.glossary, glossary);
    }

    Ok(config)
}

fn apply_layout_overrides(config: &mut LayoutConfig, file: LayoutConfigFile) {
    if let Some(node) = file.node {
        apply_node_overrides(&mut config.node, node);
    }
    if let Some(v) = file.columns {
        config.columns = v;
    }
    if let Some(v) = file.group_columns {
        config.group_columns = v;
    }
    if let Some(v) = file.origin_x {
        config.origin_x = v;
    }
    if let Some(v) = file.top_margin {
        config.top_margin = v;
    }
    if let Some(v) = file.column_spacing {
        config.column_spacing = v;
    }
    if let Some(v) = file.gap {
        config.gap = v.max(0.0);
    }
    if let Some(v) = file.collision_iterations {
        config.collision_iterations = v;
    }
    if let Some(v) = file.collapsed_by_default {
        config.collapsed_by_default = v;
    }
}

fn apply_node_overrides(config: &mut NodeSizeConfig, file: NodeSizeConfigFile) {
    if let Some(v) = file.width {
        config.width = v.max(1.0);
    }
    if let Some(v) = file.header_height {
        config.header_height = v.max(0.0);
    }
    if let Some(v) = file.row_height {
        config.row_height = v.max(0.0);
    }
    if let Some(v) = file.padding {
        config.padding = v.max(0.0);
    }
    if let Some(v) = file.max_visible_rows {
        config.max_visible_rows = v;
    }
    if let Some(v) = file.fit_label {
        config.fit_label = v;
    }
    if let Some(v) = file.max_width {
        config.max_width = v;
    }
    if let Some(v) = file.char_width {
        config.char_width = v.max(0.0);
    }
    if let Some(v) = file.label_padding {
        config.label_padding = v.max(0.0);
    }
}
