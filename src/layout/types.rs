use serde::{Deserialize, Serialize};

use crate::ir::FieldSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Where a node sits relative to the focus of the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Source,
    Center,
    Target,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    pub role: NodeRole,
    /// Column key.
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub collapsed: bool,
    pub field_count: usize,
    #[serde(default)]
    pub fields: Vec<FieldSummary>,
    pub manual: bool,
    pub position: Point,
    pub size: Size,
}

impl DiagramNode {
    pub fn new(id: impl Into<String>, role: NodeRole, group: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            role,
            group: group.into(),
            domain: None,
            collapsed: false,
            field_count: 0,
            fields: Vec::new(),
            manual: false,
            position: Point::default(),
            size: Size::default(),
        }
    }

    pub fn left(&self) -> f32 {
        self.position.x
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.size.width
    }

    pub fn top(&self) -> f32 {
        self.position.y
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.height
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramEdge {
    pub source: String,
    pub target: String,
    pub relation_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Positioned nodes and edges produced by one orchestration pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    pub diagram_id: String,
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

impl LayoutResult {
    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bounding box of every node, for caller-side fit-to-view.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.nodes.first()?;
        let mut bounds = Bounds {
            min_x: first.left(),
            min_y: first.top(),
            max_x: first.right(),
            max_y: first.bottom(),
        };
        for node in &self.nodes[1..] {
            bounds.min_x = bounds.min_x.min(node.left());
            bounds.min_y = bounds.min_y.min(node.top());
            bounds.max_x = bounds.max_x.max(node.right());
            bounds.max_y = bounds.max_y.max(node.bottom());
        }
        Some(bounds)
    }
}
