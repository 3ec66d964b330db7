pub mod collision;
pub mod columns;
mod error;
pub mod size;
pub(crate) mod types;
pub use error::LayoutError;
pub use types::*;

use std::collections::{HashMap, HashSet};

use crate::config::LayoutConfig;
use crate::ir::GraphModel;
use crate::store::PositionStore;

use collision::resolve_collisions;
use columns::layout_automatic;
use size::estimate_size;

fn ensure_diagram_id(diagram_id: &str) -> Result<(), LayoutError> {
    if diagram_id.trim().is_empty() {
        return Err(LayoutError::MissingDiagramId);
    }
    Ok(())
}

/// Runs one full layout pass: merges fresh nodes with stored and previous
/// positions, places automatic nodes in columns and removes overlaps.
///
/// A stored position always wins and marks the node manual. Otherwise a node
/// present in `previous` keeps its position, manual flag and collapse state.
/// Everything else is new and gets placed by the column engine.
pub fn recompute<S: PositionStore + ?Sized>(
    model: &GraphModel,
    previous: Option<&LayoutResult>,
    store: &S,
    diagram_id: &str,
    config: &LayoutConfig,
) -> Result<LayoutResult, LayoutError> {
    recompute_with(model, previous, Some(store), diagram_id, config)
}

fn recompute_with<S: PositionStore + ?Sized>(
    model: &GraphModel,
    previous: Option<&LayoutResult>,
    store: Option<&S>,
    diagram_id: &str,
    config: &LayoutConfig,
) -> Result<LayoutResult, LayoutError> {
    ensure_diagram_id(diagram_id)?;

    let previous_nodes: HashMap<&str, &DiagramNode> = previous
        .map(|layout| {
            layout
                .nodes
                .iter()
                .map(|node| (node.id.as_str(), node))
                .collect()
        })
        .unwrap_or_default();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut nodes: Vec<DiagramNode> = Vec::with_capacity(model.nodes.len());
    for fresh in &model.nodes {
        if !seen.insert(fresh.id.as_str()) {
            log::warn!(diagram_id, node_id:% = fresh.id; "Dropping duplicate node id");
            continue;
        }
        let mut node = fresh.clone();
        let carried = previous_nodes.get(node.id.as_str()).copied();
        if let Some(prev) = carried {
            node.collapsed = prev.collapsed;
        }

        match store.map(|store| stored_position(store, diagram_id, &node.id)) {
            Some(Some(position)) => {
                node.position = position;
                node.manual = true;
            }
            _ => match carried {
                Some(prev) => {
                    node.position = prev.position;
                    node.manual = prev.manual;
                }
                None => {
                    node.position = Point::default();
                    node.manual = false;
                }
            },
        }

        node.size = estimate_size(&node, &config.node);
        nodes.push(node);
    }

    layout_automatic(&mut nodes, config);
    resolve_collisions(&mut nodes, config.gap, config.collision_iterations);

    let edges: Vec<DiagramEdge> = model
        .edges
        .iter()
        .filter(|edge| seen.contains(edge.source.as_str()) && seen.contains(edge.target.as_str()))
        .cloned()
        .collect();
    if edges.len() < model.edges.len() {
        log::debug!(
            diagram_id,
            dropped = model.edges.len() - edges.len();
            "Dropped edges with missing endpoints"
        );
    }

    Ok(LayoutResult {
        diagram_id: diagram_id.to_string(),
        nodes,
        edges,
    })
}

fn stored_position<S: PositionStore + ?Sized>(
    store: &S,
    diagram_id: &str,
    node_id: &str,
) -> Option<Point> {
    match store.get(diagram_id, node_id) {
        Ok(Some(position)) if position.is_finite() => Some(position),
        Ok(Some(_)) => {
            log::warn!(diagram_id, node_id; "Ignoring non-finite stored position");
            None
        }
        Ok(None) => None,
        Err(err) => {
            log::warn!(diagram_id, node_id, err:%; "Position store lookup failed, treating as miss");
            None
        }
    }
}

/// Layout state of one diagram across user interactions.
///
/// The UI layer decides when to call; every call runs one complete pass and
/// replaces the current result.
#[derive(Debug)]
pub struct LayoutSession<S> {
    diagram_id: String,
    config: LayoutConfig,
    store: S,
    model: GraphModel,
    current: Option<LayoutResult>,
}

impl<S: PositionStore> LayoutSession<S> {
    pub fn new(
        diagram_id: impl Into<String>,
        config: LayoutConfig,
        store: S,
    ) -> Result<Self, LayoutError> {
        let diagram_id = diagram_id.into();
        ensure_diagram_id(&diagram_id)?;
        Ok(Self {
            diagram_id,
            config,
            store,
            model: GraphModel::new(),
            current: None,
        })
    }

    /// Seeds the session with a result from an earlier session, used for
    /// carry-over on the next pass. Until fresh data arrives through
    /// `apply_graph`, the seeded nodes and edges stand in for the graph.
    pub fn with_previous(mut self, previous: LayoutResult) -> Self {
        self.model = GraphModel {
            nodes: previous.nodes.clone(),
            edges: previous.edges.clone(),
        };
        self.current = Some(previous);
        self
    }

    pub fn diagram_id(&self) -> &str {
        &self.diagram_id
    }

    pub fn current(&self) -> Option<&LayoutResult> {
        self.current.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (Option<LayoutResult>, S) {
        (self.current, self.store)
    }

    /// Fresh graph data arrived.
    pub fn apply_graph(&mut self, model: GraphModel) -> Result<&LayoutResult, LayoutError> {
        let result = recompute(
            &model,
            self.current.as_ref(),
            &self.store,
            &self.diagram_id,
            &self.config,
        )?;
        log::debug!(
            diagram_id:% = self.diagram_id,
            nodes = result.nodes.len(),
            edges = result.edges.len();
            "Applied graph"
        );
        self.model = model;
        Ok(self.current.insert(result))
    }

    /// Flips a node's collapse state and re-lays out from current state
    /// without consulting the store.
    pub fn toggle_collapse(&mut self, node_id: &str) -> Result<&LayoutResult, LayoutError> {
        let mut current = self.current.take().unwrap_or_else(|| LayoutResult {
            diagram_id: self.diagram_id.clone(),
            ..LayoutResult::default()
        });
        let Some(idx) = current.nodes.iter().position(|node| node.id == node_id) else {
            log::warn!(diagram_id:% = self.diagram_id, node_id; "Collapse toggle for unknown node");
            return Ok(self.current.insert(current));
        };
        current.nodes[idx].collapsed = !current.nodes[idx].collapsed;

        let result = recompute_with::<S>(
            &self.model,
            Some(&current),
            None,
            &self.diagram_id,
            &self.config,
        )?;
        Ok(self.current.insert(result))
    }

    /// Records a finished drag: persists the position, then re-lays out.
    pub fn drag_end(&mut self, node_id: &str, position: Point) -> Result<&LayoutResult, LayoutError> {
        if !position.is_finite() {
            return Err(LayoutError::InvalidPosition {
                node_id: node_id.to_string(),
                x: position.x,
                y: position.y,
            });
        }

        let mut current = self.current.take().unwrap_or_else(|| LayoutResult {
            diagram_id: self.diagram_id.clone(),
            ..LayoutResult::default()
        });
        let Some(idx) = current.nodes.iter().position(|node| node.id == node_id) else {
            log::warn!(diagram_id:% = self.diagram_id, node_id; "Drag end for unknown node");
            return Ok(self.current.insert(current));
        };
        current.nodes[idx].position = position;
        current.nodes[idx].manual = true;

        if let Err(err) = self.store.set(&self.diagram_id, node_id, position) {
            log::warn!(
                diagram_id:% = self.diagram_id, node_id, err:%;
                "Failed to persist dragged position, keeping it in memory"
            );
        }

        let result = recompute(
            &self.model,
            Some(&current),
            &self.store,
            &self.diagram_id,
            &self.config,
        )?;
        Ok(self.current.insert(result))
    }
}
