//! Normalizes fetched relation records into diagram nodes and edges.

use std::collections::HashMap;

use crate::config::{DiagramKind, LayoutConfig};
use crate::ir::{EntityMeta, GraphInput, GraphModel, RawRelation, RelationDirection};
use crate::layout::{DiagramEdge, DiagramNode, NodeRole};

const CENTER_PREFIX: &str = "glossary";
const DEFAULT_RELATION_TYPE: &str = "related";

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub struct GraphModelBuilder {
    kind: DiagramKind,
    collapsed_by_default: bool,
}

impl GraphModelBuilder {
    pub fn new(kind: DiagramKind, config: &LayoutConfig) -> Self {
        Self {
            kind,
            collapsed_by_default: config.collapsed_by_default,
        }
    }

    pub fn build_input(&self, input: &GraphInput) -> GraphModel {
        self.build(&input.relations, Some(&input.focus), input.focus_id())
    }

    /// Builds one center node for the focus plus one node per distinct
    /// related entity and one edge per relation. Records without an id or
    /// role are skipped.
    pub fn build(
        &self,
        relations: &[RawRelation],
        focus: Option<&EntityMeta>,
        focus_id: &str,
    ) -> GraphModel {
        let Some(focus_id) = non_blank(Some(focus_id)) else {
            log::warn!(kind:% = self.kind; "Relation data has no focus id, building empty diagram");
            return GraphModel::new();
        };

        let mut model = GraphModel::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        let center = self.center_node(focus_id, focus);
        let center_id = center.id.clone();
        index.insert(center_id.clone(), 0);
        model.nodes.push(center);

        let mut skipped = 0usize;
        for (position, relation) in relations.iter().enumerate() {
            let Some(related_id) = non_blank(relation.related_id.as_deref()) else {
                log::warn!(position; "Skipping relation without related id");
                skipped += 1;
                continue;
            };
            let Some(role) = non_blank(relation.related_role.as_deref()) else {
                log::warn!(position, related_id; "Skipping relation without related role");
                skipped += 1;
                continue;
            };

            let (prefix, group) = match self.kind {
                DiagramKind::Erd => {
                    let role = role.to_lowercase();
                    (role.clone(), role)
                }
                DiagramKind::Glossary => (CENTER_PREFIX.to_string(), role.to_string()),
            };
            let direction = relation
                .direction
                .unwrap_or_else(|| self.default_direction(&group));
            let node_id = format!("{prefix}-{related_id}");

            if !index.contains_key(&node_id) {
                let node = self.related_node(&node_id, related_id, group, direction, relation);
                index.insert(node_id.clone(), model.nodes.len());
                model.nodes.push(node);
            }

            let relation_type = non_blank(relation.relation_type.as_deref())
                .unwrap_or(DEFAULT_RELATION_TYPE)
                .to_string();
            let (source, target) = match direction {
                RelationDirection::Incoming => (node_id, center_id.clone()),
                RelationDirection::Outgoing => (center_id.clone(), node_id),
            };
            model.edges.push(DiagramEdge {
                source,
                target,
                relation_type,
            });
        }

        log::debug!(
            kind:% = self.kind,
            focus_id,
            nodes = model.nodes.len(),
            edges = model.edges.len(),
            skipped;
            "Built graph model"
        );
        model
    }

    fn default_direction(&self, group: &str) -> RelationDirection {
        match self.kind {
            DiagramKind::Erd if group == "staging" => RelationDirection::Incoming,
            _ => RelationDirection::Outgoing,
        }
    }

    fn center_node(&self, focus_id: &str, focus: Option<&EntityMeta>) -> DiagramNode {
        let mut node = DiagramNode::new(
            format!("{CENTER_PREFIX}-{focus_id}"),
            NodeRole::Center,
            self.kind.center_group(),
        );
        node.collapsed = self.collapsed_by_default;
        if let Some(meta) = focus {
            if let Some(label) = non_blank(meta.label.as_deref()) {
                node.label = label.to_string();
            } else {
                node.label = focus_id.to_string();
            }
            node.domain = non_blank(meta.domain.as_deref()).map(str::to_string);
            node.fields = meta.fields.clone();
        } else {
            node.label = focus_id.to_string();
        }
        node.field_count = node.fields.len();
        node
    }

    fn related_node(
        &self,
        node_id: &str,
        related_id: &str,
        group: String,
        direction: RelationDirection,
        relation: &RawRelation,
    ) -> DiagramNode {
        let role = match direction {
            RelationDirection::Incoming => NodeRole::Source,
            RelationDirection::Outgoing => NodeRole::Target,
        };
        let domain = match self.kind {
            DiagramKind::Glossary => Some(group.clone()),
            DiagramKind::Erd => non_blank(relation.related_domain.as_deref()).map(str::to_string),
        };
        let mut node = DiagramNode::new(node_id, role, group);
        node.label = non_blank(relation.related_label.as_deref())
            .unwrap_or(related_id)
            .to_string();
        node.domain = domain;
        node.collapsed = self.collapsed_by_default;
        node.fields = relation.related_field_summary.clone();
        node.field_count = relation
            .field_count
            .unwrap_or(node.fields.len())
            .max(node.fields.len());
        node
    }
}
