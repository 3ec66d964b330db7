use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

use crate::layout::{DiagramEdge, DiagramNode};

/// Direction of a relation as seen from the focus entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationDirection {
    /// The related entity feeds the focus (`related -> focus`).
    Incoming,
    /// The focus feeds the related entity (`focus -> related`).
    Outgoing,
}

/// One row of a node's detail panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Metadata of the focus entity or term, fetched separately from its relations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMeta {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, alias = "fieldSummary")]
    pub fields: Vec<FieldSummary>,
}

/// A relation record as delivered by the metadata query collaborator.
///
/// Every field is optional on the wire; records missing an id or role are
/// skipped by the builder rather than rejected at decode time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRelation {
    #[serde(default)]
    pub relation_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub related_id: Option<String>,
    #[serde(default)]
    pub related_role: Option<String>,
    #[serde(default)]
    pub related_label: Option<String>,
    #[serde(default)]
    pub related_domain: Option<String>,
    /// Unrecognized values decode as `None` so the builder's default applies.
    #[serde(default, deserialize_with = "known_direction")]
    pub direction: Option<RelationDirection>,
    /// Total number of fields when the summary below is truncated.
    #[serde(default)]
    pub field_count: Option<usize>,
    #[serde(default)]
    pub related_field_summary: Vec<FieldSummary>,
}

/// Everything fetched for one diagram: the focus and its relations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphInput {
    #[serde(default)]
    pub focus: EntityMeta,
    /// Records that fail to decode are logged and dropped one by one.
    #[serde(default, deserialize_with = "tolerant_relations")]
    pub relations: Vec<RawRelation>,
}

/// Ids arrive as strings from most sources and as numbers from some.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}

fn known_direction<'de, D>(deserializer: D) -> Result<Option<RelationDirection>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(text)) => text,
        Some(other) => {
            log::warn!(direction:% = other; "Ignoring non-string relation direction");
            return Ok(None);
        }
    };
    match text.trim().to_ascii_lowercase().as_str() {
        "incoming" => Ok(Some(RelationDirection::Incoming)),
        "outgoing" => Ok(Some(RelationDirection::Outgoing)),
        _ => {
            log::warn!(direction:% = text; "Ignoring unknown relation direction");
            Ok(None)
        }
    }
}

fn tolerant_relations<'de, D>(deserializer: D) -> Result<Vec<RawRelation>, D::Error>
where
    D: Deserializer<'de>,
{
    let records = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    let mut relations = Vec::with_capacity(records.len());
    for (position, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<RawRelation>(record) {
            Ok(relation) => relations.push(relation),
            Err(err) => log::warn!(position, err:%; "Skipping undecodable relation record"),
        }
    }
    Ok(relations)
}

impl GraphInput {
    pub fn focus_id(&self) -> &str {
        self.focus.id.as_deref().unwrap_or_default()
    }
}

/// Normalized nodes and edges, not yet positioned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphModel {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }
}
