use std::collections::HashMap;

use erd_layout::layout_dump::LayoutDump;
use erd_layout::{
    DiagramKind, GraphInput, LayoutConfig, LayoutResult, MemoryPositionStore, Point,
    PositionStore, layout_input,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOptions {
    diagram_id: Option<String>,
    kind: Option<DiagramKind>,
    #[serde(default)]
    stored_positions: HashMap<String, Point>,
    previous_layout: Option<LayoutDump>,
}

fn compute(input_json: &str, options: LayoutOptions) -> Result<LayoutDump, String> {
    let input: GraphInput = serde_json::from_str(input_json).map_err(|e| e.to_string())?;
    let kind = options.kind.unwrap_or(DiagramKind::Erd);
    let diagram_id = options
        .diagram_id
        .unwrap_or_else(|| format!("{}:{}", kind, input.focus_id()));

    // The host owns persistence; positions it hands over live for this call only.
    let mut store = MemoryPositionStore::new();
    for (node_id, point) in options.stored_positions {
        store
            .set(&diagram_id, &node_id, point)
            .map_err(|e| e.to_string())?;
    }

    let previous: Option<LayoutResult> = options.previous_layout.map(LayoutDump::into_layout);
    let config = LayoutConfig::for_kind(kind);
    let layout = layout_input(&input, kind, &config, &store, &diagram_id, previous.as_ref())
        .map_err(|e| e.to_string())?;
    Ok(LayoutDump::from_layout(&layout, kind))
}

#[wasm_bindgen]
pub fn recompute_layout(input_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<LayoutOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        LayoutOptions::default()
    };

    let dump = compute(input_json, options).map_err(|error| JsValue::from_str(&error))?;
    serde_json::to_string(&dump).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::{LayoutOptions, compute};

    const INPUT: &str = r#"{
        "focus": { "id": "orders", "label": "Orders" },
        "relations": [
            { "relationType": "maps_to", "relatedId": "stg_orders", "relatedRole": "staging" },
            { "relationType": "implements", "relatedId": "fct_orders", "relatedRole": "model",
              "fieldCount": 6 }
        ]
    }"#;

    #[test]
    fn lays_out_with_stored_positions() {
        let options: LayoutOptions = serde_json::from_str(
            r#"{ "storedPositions": { "model-fct_orders": { "x": 1200, "y": 300 } } }"#,
        )
        .unwrap();
        let dump = compute(INPUT, options).expect("layout should succeed");

        assert_eq!(dump.diagram_id, "erd:orders");
        assert_eq!(dump.nodes.len(), 3);
        let pinned = dump.nodes.iter().find(|n| n.id == "model-fct_orders").unwrap();
        assert!(pinned.manual);
        assert_eq!((pinned.position.x, pinned.position.y), (1200.0, 300.0));
        let staging = dump.nodes.iter().find(|n| n.id == "staging-stg_orders").unwrap();
        assert_eq!(staging.position.x, 50.0);
    }

    #[test]
    fn previous_layout_carries_collapse_state() {
        let first = compute(INPUT, LayoutOptions::default()).unwrap();
        let mut previous = first.clone();
        for node in &mut previous.nodes {
            node.collapsed = true;
        }
        let options = LayoutOptions {
            previous_layout: Some(previous),
            ..LayoutOptions::default()
        };
        let second = compute(INPUT, options).unwrap();
        assert!(second.nodes.iter().all(|n| n.collapsed));
        assert!(second.height < first.height);
    }
}
