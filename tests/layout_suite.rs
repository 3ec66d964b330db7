use std::path::Path;

use erd_layout::layout::collision::find_collision;
use erd_layout::layout::columns::{ColumnPlan, FALLBACK_COLUMN};
use erd_layout::{
    DiagramKind, DiagramNode, GraphInput, GraphModel, GraphModelBuilder, JsonFilePositionStore,
    LayoutConfig, LayoutResult, LayoutSession, MemoryPositionStore, NodeRole, Point,
    PositionStore, layout_input, recompute,
};
use proptest::prelude::*;

fn load_fixture(rel: &str) -> GraphInput {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    serde_json::from_str(&input).expect("fixture parse failed")
}

fn layout_fixture(rel: &str, kind: DiagramKind) -> LayoutResult {
    let input = load_fixture(rel);
    let config = LayoutConfig::for_kind(kind);
    let store = MemoryPositionStore::new();
    layout_input(&input, kind, &config, &store, "fixture", None).expect("layout failed")
}

fn assert_valid_layout(layout: &LayoutResult, gap: f32, fixture: &str) {
    assert!(
        find_collision(&layout.nodes, gap).is_none(),
        "{fixture}: overlapping nodes"
    );
    for node in &layout.nodes {
        assert!(node.position.is_finite(), "{fixture}: {} not finite", node.id);
        assert!(node.size.height > 0.0, "{fixture}: {} has no height", node.id);
    }
    for edge in &layout.edges {
        assert!(layout.node(&edge.source).is_some(), "{fixture}: dangling edge");
        assert!(layout.node(&edge.target).is_some(), "{fixture}: dangling edge");
    }
}

#[test]
fn lays_out_all_fixtures() {
    let candidates = [
        ("erd/basic.json", DiagramKind::Erd),
        ("erd/malformed.json", DiagramKind::Erd),
        ("erd/loose_records.json", DiagramKind::Erd),
        ("glossary/basic.json", DiagramKind::Glossary),
    ];
    for (rel, kind) in candidates {
        let layout = layout_fixture(rel, kind);
        assert!(!layout.is_empty(), "{rel}: empty layout");
        assert_valid_layout(&layout, LayoutConfig::for_kind(kind).gap, rel);
    }
}

#[test]
fn erd_columns_follow_roles() {
    let layout = layout_fixture("erd/basic.json", DiagramKind::Erd);
    assert_eq!(layout.nodes.len(), 6);
    assert_eq!(layout.edges.len(), 6);

    let x = |id: &str| layout.node(id).unwrap().position.x;
    assert_eq!(x("staging-stg_crm_accounts"), 50.0);
    assert_eq!(x("staging-stg_erp_customers"), 50.0);
    assert_eq!(x("glossary-customer"), 450.0);
    assert_eq!(x("model-dim_customer"), 850.0);
    assert_eq!(x("model-fct_orders"), 850.0);

    // "export" has no canonical column and lands in the fallback one.
    let export = layout.node("export-crm_sync").unwrap();
    assert_eq!(export.position.x, 1250.0);
    assert_eq!(export.position.y, 50.0);

    // 22 fields are capped at 8 visible rows.
    let erp = layout.node("staging-stg_erp_customers").unwrap();
    assert_eq!(erp.field_count, 22);
    assert_eq!(erp.size.height, 48.0 + 8.0 * 28.0 + 16.0);
    let crm = layout.node("staging-stg_crm_accounts").unwrap();
    assert_eq!(erp.position.y, crm.bottom() + 40.0);
}

#[test]
fn malformed_records_are_skipped_not_fatal() {
    let layout = layout_fixture("erd/malformed.json", DiagramKind::Erd);
    let ids: Vec<&str> = layout.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["glossary-customer", "model-fct_orders"]);
    assert_eq!(layout.edges.len(), 1);
}

#[test]
fn loosely_typed_records_do_not_reject_the_document() {
    let layout = layout_fixture("erd/loose_records.json", DiagramKind::Erd);
    let ids: Vec<&str> = layout.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["glossary-1001", "model-7", "staging-stg_orders"]
    );
    assert_eq!(layout.edges.len(), 2);

    // An unknown direction falls back to the role default.
    let staging = layout.node("staging-stg_orders").unwrap();
    assert_eq!(staging.role, NodeRole::Source);
    assert_eq!(layout.edges[1].target, "glossary-1001");
}

#[test]
fn glossary_domains_get_columns() {
    let layout = layout_fixture("glossary/basic.json", DiagramKind::Glossary);
    let x = |id: &str| layout.node(id).unwrap().position.x;
    assert_eq!(x("glossary-clv"), 50.0);
    assert_eq!(x("glossary-revenue"), 400.0);
    assert_eq!(x("glossary-cac"), 750.0);
    assert_eq!(x("glossary-churn"), 1100.0);
    assert_eq!(x("glossary-ltv"), 1100.0);

    let cac = layout.node("glossary-cac").unwrap();
    assert_eq!(cac.role, NodeRole::Source);
    assert!(cac.collapsed);
    assert!(cac.size.width > 220.0);
    assert!(layout.nodes.iter().all(|n| n.position.y >= 100.0));

    let config = LayoutConfig::glossary();
    let plan = ColumnPlan::new(&layout.nodes, &config);
    assert_eq!(
        plan.column_names(),
        vec!["focus", "Finance", "Marketing", "Sales", FALLBACK_COLUMN]
    );
}

#[test]
fn stored_positions_pin_nodes() {
    let input = load_fixture("erd/basic.json");
    let config = LayoutConfig::erd();
    let mut store = MemoryPositionStore::new();
    let stored = Point::new(1500.0, 420.0);
    store.set("erd:customer", "model-dim_customer", stored).unwrap();

    let first =
        layout_input(&input, DiagramKind::Erd, &config, &store, "erd:customer", None).unwrap();
    let second =
        layout_input(&input, DiagramKind::Erd, &config, &store, "erd:customer", Some(&first))
            .unwrap();
    for layout in [&first, &second] {
        let node = layout.node("model-dim_customer").unwrap();
        assert!(node.manual);
        assert_eq!(node.position, stored);
    }
    // The remaining model node moves up into the freed slot.
    assert_eq!(first.node("model-fct_orders").unwrap().position.y, 50.0);
}

#[test]
fn recompute_is_idempotent() {
    let input = load_fixture("erd/basic.json");
    let config = LayoutConfig::erd();
    let mut store = MemoryPositionStore::new();
    store
        .set("erd:customer", "glossary-customer", Point::new(860.0, 120.0))
        .unwrap();
    let model = GraphModelBuilder::new(DiagramKind::Erd, &config).build_input(&input);

    let first = recompute(&model, None, &store, "erd:customer", &config).unwrap();
    let again = recompute(&model, None, &store, "erd:customer", &config).unwrap();
    let carried = recompute(&model, Some(&first), &store, "erd:customer", &config).unwrap();
    assert_eq!(first, again);
    assert_eq!(first, carried);
}

#[test]
fn dropped_relation_removes_node() {
    let mut input = load_fixture("erd/basic.json");
    let config = LayoutConfig::erd();
    let store = MemoryPositionStore::new();
    let first =
        layout_input(&input, DiagramKind::Erd, &config, &store, "erd:customer", None).unwrap();
    assert!(first.node("model-dim_customer").is_some());

    input
        .relations
        .retain(|r| r.related_id.as_deref() != Some("dim_customer"));
    let second =
        layout_input(&input, DiagramKind::Erd, &config, &store, "erd:customer", Some(&first))
            .unwrap();
    assert!(second.node("model-dim_customer").is_none());
    assert!(
        second
            .edges
            .iter()
            .all(|e| e.target != "model-dim_customer" && e.source != "model-dim_customer")
    );
    assert_valid_layout(&second, config.gap, "dropped");
}

#[test]
fn dragged_positions_survive_sessions_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("positions.json");
    let input = load_fixture("erd/basic.json");
    let config = LayoutConfig::erd();
    let model = GraphModelBuilder::new(DiagramKind::Erd, &config).build_input(&input);

    {
        let store = JsonFilePositionStore::open(&path).unwrap();
        let mut session = LayoutSession::new("erd:customer", config.clone(), store).unwrap();
        session.apply_graph(model.clone()).unwrap();
        session
            .drag_end("staging-stg_crm_accounts", Point::new(40.0, 900.0))
            .unwrap();
    }

    let store = JsonFilePositionStore::open(&path).unwrap();
    let mut session = LayoutSession::new("erd:customer", config, store).unwrap();
    let layout = session.apply_graph(model).unwrap();
    let node = layout.node("staging-stg_crm_accounts").unwrap();
    assert!(node.manual);
    assert_eq!(node.position, Point::new(40.0, 900.0));
    // The other staging table now starts at the top of the column.
    assert_eq!(
        layout.node("staging-stg_erp_customers").unwrap().position.y,
        50.0
    );
}

#[test]
fn session_borrows_caller_store() {
    let mut store = MemoryPositionStore::new();
    let config = LayoutConfig::erd();
    let model = GraphModelBuilder::new(DiagramKind::Erd, &config)
        .build_input(&load_fixture("erd/basic.json"));
    {
        let mut session = LayoutSession::new("erd:customer", config, &mut store).unwrap();
        session.apply_graph(model).unwrap();
        session.drag_end("model-fct_orders", Point::new(900.0, 640.0)).unwrap();
    }
    assert_eq!(
        store.get("erd:customer", "model-fct_orders").unwrap(),
        Some(Point::new(900.0, 640.0))
    );
}

const GROUPS: [&str; 5] = ["staging", "glossary", "model", "report", ""];

#[derive(Debug, Clone)]
struct NodeCase {
    group: usize,
    field_count: usize,
    collapsed: bool,
    stored: Option<(f32, f32)>,
}

fn node_case() -> impl Strategy<Value = NodeCase> {
    (
        0..GROUPS.len(),
        0usize..20,
        any::<bool>(),
        proptest::option::of((-200.0f32..1800.0, -100.0f32..1500.0)),
    )
        .prop_map(|(group, field_count, collapsed, stored)| NodeCase {
            group,
            field_count,
            collapsed,
            stored,
        })
}

fn build_case(cases: &[NodeCase]) -> (GraphModel, MemoryPositionStore) {
    let mut model = GraphModel::new();
    let mut store = MemoryPositionStore::new();
    for (idx, case) in cases.iter().enumerate() {
        let id = format!("node-{idx}");
        let mut node = DiagramNode::new(id.clone(), NodeRole::Target, GROUPS[case.group]);
        node.field_count = case.field_count;
        node.collapsed = case.collapsed;
        model.nodes.push(node);
        if let Some((x, y)) = case.stored {
            store.set("prop", &id, Point::new(x, y)).unwrap();
        }
    }
    (model, store)
}

proptest! {
    #[test]
    fn no_horizontally_overlapping_nodes_collide(cases in prop::collection::vec(node_case(), 0..30)) {
        let config = LayoutConfig::erd();
        let (model, store) = build_case(&cases);
        let layout = recompute(&model, None, &store, "prop", &config).unwrap();

        prop_assert_eq!(layout.nodes.len(), cases.len());
        prop_assert!(find_collision(&layout.nodes, config.gap).is_none());
        for (node, case) in layout.nodes.iter().zip(&cases) {
            prop_assert!(node.position.is_finite());
            match case.stored {
                Some((x, y)) => {
                    prop_assert!(node.manual);
                    prop_assert_eq!(node.position.x, x);
                    prop_assert!(node.position.y >= y);
                }
                None => prop_assert!(!node.manual),
            }
        }
    }

    #[test]
    fn recompute_with_previous_is_stable(cases in prop::collection::vec(node_case(), 0..20)) {
        let config = LayoutConfig::erd();
        let (model, store) = build_case(&cases);
        let first = recompute(&model, None, &store, "prop", &config).unwrap();
        let second = recompute(&model, Some(&first), &store, "prop", &config).unwrap();
        prop_assert_eq!(&first, &second);
    }
}
