pub mod builder;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod store;

pub use builder::GraphModelBuilder;
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, DiagramKind, LayoutConfig, NodeSizeConfig, load_config};
pub use ir::{EntityMeta, FieldSummary, GraphInput, GraphModel, RawRelation, RelationDirection};
pub use layout::{
    DiagramEdge, DiagramNode, LayoutError, LayoutResult, LayoutSession, NodeRole, Point, Size,
    recompute,
};
pub use store::{JsonFilePositionStore, MemoryPositionStore, PositionStore, StoreError};

/// Builds the diagram for `input` and lays it out in one pass.
pub fn layout_input<S: PositionStore + ?Sized>(
    input: &GraphInput,
    kind: DiagramKind,
    config: &LayoutConfig,
    store: &S,
    diagram_id: &str,
    previous: Option<&LayoutResult>,
) -> Result<LayoutResult, LayoutError> {
    let model = GraphModelBuilder::new(kind, config).build_input(input);
    recompute(&model, previous, store, diagram_id, config)
}
