use thiserror::Error;

/// Caller contract violations. Data-quality problems never surface here.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("diagram id must not be empty")]
    MissingDiagramId,
    #[error("position for node {node_id} is not finite: ({x}, {y})")]
    InvalidPosition { node_id: String, x: f32, y: f32 },
}
