use crate::config::DiagramKind;
use crate::layout::{DiagramEdge, DiagramNode, LayoutResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// What the rendering surface consumes: positioned nodes, edges and the
/// overall extent for fitting the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub diagram_id: String,
    pub kind: DiagramKind,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

impl LayoutDump {
    pub fn from_layout(layout: &LayoutResult, kind: DiagramKind) -> Self {
        let (width, height) = layout
            .bounds()
            .map(|b| (b.max_x.max(0.0), b.max_y.max(0.0)))
            .unwrap_or((0.0, 0.0));
        Self {
            diagram_id: layout.diagram_id.clone(),
            kind,
            width,
            height,
            nodes: layout.nodes.clone(),
            edges: layout.edges.clone(),
        }
    }

    pub fn into_layout(self) -> LayoutResult {
        LayoutResult {
            diagram_id: self.diagram_id,
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &LayoutResult, kind: DiagramKind) -> anyhow::Result<()> {
    let dump = LayoutDump::from_layout(layout, kind);
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &dump)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn read_layout_dump(path: &Path) -> anyhow::Result<LayoutDump> {
    let file = File::open(path)?;
    let dump = serde_json::from_reader(BufReader::new(file))?;
    Ok(dump)
}
