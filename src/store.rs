//! Durable per-diagram node positions.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::layout::Point;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("position store I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("position store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored position for {diagram_id}/{node_id} is unusable: {reason}")]
    Corrupt {
        diagram_id: String,
        node_id: String,
        reason: String,
    },
}

/// Key-value persistence of user-placed node positions, keyed by
/// `(diagram_id, node_id)`.
pub trait PositionStore {
    fn get(&self, diagram_id: &str, node_id: &str) -> Result<Option<Point>, StoreError>;

    fn set(&mut self, diagram_id: &str, node_id: &str, position: Point) -> Result<(), StoreError>;
}

impl<S: PositionStore + ?Sized> PositionStore for &mut S {
    fn get(&self, diagram_id: &str, node_id: &str) -> Result<Option<Point>, StoreError> {
        (**self).get(diagram_id, node_id)
    }

    fn set(&mut self, diagram_id: &str, node_id: &str, position: Point) -> Result<(), StoreError> {
        (**self).set(diagram_id, node_id, position)
    }
}

impl<S: PositionStore + ?Sized> PositionStore for Box<S> {
    fn get(&self, diagram_id: &str, node_id: &str) -> Result<Option<Point>, StoreError> {
        (**self).get(diagram_id, node_id)
    }

    fn set(&mut self, diagram_id: &str, node_id: &str, position: Point) -> Result<(), StoreError> {
        (**self).set(diagram_id, node_id, position)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPositionStore {
    entries: HashMap<(String, String), Point>,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PositionStore for MemoryPositionStore {
    fn get(&self, diagram_id: &str, node_id: &str) -> Result<Option<Point>, StoreError> {
        Ok(self
            .entries
            .get(&(diagram_id.to_string(), node_id.to_string()))
            .copied())
    }

    fn set(&mut self, diagram_id: &str, node_id: &str, position: Point) -> Result<(), StoreError> {
        self.entries
            .insert((diagram_id.to_string(), node_id.to_string()), position);
        Ok(())
    }
}

type DiagramEntries = BTreeMap<String, serde_json::Value>;

/// Positions kept in one JSON file shaped `{ diagramId: { nodeId: {x, y} } }`.
///
/// Entries are decoded on lookup, so a single damaged entry only affects its
/// own node. Every `set` rewrites the file through a temporary file in the
/// same directory and an atomic rename.
#[derive(Debug)]
pub struct JsonFilePositionStore {
    path: PathBuf,
    diagrams: BTreeMap<String, DiagramEntries>,
}

impl JsonFilePositionStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let diagrams = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(diagrams) => diagrams,
                Err(err) => {
                    log::warn!(
                        path:% = path.display(), err:%;
                        "Ignoring unreadable position store"
                    );
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, diagrams })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, &self.diagrams)?;
        file.write_all(b"\n")?;
        file.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl PositionStore for JsonFilePositionStore {
    fn get(&self, diagram_id: &str, node_id: &str) -> Result<Option<Point>, StoreError> {
        let Some(value) = self
            .diagrams
            .get(diagram_id)
            .and_then(|entries| entries.get(node_id))
        else {
            return Ok(None);
        };
        let corrupt = |reason: String| StoreError::Corrupt {
            diagram_id: diagram_id.to_string(),
            node_id: node_id.to_string(),
            reason,
        };
        let point: Point =
            serde_json::from_value(value.clone()).map_err(|err| corrupt(err.to_string()))?;
        if !point.is_finite() {
            return Err(corrupt("coordinates are not finite".to_string()));
        }
        Ok(Some(point))
    }

    fn set(&mut self, diagram_id: &str, node_id: &str, position: Point) -> Result<(), StoreError> {
        let value = serde_json::to_value(position)?;
        self.diagrams
            .entry(diagram_id.to_string())
            .or_default()
            .insert(node_id.to_string(), value);
        self.persist()
    }
}
