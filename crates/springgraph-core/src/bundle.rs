//! `ArtifactBundle` — the single record shape exchanged between a parser
//! worker and the writer consumer (spec.md §9, "Builder/config patterns").

use std::path::PathBuf;

use crate::error::ExtractionError;
use crate::model::{Edge, Node};

/// Everything one source file contributed: its nodes (parents before
/// children, per spec.md §5 ordering), the local edges among them, and any
/// semantic anomalies noticed along the way (spec.md §7 `ExtractionError`
/// — the file still parsed, so extraction continues best-effort).
#[derive(Debug, Clone, Default)]
pub struct ArtifactBundle {
    pub source_path: PathBuf,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub extraction_errors: Vec<ExtractionError>,
}

impl ArtifactBundle {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        ArtifactBundle {
            source_path: source_path.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            extraction_errors: Vec::new(),
        }
    }

    pub fn push_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn push_extraction_error(&mut self, message: impl Into<String>) {
        let path = self.source_path.clone();
        self.extraction_errors.push(ExtractionError::new(path, message));
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Drops source text from any `Class` nodes; called after a successful
    /// write to keep the bundle's memory bounded (spec.md §5).
    pub fn clear_source_text(&mut self) {
        for node in &mut self.nodes {
            if let crate::model::Node::Class(class) = node {
                class.source_text = None;
            }
        }
    }
}
