//! `InMemoryGraphStore` — a full, non-stub `GraphStore` implementation
//! backed by `HashMap`s, playing the same role for tests that
//! `nova-db::InMemoryFileStore` plays for the source database. This is the
//! store `springgraph-core`'s own test suite exercises invariants against.

use std::collections::{HashMap, HashSet};

use crate::error::WriteError;
use crate::model::{Edge, EdgeKind, Node, NodeId, NodeKind};
use crate::writer::GraphStore;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EdgeKey {
    kind: EdgeKind,
    from: NodeId,
    to: NodeId,
}

#[derive(Default)]
pub struct InMemoryGraphStore {
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeKey, Edge>,
    /// Simulates transient write failures for a bounded number of calls;
    /// used by writer retry tests. Not part of the public contract.
    fail_next_n_writes: usize,
    /// Simulates an unrecoverable connection loss on the next write; used by
    /// orchestrator cancellation tests. Not part of the public contract.
    fail_next_write_fatally: bool,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        InMemoryGraphStore::default()
    }

    /// Test hook: the next `n` calls to `write_bundle` return a transient
    /// error before succeeding.
    pub fn fail_next_writes(&mut self, n: usize) {
        self.fail_next_n_writes = n;
    }

    /// Test hook: the next call to `write_bundle` returns a fatal error, as
    /// if the store's connection had been lost (spec.md §4.4).
    pub fn fail_next_write_fatally(&mut self) {
        self.fail_next_write_fatally = true;
    }
}

impl GraphStore for InMemoryGraphStore {
    fn ensure_project(&mut self, project_name: &str, clean: bool) -> Result<(), WriteError> {
        if clean {
            let removed: HashSet<NodeId> = self
                .nodes
                .iter()
                .filter(|(_, n)| n.project_name() == project_name)
                .map(|(id, _)| id.clone())
                .collect();
            self.nodes.retain(|id, _| !removed.contains(id));
            self.edges.retain(|k, _| !removed.contains(&k.from) && !removed.contains(&k.to));
        }
        let project = crate::model::Project {
            name: project_name.to_string(),
        };
        self.nodes.insert(project.identity(), Node::Project(project));
        Ok(())
    }

    fn write_bundle(&mut self, bundle: &crate::bundle::ArtifactBundle) -> Result<(), WriteError> {
        if self.fail_next_write_fatally {
            self.fail_next_write_fatally = false;
            return Err(WriteError::Fatal("simulated connection loss".to_string()));
        }
        if self.fail_next_n_writes > 0 {
            self.fail_next_n_writes -= 1;
            return Err(WriteError::Transient("simulated transient failure".to_string()));
        }
        for node in &bundle.nodes {
            self.nodes.insert(node.identity(), node.clone());
        }
        for edge in &bundle.edges {
            self.edges.insert(
                EdgeKey {
                    kind: edge.kind,
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                },
                edge.clone(),
            );
        }
        Ok(())
    }

    fn upsert_edge(&mut self, edge: Edge) -> Result<(), WriteError> {
        self.edges.insert(
            EdgeKey {
                kind: edge.kind,
                from: edge.from.clone(),
                to: edge.to.clone(),
            },
            edge,
        );
        Ok(())
    }

    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<Node> {
        self.nodes.values().filter(|n| n.kind() == kind).cloned().collect()
    }

    fn node(&self, id: &NodeId) -> Option<Node> {
        self.nodes.get(id).cloned()
    }

    fn edges_of_kind(&self, kind: EdgeKind) -> Vec<Edge> {
        self.edges.values().filter(|e| e.kind == kind).cloned().collect()
    }

    fn edge_exists(&self, kind: EdgeKind, from: &NodeId, to: &NodeId) -> bool {
        self.edges.contains_key(&EdgeKey {
            kind,
            from: from.clone(),
            to: to.clone(),
        })
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn close(&mut self) -> Result<(), WriteError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::ArtifactBundle;
    use crate::model::{Class, ClassKind};

    fn sample_class(name: &str) -> Node {
        Node::Class(Class {
            project_name: "demo".into(),
            name: name.into(),
            kind: ClassKind::Class,
            modifiers: vec![],
            file_path: format!("{name}.java"),
            source_text: None,
            logical_name: None,
            description: None,
        })
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut store = InMemoryGraphStore::new();
        store.ensure_project("demo", true).unwrap();

        let mut bundle = ArtifactBundle::new("UserService.java");
        bundle.push_node(sample_class("UserService"));
        store.write_bundle(&bundle).unwrap();
        store.write_bundle(&bundle).unwrap();

        assert_eq!(store.nodes_of_kind(NodeKind::Class).len(), 1);
    }

    #[test]
    fn clean_mode_removes_prior_project_nodes() {
        let mut store = InMemoryGraphStore::new();
        store.ensure_project("demo", true).unwrap();
        let mut bundle = ArtifactBundle::new("UserService.java");
        bundle.push_node(sample_class("UserService"));
        store.write_bundle(&bundle).unwrap();
        assert_eq!(store.nodes_of_kind(NodeKind::Class).len(), 1);

        store.ensure_project("demo", true).unwrap();
        assert_eq!(store.nodes_of_kind(NodeKind::Class).len(), 0);
    }
}
