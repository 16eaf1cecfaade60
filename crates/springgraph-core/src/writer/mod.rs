//! Graph writer (C5): the `GraphStore` abstraction, an in-memory reference
//! implementation, and `GraphWriter`, the batching/retry layer the
//! orchestrator's single consumer drives.

pub mod in_memory;

pub use in_memory::InMemoryGraphStore;

use std::time::Duration;

use tracing::{debug, warn};

use crate::bundle::ArtifactBundle;
use crate::error::WriteError;
use crate::model::{Edge, EdgeKind, Node, NodeId, NodeKind};

/// The graph store's own storage engine and query planner are external
/// collaborators (spec.md §1); this trait is the seam the core writes
/// and queries through.
pub trait GraphStore: Send {
    /// In clean mode, delete all nodes descending from `project_name` before
    /// proceeding; in update mode, preserve existing nodes.
    fn ensure_project(&mut self, project_name: &str, clean: bool) -> Result<(), WriteError>;

    /// Upserts every node in `bundle` and its local edges as one
    /// transaction. Idempotent: re-applying an identical bundle is a no-op
    /// beyond property updates.
    fn write_bundle(&mut self, bundle: &ArtifactBundle) -> Result<(), WriteError>;

    fn upsert_edge(&mut self, edge: Edge) -> Result<(), WriteError>;

    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<Node>;

    fn node(&self, id: &NodeId) -> Option<Node>;

    fn edges_of_kind(&self, kind: EdgeKind) -> Vec<Edge>;

    fn edge_exists(&self, kind: EdgeKind, from: &NodeId, to: &NodeId) -> bool;

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;

    fn close(&mut self) -> Result<(), WriteError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub bundles_written: usize,
    pub bundles_failed: usize,
}

impl std::ops::AddAssign for WriteStats {
    fn add_assign(&mut self, rhs: Self) {
        self.bundles_written += rhs.bundles_written;
        self.bundles_failed += rhs.bundles_failed;
    }
}

/// Batches bundles by the order the channel delivers them, retrying
/// transient failures with exponential backoff and recursively splitting a
/// batch that fails permanently (spec.md §4.5) so one poison bundle does
/// not sink the rest.
pub struct GraphWriter {
    store: Box<dyn GraphStore>,
    max_retries: u32,
    dry_run: bool,
    fatal: bool,
    write_timeout: Duration,
}

impl GraphWriter {
    pub fn new(store: Box<dyn GraphStore>, dry_run: bool, write_timeout: Duration) -> Self {
        GraphWriter {
            store,
            max_retries: 3,
            dry_run,
            fatal: false,
            write_timeout,
        }
    }

    /// Set once a batch write hits `WriteError::Fatal` — the orchestrator
    /// checks this after every `apply_batch` call to decide whether to
    /// cancel the run (spec.md §4.4/§5).
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn ensure_project(&mut self, project_name: &str, clean: bool) -> Result<(), WriteError> {
        if self.dry_run {
            return Ok(());
        }
        self.store.ensure_project(project_name, clean)
    }

    /// `apply_batch` from spec.md §4.5: writes every bundle in `batch`
    /// within conceptually one transaction, retrying and splitting on
    /// failure as needed. In dry-run mode nothing is written but the
    /// bundles are still counted.
    pub fn apply_batch(&mut self, batch: Vec<ArtifactBundle>) -> WriteStats {
        if self.dry_run {
            return WriteStats {
                bundles_written: batch.len(),
                bundles_failed: 0,
            };
        }
        self.apply_batch_inner(batch, 0)
    }

    fn apply_batch_inner(&mut self, batch: Vec<ArtifactBundle>, depth: u32) -> WriteStats {
        if batch.is_empty() {
            return WriteStats::default();
        }

        match self.write_with_retry(&batch) {
            Ok(()) => {
                debug!(batch_size = batch.len(), "batch commit");
                WriteStats {
                    bundles_written: batch.len(),
                    bundles_failed: 0,
                }
            }
            Err(WriteError::Permanent(reason)) if batch.len() > 1 => {
                warn!(batch_size = batch.len(), %reason, "permanent failure, splitting batch");
                let mid = batch.len() / 2;
                let mut iter = batch.into_iter();
                let first: Vec<_> = (&mut iter).take(mid).collect();
                let second: Vec<_> = iter.collect();
                let mut stats = self.apply_batch_inner(first, depth + 1);
                stats += self.apply_batch_inner(second, depth + 1);
                stats
            }
            Err(WriteError::Permanent(reason)) => {
                warn!(path = %batch[0].source_path.display(), %reason, "bundle permanently failed, skipping");
                WriteStats {
                    bundles_written: 0,
                    bundles_failed: 1,
                }
            }
            Err(WriteError::Transient(reason)) => {
                warn!(batch_size = batch.len(), %reason, "batch write failed after retries, skipping");
                WriteStats {
                    bundles_written: 0,
                    bundles_failed: batch.len(),
                }
            }
            Err(WriteError::Fatal(reason)) => {
                warn!(batch_size = batch.len(), %reason, "fatal write error, run will be cancelled");
                self.fatal = true;
                WriteStats {
                    bundles_written: 0,
                    bundles_failed: batch.len(),
                }
            }
        }
    }

    /// A batch write exceeding `write_timeout` (spec.md §5: "write
    /// transactions carry a per-transaction timeout, default 60s") is folded
    /// into the same transient-retry path as a store-reported transient
    /// error rather than treated specially: `write_bundle` is defined as
    /// idempotent, so re-applying a batch that actually succeeded but ran
    /// slow is a no-op beyond property updates, not a correctness risk.
    fn write_with_retry(&mut self, batch: &[ArtifactBundle]) -> Result<(), WriteError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let started = std::time::Instant::now();
            let result = batch.iter().try_for_each(|b| self.store.write_bundle(b));
            let elapsed = started.elapsed();
            let result = match result {
                Ok(()) if elapsed > self.write_timeout => {
                    warn!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        timeout_ms = self.write_timeout.as_millis() as u64,
                        "batch write exceeded configured timeout, treating as transient"
                    );
                    Err(WriteError::Transient(format!("write exceeded {:?} timeout", self.write_timeout)))
                }
                other => other,
            };
            match result {
                Ok(()) => return Ok(()),
                Err(WriteError::Transient(reason)) if attempt <= self.max_retries => {
                    let backoff = Duration::from_millis(100 * 2u64.pow(attempt.min(6)));
                    warn!(attempt, %reason, backoff_ms = backoff.as_millis() as u64, "retrying batch write");
                    std::thread::sleep(backoff);
                    continue;
                }
                Err(other) => return Err(other),
            }
        }
    }

    pub fn create_method_sql_relationships(&mut self, project_name: &str) -> (usize, Vec<crate::error::ResolverError>) {
        crate::resolver::resolve_method_sql_bindings(self.store.as_mut(), project_name)
    }

    pub fn resolve_bean_dependencies(&mut self, project_name: &str) -> (usize, Vec<crate::error::ResolverError>) {
        crate::resolver::resolve_bean_dependencies(self.store.as_mut(), project_name)
    }

    pub fn resolve_table_usage(&mut self, project_name: &str) -> (usize, Vec<String>, Vec<crate::error::ResolverError>) {
        crate::resolver::resolve_table_usage(self.store.as_mut(), project_name)
    }

    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }

    pub fn close(&mut self) -> Result<(), WriteError> {
        self.store.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// A scripted `GraphStore` that answers a fixed queue of results (or an
    /// artificial delay) per `write_bundle` call, one write per bundle —
    /// enough to drive `GraphWriter`'s retry/split/timeout policy without
    /// `InMemoryGraphStore`'s full node/edge bookkeeping.
    #[derive(Default)]
    struct ScriptedStore {
        results: VecDeque<Result<(), WriteError>>,
        delay: Option<Duration>,
        writes_seen: usize,
    }

    impl GraphStore for ScriptedStore {
        fn ensure_project(&mut self, _project_name: &str, _clean: bool) -> Result<(), WriteError> {
            Ok(())
        }

        fn write_bundle(&mut self, _bundle: &ArtifactBundle) -> Result<(), WriteError> {
            self.writes_seen += 1;
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            self.results.pop_front().unwrap_or(Ok(()))
        }

        fn upsert_edge(&mut self, _edge: Edge) -> Result<(), WriteError> {
            Ok(())
        }

        fn nodes_of_kind(&self, _kind: NodeKind) -> Vec<Node> {
            Vec::new()
        }

        fn node(&self, _id: &NodeId) -> Option<Node> {
            None
        }

        fn edges_of_kind(&self, _kind: EdgeKind) -> Vec<Edge> {
            Vec::new()
        }

        fn edge_exists(&self, _kind: EdgeKind, _from: &NodeId, _to: &NodeId) -> bool {
            false
        }

        fn node_count(&self) -> usize {
            0
        }

        fn edge_count(&self) -> usize {
            0
        }

        fn close(&mut self) -> Result<(), WriteError> {
            Ok(())
        }
    }

    fn bundle(name: &str) -> ArtifactBundle {
        ArtifactBundle::new(name)
    }

    #[test]
    fn transient_failure_retries_then_succeeds() {
        let mut store = ScriptedStore::default();
        store.results.push_back(Err(WriteError::Transient("timeout".into())));
        store.results.push_back(Ok(()));
        let mut writer = GraphWriter::new(Box::new(store), false, Duration::from_secs(60));

        let stats = writer.apply_batch(vec![bundle("a.java")]);
        assert_eq!(stats.bundles_written, 1);
        assert_eq!(stats.bundles_failed, 0);
    }

    #[test]
    fn permanent_failure_splits_batch_and_isolates_poison_bundle() {
        // Second bundle always fails permanently; the first and third
        // should still land once the batch is recursively halved.
        let mut store = ScriptedStore::default();
        store.results.push_back(Err(WriteError::Permanent("bad bundle".into())));
        store.results.push_back(Err(WriteError::Permanent("bad bundle".into())));
        store.results.push_back(Ok(()));
        store.results.push_back(Ok(()));
        let mut writer = GraphWriter::new(Box::new(store), false, Duration::from_secs(60));

        let stats = writer.apply_batch(vec![bundle("a.java"), bundle("b.java"), bundle("c.java")]);
        assert_eq!(stats.bundles_failed, 1);
        assert_eq!(stats.bundles_written, 2);
    }

    #[test]
    fn fatal_failure_sets_is_fatal_and_fails_the_whole_batch() {
        let mut store = ScriptedStore::default();
        store.results.push_back(Err(WriteError::Fatal("connection lost".into())));
        let mut writer = GraphWriter::new(Box::new(store), false, Duration::from_secs(60));

        let stats = writer.apply_batch(vec![bundle("a.java"), bundle("b.java")]);
        assert!(writer.is_fatal());
        assert_eq!(stats.bundles_failed, 2);
        assert_eq!(stats.bundles_written, 0);
    }

    #[test]
    fn write_exceeding_configured_timeout_is_retried_as_transient() {
        let mut store = ScriptedStore::default();
        store.delay = Some(Duration::from_millis(20));
        let mut writer = GraphWriter::new(Box::new(store), false, Duration::from_millis(1));

        let stats = writer.apply_batch(vec![bundle("a.java")]);
        // every attempt is "slow" against a 1ms timeout, so the batch is
        // retried `max_retries` times and then counted as failed rather
        // than looping forever.
        assert_eq!(stats.bundles_written, 0);
        assert_eq!(stats.bundles_failed, 1);
    }

    #[test]
    fn dry_run_counts_bundles_without_writing() {
        let store = ScriptedStore::default();
        let mut writer = GraphWriter::new(Box::new(store), true, Duration::from_secs(60));

        let stats = writer.apply_batch(vec![bundle("a.java"), bundle("b.java")]);
        assert_eq!(stats.bundles_written, 2);
        assert_eq!(stats.bundles_failed, 0);
    }
}
