//! Summary & lifecycle (C7): counts artifacts, times phases, and emits the
//! structured run summary spec.md §7 describes as the user-visible output.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub path: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn warn(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warn,
            path: None,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            path: None,
            message: message.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

pub struct PhaseTimer {
    name: &'static str,
    start: Instant,
}

impl PhaseTimer {
    pub fn start(name: &'static str) -> Self {
        PhaseTimer { name, start: Instant::now() }
    }

    pub fn finish(self, summary: &mut RunSummary) {
        summary.phase_durations.insert(self.name.to_string(), self.start.elapsed());
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub files_total: usize,
    pub files_ok: usize,
    pub files_failed: usize,
    pub nodes_by_kind: BTreeMap<String, usize>,
    pub edges_by_kind: BTreeMap<String, usize>,
    pub phase_durations: BTreeMap<String, Duration>,
    pub diagnostics: Vec<Diagnostic>,
    pub dry_run: bool,
}

impl RunSummary {
    pub fn new() -> Self {
        RunSummary::default()
    }

    pub fn record_file_ok(&mut self) {
        self.files_total += 1;
        self.files_ok += 1;
    }

    pub fn record_file_failed(&mut self, diagnostic: Diagnostic) {
        self.files_total += 1;
        self.files_failed += 1;
        self.diagnostics.push(diagnostic);
    }

    /// Exit code per spec.md §6: 0 success, 3 partial success (≥1 file-level
    /// error but the run completed). Fatal (exit 4) and config (exit 2)
    /// errors never reach a `RunSummary` — they propagate as `IngestError`.
    pub fn exit_code(&self) -> i32 {
        if self.files_failed > 0 {
            3
        } else {
            0
        }
    }

    pub fn add_counts_from_store(&mut self, store: &dyn crate::writer::GraphStore) {
        use crate::model::{EdgeKind, NodeKind};

        const NODE_KINDS: &[NodeKind] = &[
            NodeKind::Project,
            NodeKind::Package,
            NodeKind::Class,
            NodeKind::Method,
            NodeKind::Field,
            NodeKind::Annotation,
            NodeKind::Bean,
            NodeKind::Endpoint,
            NodeKind::JpaEntity,
            NodeKind::JpaRepository,
            NodeKind::JpaQuery,
            NodeKind::MyBatisMapper,
            NodeKind::SqlStatement,
            NodeKind::Database,
            NodeKind::Table,
            NodeKind::Column,
            NodeKind::Index,
            NodeKind::Constraint,
            NodeKind::TestClass,
            NodeKind::ConfigFile,
        ];
        const EDGE_KINDS: &[EdgeKind] = &[
            EdgeKind::HasPackage,
            EdgeKind::Contains,
            EdgeKind::HasMethod,
            EdgeKind::HasField,
            EdgeKind::Extends,
            EdgeKind::Implements,
            EdgeKind::HasAnnotation,
            EdgeKind::DeclaresBean,
            EdgeKind::HasEndpoint,
            EdgeKind::DependsOn,
            EdgeKind::HasSqlStatement,
            EdgeKind::Calls,
            EdgeKind::UsesTable,
            EdgeKind::HasColumn,
        ];

        for kind in NODE_KINDS {
            let count = store.nodes_of_kind(*kind).len();
            if count > 0 {
                self.nodes_by_kind.insert(kind.as_str().to_string(), count);
            }
        }
        for kind in EDGE_KINDS {
            let count = store.edges_of_kind(*kind).len();
            if count > 0 {
                self.edges_by_kind.insert(kind.as_str().to_string(), count);
            }
        }
    }
}
