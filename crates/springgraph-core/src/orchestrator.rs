//! Streaming orchestrator (C4): enumerates files, dispatches to a rayon
//! worker pool, and feeds a single writer consumer over a bounded
//! `crossbeam-channel` (spec.md §4.4/§5).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::bundle::ArtifactBundle;
use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::extract;
use crate::frontend::{config_file::ConfigFileFrontend, ddl::DdlFrontend, java::JavaFrontend, mybatis::MyBatisFrontend};
use crate::model::{ConfigFile, Database, Node, Table};
use crate::rules::LogicalNameRuleSet;
use crate::summary::{Diagnostic, PhaseTimer, RunSummary};
use crate::writer::{GraphWriter, WriteStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Java,
    MyBatisXml,
    Ddl,
    Config,
}

fn classify(path: &Path) -> Option<FileKind> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("java") => Some(FileKind::Java),
        Some("xml") => Some(FileKind::MyBatisXml),
        Some("sql") => Some(FileKind::Ddl),
        Some("yml") | Some("yaml") | Some("properties") => Some(FileKind::Config),
        _ => None,
    }
}

fn is_excluded(entry: &walkdir::DirEntry) -> bool {
    const EXCLUDED_DIRS: &[&str] = &["target", "build", "node_modules", ".git"];
    entry.file_name().to_str().map(|name| name.starts_with('.') || EXCLUDED_DIRS.contains(&name)).unwrap_or(false)
        && entry.depth() > 0
}

fn enumerate_files(root: &Path) -> Result<Vec<(PathBuf, FileKind)>, std::io::Error> {
    let abs_root = nova_core::path::AbsPathBuf::canonicalize(root)?;
    let mut files = Vec::new();
    let walker = walkdir::WalkDir::new(abs_root.as_path()).into_iter().filter_entry(|e| !is_excluded(e));
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            if let Some(kind) = classify(entry.path()) {
                files.push((entry.path().to_path_buf(), kind));
            }
        }
    }
    Ok(files)
}

enum WorkerMessage {
    Bundle(ArtifactBundle),
    Ok,
    FileError { path: String, message: String },
}

fn parse_and_extract(
    path: &Path,
    kind: FileKind,
    project_name: &str,
    rules: &LogicalNameRuleSet,
) -> Result<Option<ArtifactBundle>, String> {
    let source = std::fs::read_to_string(path).map_err(|e| format!("read error: {e}"))?;

    match kind {
        FileKind::Java => {
            let cu = JavaFrontend::default().parse(path, &source).map_err(|e| e.to_string())?;
            Ok(Some(extract::extract_compilation_unit(project_name, path, &source, &cu, rules)))
        }
        FileKind::MyBatisXml => {
            let xml = MyBatisFrontend.parse(path, &source).map_err(|e| e.to_string())?;
            let (mapper, statements) = extract::mybatis::xml_mapper(project_name, &path.display().to_string(), &xml);
            let mut bundle = ArtifactBundle::new(path);
            let mapper_id = mapper.identity();
            bundle.push_node(Node::MyBatisMapper(mapper));
            for stmt in statements {
                let stmt_id = stmt.identity();
                bundle.push_node(Node::SqlStatement(stmt));
                bundle.push_edge(crate::model::Edge::new(crate::model::EdgeKind::HasSqlStatement, mapper_id.clone(), stmt_id));
            }
            Ok(Some(bundle))
        }
        FileKind::Ddl => {
            let script = DdlFrontend.parse(path, &source).map_err(|e| e.to_string())?;
            let mut bundle = ArtifactBundle::new(path);
            let database_name = script.database_names.first().cloned().unwrap_or_else(|| "default".to_string());
            let database = Database {
                project_name: project_name.to_string(),
                name: database_name.clone(),
            };
            let db_id = database.identity();
            bundle.push_node(Node::Database(database));
            for table in script.tables {
                let model_table = Table {
                    project_name: project_name.to_string(),
                    database_name: database_name.clone(),
                    name: table.name.clone(),
                };
                let table_id = model_table.identity();
                bundle.push_node(Node::Table(model_table));
                bundle.push_edge(crate::model::Edge::new(crate::model::EdgeKind::Contains, db_id.clone(), table_id.clone()));
                for column in table.columns {
                    let model_column = crate::model::Column {
                        project_name: project_name.to_string(),
                        table_name: table.name.clone(),
                        name: column.name,
                        data_type: column.data_type,
                        nullable: column.nullable,
                        default_value: column.default_value,
                    };
                    let column_id = model_column.identity();
                    bundle.push_node(Node::Column(model_column));
                    bundle.push_edge(crate::model::Edge::new(crate::model::EdgeKind::HasColumn, table_id.clone(), column_id));
                }
                for index in table.indexes {
                    bundle.push_node(Node::Index(crate::model::Index {
                        project_name: project_name.to_string(),
                        table_name: table.name.clone(),
                        name: index.name,
                        columns: index.columns,
                        unique: index.unique,
                    }));
                }
                for constraint in table.constraints {
                    bundle.push_node(Node::Constraint(crate::model::Constraint {
                        project_name: project_name.to_string(),
                        table_name: table.name.clone(),
                        name: constraint.name,
                        constraint_type: constraint.constraint_type,
                        columns: constraint.columns,
                    }));
                }
            }
            Ok(Some(bundle))
        }
        FileKind::Config => {
            let entries = ConfigFileFrontend.parse(path, &source).map_err(|e| e.to_string())?;
            let mut bundle = ArtifactBundle::new(path);
            bundle.push_node(Node::ConfigFile(ConfigFile {
                project_name: project_name.to_string(),
                path: path.display().to_string(),
                entries,
            }));
            Ok(Some(bundle))
        }
    }
}

/// `ingest(roots, config) -> RunStats` from spec.md §4.4, wired through
/// `springgraph-core::analyze`. `roots` is usually just `[java_root]`; a
/// configured `ddl_root` outside the Java tree is appended and its files
/// merged into the same enumeration, batch stream, and resolver pass so
/// DDL living in a separate directory does not require a second
/// `ensure_project` (which, in clean mode, would wipe the first root's
/// writes).
pub fn ingest(
    roots: &[PathBuf],
    config: &IngestConfig,
    mut writer: GraphWriter,
    rules: &LogicalNameRuleSet,
) -> Result<(RunSummary, GraphWriter), IngestError> {
    let mut files = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for root in roots {
        let root_files = enumerate_files(root).map_err(|source| IngestError::RootEnumeration {
            path: root.clone(),
            source,
        })?;
        for entry in root_files {
            if seen.insert(entry.0.clone()) {
                files.push(entry);
            }
        }
    }

    if let Some(filter) = &config.class_name_filter {
        files.retain(|(path, kind)| {
            *kind != FileKind::Java
                || path.file_stem().and_then(|s| s.to_str()).map(|s| s.contains(filter.as_str())).unwrap_or(false)
        });
    }

    match config.object_scope {
        crate::config::ObjectScope::All => {}
        crate::config::ObjectScope::JavaOnly => {
            files.retain(|(_, kind)| matches!(kind, FileKind::Java | FileKind::MyBatisXml | FileKind::Config));
        }
        crate::config::ObjectScope::DbOnly => {
            files.retain(|(_, kind)| matches!(kind, FileKind::Ddl));
        }
    }

    info!(project = config.project_name, files_total = files.len(), mode = mode_label(config), "ingest start");

    let mut summary = RunSummary::new();
    summary.dry_run = config.dry_run;
    writer.ensure_project(&config.project_name, config.clean).map_err(|e| IngestError::WritePermanent(e.to_string()))?;

    let parse_timer = PhaseTimer::start("parse_and_write");

    let total = files.len();
    let dispatched = Arc::new(AtomicUsize::new(0));
    let last_reported_decile = Arc::new(AtomicUsize::new(0));
    let cancelled = Arc::new(AtomicBool::new(false));

    let channel_capacity = config.worker_count.saturating_mul(2).max(4);
    let (tx, rx) = crossbeam_channel::bounded::<WorkerMessage>(channel_capacity);

    let project_name = config.project_name.clone();
    let batch_size = config.batch_size;
    let grace_period = config.cancellation_grace_period;

    let write_stats = std::thread::scope(|scope| -> Result<(WriteStats, bool), IngestError> {
        let consumer_cancelled = cancelled.clone();
        let consumer = scope.spawn(move || -> (RunSummary, GraphWriter, WriteStats, bool) {
            let mut pending = Vec::new();
            let mut write_stats = WriteStats::default();
            let mut run_cancelled = false;

            loop {
                let msg = match rx.recv() {
                    Ok(msg) => msg,
                    Err(_) => break,
                };
                match msg {
                    WorkerMessage::Ok => summary.record_file_ok(),
                    WorkerMessage::Bundle(bundle) => {
                        summary.record_file_ok();
                        for err in &bundle.extraction_errors {
                            warn!(path = %err.path.display(), message = %err.message, "extraction anomaly");
                            summary
                                .diagnostics
                                .push(Diagnostic::warn(err.message.clone()).with_path(err.path.display().to_string()));
                        }
                        pending.push(bundle);
                    }
                    WorkerMessage::FileError { path, message } => {
                        warn!(path, message, "file-level parse/extraction error");
                        summary.record_file_failed(Diagnostic::warn(message).with_path(path));
                    }
                }
                if pending.len() >= batch_size {
                    let batch = std::mem::take(&mut pending);
                    write_stats += writer.apply_batch(batch);
                    if writer.is_fatal() {
                        run_cancelled = true;
                        break;
                    }
                }
            }

            if run_cancelled {
                // Fatal write error (spec.md §4.4): stop accepting new jobs,
                // drain whatever is already in flight for a bounded grace
                // period rather than dropping it silently, then stop.
                consumer_cancelled.store(true, Ordering::Relaxed);
                let deadline = std::time::Instant::now() + grace_period;
                loop {
                    let remaining = deadline.saturating_duration_since(std::time::Instant::now());
                    if remaining.is_zero() {
                        break;
                    }
                    match rx.recv_timeout(remaining) {
                        Ok(WorkerMessage::Bundle(_)) | Ok(WorkerMessage::Ok) => write_stats.bundles_failed += 1,
                        Ok(WorkerMessage::FileError { path, message }) => {
                            summary.record_file_failed(Diagnostic::warn(message).with_path(path));
                        }
                        Err(_) => break,
                    }
                }
            } else if !pending.is_empty() {
                write_stats += writer.apply_batch(pending);
                if writer.is_fatal() {
                    run_cancelled = true;
                }
            }

            (summary, writer, write_stats, run_cancelled)
        });

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_count)
            .build()
            .map_err(|e| IngestError::Config(format!("failed to start worker pool: {e}")))?;

        pool.scope(|s| {
            for (path, kind) in &files {
                let tx = tx.clone();
                let project_name = project_name.clone();
                let rules = rules.clone();
                let dispatched = dispatched.clone();
                let last_reported_decile = last_reported_decile.clone();
                let cancelled = cancelled.clone();
                s.spawn(move |_| {
                    if cancelled.load(Ordering::Relaxed) {
                        return;
                    }
                    let result = parse_and_extract(path, *kind, &project_name, &rules);
                    let message = match result {
                        Ok(Some(bundle)) => WorkerMessage::Bundle(bundle),
                        Ok(None) => WorkerMessage::Ok,
                        Err(message) => WorkerMessage::FileError {
                            path: path.display().to_string(),
                            message,
                        },
                    };
                    let _ = tx.send(message);

                    let done = dispatched.fetch_add(1, Ordering::Relaxed) + 1;
                    report_progress(done, total, &last_reported_decile);
                });
            }
        });
        drop(tx);

        let (consumer_summary, consumer_writer, stats, run_cancelled) =
            consumer.join().map_err(|_| IngestError::Config("writer thread panicked".into()))?;
        summary = consumer_summary;
        writer = consumer_writer;
        Ok((stats, run_cancelled))
    })?;

    let (write_stats, run_cancelled) = write_stats;
    parse_timer.finish(&mut summary);
    debug!(written = write_stats.bundles_written, failed = write_stats.bundles_failed, "streaming phase complete");

    if run_cancelled {
        warn!(project = config.project_name, "run cancelled after fatal write error, closing writer and skipping resolver");
        writer.close().map_err(|e| IngestError::WritePermanent(e.to_string()))?;
        return Err(IngestError::Cancelled);
    }

    if config.resolver_enabled() && !config.dry_run {
        let resolver_timer = PhaseTimer::start("resolver");
        let (bean_edges, bean_errors) = writer.resolve_bean_dependencies(&config.project_name);
        let (sql_edges, sql_errors) = writer.create_method_sql_relationships(&config.project_name);
        let (table_edges, missing_tables, table_errors) = writer.resolve_table_usage(&config.project_name);
        for missing in missing_tables {
            summary.diagnostics.push(Diagnostic::warn(format!("unresolved table reference: {missing}")));
        }
        for err in bean_errors.into_iter().chain(sql_errors).chain(table_errors) {
            warn!(pass = err.pass, message = %err.message, "resolver pass edge failure");
            summary.diagnostics.push(Diagnostic::warn(err.to_string()));
        }
        info!(bean_edges, sql_edges, table_edges, "resolver passes complete");
        resolver_timer.finish(&mut summary);
    }

    summary.add_counts_from_store(writer.store());
    Ok((summary, writer))
}

fn mode_label(config: &IngestConfig) -> &'static str {
    if config.dry_run {
        "dry-run"
    } else if config.clean {
        "clean"
    } else if config.update {
        "update"
    } else {
        "default"
    }
}

fn report_progress(done: usize, total: usize, last_reported_decile: &AtomicUsize) {
    if total == 0 {
        return;
    }
    let decile = (done * 10) / total;
    let prev = last_reported_decile.fetch_max(decile, Ordering::Relaxed);
    if decile > prev {
        info!(done, total, percent = decile * 10, "ingest progress");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_extensions() {
        assert_eq!(classify(Path::new("Foo.java")), Some(FileKind::Java));
        assert_eq!(classify(Path::new("Foo.xml")), Some(FileKind::MyBatisXml));
        assert_eq!(classify(Path::new("schema.sql")), Some(FileKind::Ddl));
        assert_eq!(classify(Path::new("application.yml")), Some(FileKind::Config));
        assert_eq!(classify(Path::new("README.md")), None);
    }

    #[test]
    fn enumerate_files_on_missing_root_is_an_error() {
        let result = enumerate_files(Path::new("/nonexistent/path/for/test"));
        assert!(result.is_err());
    }

    #[test]
    fn clean_ingest_twice_on_same_store_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("UserController.java"),
            r#"
            @RestController
            class UserController {
                UserController(UserService userService) {}
            }
            "#,
        )
        .unwrap();
        std::fs::write(dir.path().join("UserService.java"), "@Service class UserService {}").unwrap();

        let mut config = IngestConfig::new("demo", dir.path());
        config.clean = true;
        let rules = LogicalNameRuleSet::default();
        let roots = vec![dir.path().to_path_buf()];

        let writer = GraphWriter::new(Box::new(crate::writer::InMemoryGraphStore::new()), false, config.write_timeout);
        let (first_summary, writer) = ingest(&roots, &config, writer, &rules).unwrap();

        let (second_summary, _writer) = ingest(&roots, &config, writer, &rules).unwrap();

        assert_eq!(first_summary.nodes_by_kind, second_summary.nodes_by_kind);
        assert_eq!(first_summary.edges_by_kind, second_summary.edges_by_kind);
    }
}
