//! Streaming Java/MyBatis/DDL ingestion into a labelled property graph.
//!
//! [`analyze`] is the single public entry point: it composes the
//! streaming orchestrator (C4), graph writer (C5), and post-parse resolver
//! (C6) described in spec.md §4, and returns the structured run summary
//! spec.md §7 calls for. Everything else in this crate — front-ends (C1),
//! the rule-driven name extractor (C2), artifact extractors (C3), and the
//! `GraphStore` abstraction (C5) — is reachable for callers that want to
//! drive a custom store or a subset of the pipeline directly.

pub mod bundle;
pub mod config;
pub mod error;
pub mod extract;
pub mod frontend;
pub mod model;
pub mod orchestrator;
pub mod resolver;
pub mod rules;
pub mod summary;
pub mod writer;

use tracing::info_span;

pub use bundle::ArtifactBundle;
pub use config::IngestConfig;
pub use error::IngestError;
pub use rules::LogicalNameRuleSet;
pub use summary::RunSummary;
pub use writer::{GraphStore, GraphWriter, InMemoryGraphStore, WriteStats};

/// Runs one `analyze` pass: enumerates `config.java_root` (and
/// `config.ddl_root`, if set), parses every recognized file with a
/// rayon worker pool, writes the resulting artifact bundles into `store`
/// under batched transactions, then — unless `--class-name` narrowed the
/// run or this is a dry run — executes the three resolver passes from
/// spec.md §4.6.
///
/// `rules` drives C2's logical-name extraction; pass
/// `&LogicalNameRuleSet::default()` when no rule file is configured.
pub fn analyze(
    config: &IngestConfig,
    rules: &LogicalNameRuleSet,
    store: Box<dyn GraphStore>,
) -> Result<RunSummary, IngestError> {
    config.validate()?;

    let span = info_span!("ingest", project = %config.project_name, mode = mode_label(config));
    let _guard = span.enter();

    let writer = GraphWriter::new(store, config.dry_run, config.write_timeout);

    let mut roots = vec![config.java_root.clone()];
    if let Some(ddl_root) = &config.ddl_root {
        if ddl_root != &config.java_root {
            roots.push(ddl_root.clone());
        }
    }

    let (summary, mut writer) = orchestrator::ingest(&roots, config, writer, rules)?;
    writer.close().map_err(|e| IngestError::WritePermanent(e.to_string()))?;
    Ok(summary)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_on_empty_root_succeeds_with_zero_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = IngestConfig::new("demo", dir.path());
        let store: Box<dyn GraphStore> = Box::new(InMemoryGraphStore::new());
        let summary = analyze(&config, &LogicalNameRuleSet::default(), store).unwrap();
        assert_eq!(summary.files_total, 0);
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn analyze_parses_a_single_controller_service_pair() {
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
        std::fs::write(
            dir.path().join("UserService.java"),
            r#"
            @Service
            class UserService {}
            "#,
        )
        .unwrap();

        let mut config = IngestConfig::new("demo", dir.path());
        config.clean = true;
        let store: Box<dyn GraphStore> = Box::new(InMemoryGraphStore::new());
        let summary = analyze(&config, &LogicalNameRuleSet::default(), store).unwrap();

        assert_eq!(summary.files_failed, 0);
        assert_eq!(summary.files_ok, 2);
        assert_eq!(summary.nodes_by_kind.get("Bean").copied(), Some(2));
        assert_eq!(summary.edges_by_kind.get("DEPENDS_ON").copied(), Some(1));
    }

    #[test]
    fn analyze_skips_a_file_that_fails_to_parse_but_continues() {
        // Invalid UTF-8 bytes fail at the read step (`read_to_string`),
        // which is a deterministic per-file failure regardless of
        // tree-sitter's statement-opaque tolerance for malformed-but-valid
        // source text.
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Good.java"), "class Good {}").unwrap();
        std::fs::write(dir.path().join("Bad.java"), [0x43, 0x6c, 0x61, 0x73, 0x73, 0xff, 0xfe]).unwrap();

        let mut config = IngestConfig::new("demo", dir.path());
        config.clean = true;
        let store: Box<dyn GraphStore> = Box::new(InMemoryGraphStore::new());
        let summary = analyze(&config, &LogicalNameRuleSet::default(), store).unwrap();

        assert_eq!(summary.exit_code(), 3);
        assert_eq!(summary.files_ok, 1);
        assert_eq!(summary.files_failed, 1);
        assert!(summary.nodes_by_kind.get("Class").copied().unwrap_or(0) >= 1);
    }

    #[test]
    fn fatal_write_error_cancels_run_and_skips_resolver() {
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
        config.worker_count = 1;
        config.cancellation_grace_period = std::time::Duration::from_millis(50);

        let mut inner_store = InMemoryGraphStore::new();
        inner_store.fail_next_write_fatally();
        let store: Box<dyn GraphStore> = Box::new(inner_store);

        let result = analyze(&config, &LogicalNameRuleSet::default(), store);
        assert!(matches!(result, Err(IngestError::Cancelled)));
    }

    #[test]
    fn class_name_filter_disables_resolver_passes() {
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
        config.class_name_filter = Some("UserController".to_string());
        let store: Box<dyn GraphStore> = Box::new(InMemoryGraphStore::new());
        let summary = analyze(&config, &LogicalNameRuleSet::default(), store).unwrap();

        assert_eq!(summary.files_ok, 1);
        assert!(summary.edges_by_kind.get("DEPENDS_ON").is_none());
    }
}
