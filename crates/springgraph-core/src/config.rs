//! Runtime configuration consumed by [`crate::analyze`].
//!
//! Loading this from environment variables or a config file is external to
//! the core (spec.md §1/§6); `springgraph-cli` provides a convenience
//! loader, not the authoritative mechanism.

use std::path::PathBuf;

/// Which file kinds a run considers, per `--java-object`/`--db-object`/
/// `--all-objects` (spec.md §6). Scoping to one side still walks a single
/// `java_root`/`ddl_root` pair — it filters which recognized extensions are
/// dispatched to workers, not which directories are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectScope {
    #[default]
    All,
    JavaOnly,
    DbOnly,
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub project_name: String,
    pub java_root: PathBuf,
    pub ddl_root: Option<PathBuf>,
    pub worker_count: usize,
    pub batch_size: usize,
    pub clean: bool,
    pub update: bool,
    pub dry_run: bool,
    pub class_name_filter: Option<String>,
    pub object_scope: ObjectScope,
    pub cancellation_grace_period: std::time::Duration,
    pub write_timeout: std::time::Duration,
}

impl IngestConfig {
    pub fn new(project_name: impl Into<String>, java_root: impl Into<PathBuf>) -> Self {
        IngestConfig {
            project_name: project_name.into(),
            java_root: java_root.into(),
            ddl_root: None,
            worker_count: num_cpus(),
            batch_size: 200,
            clean: false,
            update: false,
            dry_run: false,
            class_name_filter: None,
            object_scope: ObjectScope::All,
            cancellation_grace_period: std::time::Duration::from_secs(30),
            write_timeout: std::time::Duration::from_secs(60),
        }
    }

    /// Reads the recognized environment keys from spec.md §6 that the core
    /// itself consumes: DDL root, worker count, batch size. The
    /// graph-store URI, database name, and credentials are recognized keys
    /// too, but connecting to a real store is external to the core
    /// (spec.md §1) — `springgraph-cli` reads those directly when it
    /// constructs a `GraphStore`, not through this loader.
    pub fn from_env(project_name: impl Into<String>, java_root: impl Into<PathBuf>) -> Self {
        let mut config = IngestConfig::new(project_name, java_root);
        if let Ok(ddl_root) = std::env::var("SPRINGGRAPH_DDL_ROOT") {
            config.ddl_root = Some(PathBuf::from(ddl_root));
        }
        if let Ok(workers) = std::env::var("SPRINGGRAPH_WORKER_COUNT") {
            if let Ok(n) = workers.parse() {
                config.worker_count = n;
            }
        }
        if let Ok(batch) = std::env::var("SPRINGGRAPH_BATCH_SIZE") {
            if let Ok(n) = batch.parse() {
                config.batch_size = n;
            }
        }
        config
    }

    /// `--class-name` limits parsing to matching source files and disables
    /// resolver passes (spec.md §6).
    pub fn resolver_enabled(&self) -> bool {
        self.class_name_filter.is_none()
    }

    pub fn validate(&self) -> Result<(), crate::error::IngestError> {
        if self.project_name.trim().is_empty() {
            return Err(crate::error::IngestError::Config("project_name must not be empty".into()));
        }
        if self.clean && self.update {
            return Err(crate::error::IngestError::Config(
                "--clean and --update are mutually exclusive".into(),
            ));
        }
        if !(1..=64).contains(&self.worker_count) {
            return Err(crate::error::IngestError::Config(format!(
                "worker_count {} out of permitted range 1..64",
                self.worker_count
            )));
        }
        if self.batch_size == 0 {
            return Err(crate::error::IngestError::Config("batch_size must be positive".into()));
        }
        Ok(())
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_and_update_together_is_invalid() {
        let mut cfg = IngestConfig::new("demo", "/tmp/demo");
        cfg.clean = true;
        cfg.update = true;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn class_name_filter_disables_resolver() {
        let mut cfg = IngestConfig::new("demo", "/tmp/demo");
        assert!(cfg.resolver_enabled());
        cfg.class_name_filter = Some("UserService".into());
        assert!(!cfg.resolver_enabled());
    }

    #[test]
    fn from_env_reads_worker_and_batch_overrides() {
        std::env::set_var("SPRINGGRAPH_WORKER_COUNT", "3");
        std::env::set_var("SPRINGGRAPH_BATCH_SIZE", "50");
        let cfg = IngestConfig::from_env("demo", "/tmp/demo");
        assert_eq!(cfg.worker_count, 3);
        assert_eq!(cfg.batch_size, 50);
        std::env::remove_var("SPRINGGRAPH_WORKER_COUNT");
        std::env::remove_var("SPRINGGRAPH_BATCH_SIZE");
    }
}
