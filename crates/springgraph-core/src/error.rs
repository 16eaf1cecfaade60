//! Error kinds from spec.md §7, wrapped under a single top-level type.
//!
//! Only `ConfigError` and unrecoverable write/orchestrator failures
//! propagate out of [`crate::analyze`]; everything else becomes a
//! [`crate::summary::Diagnostic`] on the run summary.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("fatal i/o error enumerating {path}: {source}")]
    RootEnumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("graph store write failed permanently after retries: {0}")]
    WritePermanent(String),

    #[error("run cancelled")]
    Cancelled,
}

/// A single file's parse failure — never propagated, always converted into
/// a diagnostic attached to the run summary.
#[derive(Debug, thiserror::Error)]
#[error("{path}: {message}")]
pub struct ParseError {
    pub path: PathBuf,
    pub message: String,
    pub excerpt: Option<String>,
}

impl ParseError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ParseError {
            path: path.into(),
            message: message.into(),
            excerpt: None,
        }
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }
}

/// A semantic anomaly found while extracting artifacts from an otherwise
/// parseable file — logged at warn, best-effort fields are still emitted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{path}: {message}")]
pub struct ExtractionError {
    pub path: PathBuf,
    pub message: String,
}

impl ExtractionError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ExtractionError {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors a [`crate::writer::GraphStore`] implementation can return from a
/// single batch attempt. `Transient` triggers retry/backoff; `Permanent`
/// triggers the recursive batch-split policy in spec.md §4.5.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("transient write error: {0}")]
    Transient(String),

    #[error("permanent write error: {0}")]
    Permanent(String),

    /// The store connection itself is gone (spec.md §4.4: "writer connection
    /// lost and unrecoverable"). Unlike `Permanent`, retry/split is pointless
    /// — the orchestrator cancels the whole run instead of isolating a batch.
    #[error("fatal write error: {0}")]
    Fatal(String),
}

/// One resolver pass's failure. Independent of the other passes — spec.md
/// §4.6 "Failure semantics".
#[derive(Debug, thiserror::Error)]
#[error("resolver pass {pass} failed: {message}")]
pub struct ResolverError {
    pub pass: &'static str,
    pub message: String,
}
