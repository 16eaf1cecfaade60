//! `springgraph` — the `analyze` entry point for the ingestion engine in
//! `springgraph-core`. `sequence`/`crud-matrix`/`db-call-chain` are named
//! here only to document the dispatch surface spec.md §6 describes; they
//! are downstream renderers this engine does not implement.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use springgraph_core::config::ObjectScope;
use springgraph_core::{analyze, GraphStore, IngestConfig, IngestError, InMemoryGraphStore, LogicalNameRuleSet, RunSummary};

#[derive(Parser)]
#[command(name = "springgraph", version, about = "Spring-Boot + DDL ingestion into a labelled property graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a Spring-Boot source tree (and optional DDL scripts) into the graph store
    Analyze(AnalyzeArgs),
    /// Render a sequence diagram from the populated graph (handled by a downstream tool)
    Sequence,
    /// Render a CRUD matrix from the populated graph (handled by a downstream tool)
    CrudMatrix,
    /// Trace a method's call chain down to the tables it touches (handled by a downstream tool)
    DbCallChain,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Root directory of the Java/MyBatis source tree
    java_root: PathBuf,

    /// Project name this run's nodes are scoped under
    #[arg(long)]
    project_name: String,

    /// Root directory of DDL scripts, if separate from `java_root`
    #[arg(long)]
    ddl_root: Option<PathBuf>,

    /// Parse only Java/MyBatis/config sources
    #[arg(long)]
    java_object: bool,

    /// Parse only DDL scripts
    #[arg(long)]
    db_object: bool,

    /// Parse both Java and DDL sources (default; overrides --java-object/--db-object)
    #[arg(long)]
    all_objects: bool,

    /// Delete the project's existing nodes before ingesting
    #[arg(long, conflicts_with = "update")]
    clean: bool,

    /// Upsert without deleting anything first
    #[arg(long, conflicts_with = "clean")]
    update: bool,

    /// Limit parsing to source files whose name contains this substring; disables resolver passes
    #[arg(long)]
    class_name: Option<String>,

    /// Run the full pipeline but discard writes, reporting only what would have been written
    #[arg(long)]
    dry_run: bool,

    /// Override the worker pool size (default: number of processor cores)
    #[arg(long)]
    workers: Option<usize>,

    /// Emit the run summary as JSON instead of human-readable text
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::Sequence | Command::CrudMatrix | Command::DbCallChain => {
            eprintln!("this subcommand is handled by a downstream tool that reads the populated graph");
            2
        }
    }
}

/// Maps `IngestError`/CLI-level failures onto spec.md §6's exit codes: 2 for
/// configuration errors (missing root, invalid flag combination), 4 for
/// anything that aborted mid-run. A successful `analyze` call still maps
/// its `RunSummary::exit_code()` (0 or 3) straight through.
fn run_analyze(args: AnalyzeArgs) -> i32 {
    if !args.java_root.exists() {
        eprintln!("configuration error: java root does not exist: {}", args.java_root.display());
        return 2;
    }

    let mut config = IngestConfig::from_env(args.project_name.clone(), args.java_root.clone());
    if let Some(ddl_root) = &args.ddl_root {
        config.ddl_root = Some(ddl_root.clone());
    }
    config.clean = args.clean;
    config.update = args.update;
    config.dry_run = args.dry_run;
    config.class_name_filter = args.class_name.clone();
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    config.object_scope = if args.all_objects || (!args.java_object && !args.db_object) {
        ObjectScope::All
    } else if args.java_object {
        ObjectScope::JavaOnly
    } else {
        ObjectScope::DbOnly
    };

    if let Err(e) = config.validate() {
        eprintln!("{e}");
        return 2;
    }

    let rules = LogicalNameRuleSet::default();
    let store: Box<dyn GraphStore> = Box::new(InMemoryGraphStore::new());

    let summary = match analyze(&config, &rules, store) {
        Ok(summary) => summary,
        Err(err @ IngestError::Config(_)) => {
            eprintln!("{err}");
            return 2;
        }
        Err(err @ IngestError::RootEnumeration { .. }) => {
            eprintln!("{err}");
            return 2;
        }
        Err(err @ (IngestError::WritePermanent(_) | IngestError::Cancelled)) => {
            eprintln!("fatal run error: {err}");
            return 4;
        }
    };

    if let Err(e) = print_summary(&summary, args.json) {
        eprintln!("fatal run error: {e}");
        return 4;
    }
    summary.exit_code()
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(&SummaryView::from(summary))?);
        return Ok(());
    }

    println!("files: {} total, {} ok, {} failed", summary.files_total, summary.files_ok, summary.files_failed);
    if !summary.nodes_by_kind.is_empty() {
        println!("nodes:");
        for (kind, count) in &summary.nodes_by_kind {
            println!("  {kind}: {count}");
        }
    }
    if !summary.edges_by_kind.is_empty() {
        println!("edges:");
        for (kind, count) in &summary.edges_by_kind {
            println!("  {kind}: {count}");
        }
    }
    if !summary.phase_durations.is_empty() {
        println!("phases:");
        for (phase, duration) in &summary.phase_durations {
            println!("  {phase}: {}ms", duration.as_millis());
        }
    }
    for diagnostic in &summary.diagnostics {
        println!("diagnostic: {}", diagnostic.message);
    }
    Ok(())
}

/// A `serde`-friendly projection of [`RunSummary`] for `--json` output;
/// `RunSummary` itself stays free of a `serde` dependency since it is also
/// consumed purely in-process by library callers.
#[derive(serde::Serialize)]
struct SummaryView {
    files_total: usize,
    files_ok: usize,
    files_failed: usize,
    nodes_by_kind: std::collections::BTreeMap<String, usize>,
    edges_by_kind: std::collections::BTreeMap<String, usize>,
    phase_durations_ms: std::collections::BTreeMap<String, u128>,
    diagnostics: Vec<String>,
    exit_code: i32,
}

impl From<&RunSummary> for SummaryView {
    fn from(summary: &RunSummary) -> Self {
        SummaryView {
            files_total: summary.files_total,
            files_ok: summary.files_ok,
            files_failed: summary.files_failed,
            nodes_by_kind: summary.nodes_by_kind.clone(),
            edges_by_kind: summary.edges_by_kind.clone(),
            phase_durations_ms: summary.phase_durations.iter().map(|(k, v)| (k.clone(), v.as_millis())).collect(),
            diagnostics: summary.diagnostics.iter().map(|d| d.message.clone()).collect(),
            exit_code: summary.exit_code(),
        }
    }
}
