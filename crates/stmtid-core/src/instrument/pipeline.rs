//! Build orchestration with Rayon-based parallelism.
//!
//! Units are visited in parallel, each against a fresh unit-local registry.
//! Once every worker has finished, the local registries are merged into the
//! build registry in path order and the manifest is exported exactly once.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::InstrumentSettings;
use crate::errors::StmtResult;
use crate::instrument::filesystem::{scan_source_files, SourceFile};
use crate::instrument::pass::{InstrumentationPass, SourceUnit, Visit, VisitStats};
use crate::instrument::registry::StatementRegistry;
use crate::manifest::ManifestExporter;

/// Where instrumented sources go.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Only build the registry (and manifest).
    #[default]
    Discard,
    /// Rewrite changed files in place.
    InPlace,
    /// Mirror every scanned file into this directory.
    Directory(PathBuf),
}

#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub settings: InstrumentSettings,
    pub include: Vec<String>,
    pub output: OutputMode,
    pub workers: usize,
}

impl BuildOptions {
    pub fn new(settings: InstrumentSettings) -> Self {
        Self {
            settings,
            include: Vec::new(),
            output: OutputMode::Discard,
            workers: 4,
        }
    }
}

/// Outcome of visiting one file on a worker.
pub struct FileResult {
    pub relative_path: String,
    pub original: String,
    pub visit: Option<Visit>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct BuildReport {
    pub files_seen: usize,
    pub files_visited: usize,
    pub files_changed: usize,
    pub files_written: usize,
    pub read_errors: usize,
    pub stats: VisitStats,
    pub statements: usize,
    pub manifest_path: Option<PathBuf>,
    pub elapsed_ms: u128,
}

fn instrument_file_worker(root: &Path, file: &SourceFile, pass: InstrumentationPass) -> FileResult {
    let absolute = root.join(&file.relative_path);
    let source = match std::fs::read_to_string(&absolute) {
        Ok(s) => s,
        Err(e) => {
            return FileResult {
                relative_path: file.relative_path.clone(),
                original: String::new(),
                visit: None,
                error: Some(e.to_string()),
            }
        }
    };

    let unit = SourceUnit::new(file.relative_path.clone(), file.language, source.clone());
    let visit = pass.visit(unit, StatementRegistry::new());
    FileResult {
        relative_path: file.relative_path.clone(),
        original: source,
        visit: Some(visit),
        error: None,
    }
}

/// Visit every file, preserving the order of `files` in the result.
pub fn parallel_instrument(
    root: &Path,
    files: &[SourceFile],
    pass: InstrumentationPass,
    workers: usize,
) -> Vec<FileResult> {
    if files.is_empty() {
        return vec![];
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build();

    match pool {
        Ok(pool) => pool.install(|| {
            files
                .par_iter()
                .map(|f| instrument_file_worker(root, f, pass))
                .collect()
        }),
        Err(e) => {
            warn!(error = %e, "thread pool unavailable, instrumenting sequentially");
            files
                .iter()
                .map(|f| instrument_file_worker(root, f, pass))
                .collect()
        }
    }
}

/// Merge per-file results into one registry, in the order given.
pub fn merge_results(
    results: Vec<FileResult>,
    registry: &mut StatementRegistry,
    report: &mut BuildReport,
) -> Vec<(String, String, String)> {
    let mut changed = Vec::new();
    for result in results {
        if let Some(error) = result.error {
            warn!(path = %result.relative_path, error = %error, "failed to read source file");
            report.read_errors += 1;
            continue;
        }
        let Some(visit) = result.visit else {
            continue;
        };
        report.files_visited += 1;
        report.stats.add(&visit.stats);
        registry.merge(visit.registry);
        changed.push((result.relative_path, result.original, visit.unit.source));
    }
    changed
}

fn write_outputs(
    root: &Path,
    output: &OutputMode,
    files: &[(String, String, String)],
    report: &mut BuildReport,
) -> StmtResult<()> {
    for (relative_path, original, rewritten) in files {
        let is_changed = original != rewritten;
        if is_changed {
            report.files_changed += 1;
        }
        let target = match output {
            OutputMode::Discard => continue,
            OutputMode::InPlace if !is_changed => continue,
            OutputMode::InPlace => root.join(relative_path),
            OutputMode::Directory(dir) => dir.join(relative_path),
        };
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, rewritten)?;
        report.files_written += 1;
        debug!(path = %target.display(), "wrote instrumented source");
    }
    Ok(())
}

/// Run a whole instrumentation build: scan, visit, merge, write, export.
pub fn run_build(options: &BuildOptions) -> StmtResult<(StatementRegistry, BuildReport)> {
    let started = Instant::now();
    let settings = &options.settings;
    let pass = InstrumentationPass::new(settings.enabled);
    let mut registry = StatementRegistry::new();
    let mut report = BuildReport::default();

    if pass.is_enabled() {
        let root = settings.project_root.as_path();
        let (files_seen, files) = scan_source_files(root, &options.include)?;
        report.files_seen = files_seen;

        let results = parallel_instrument(root, &files, pass, options.workers);
        // Every unit has been visited once we get here.
        let outputs = merge_results(results, &mut registry, &mut report);
        write_outputs(root, &options.output, &outputs, &mut report)?;
    } else {
        debug!("instrumentation gate is off, leaving sources untouched");
    }

    report.statements = registry.len();
    if settings.export {
        report.manifest_path =
            ManifestExporter::from_settings(settings).export_best_effort(&registry);
    }
    report.elapsed_ms = started.elapsed().as_millis();

    let elapsed_ms = report.elapsed_ms as u64;
    info!(
        files = report.files_visited,
        statements = report.statements,
        injected = report.stats.injected,
        elapsed_ms,
        "instrumentation build finished"
    );
    Ok((registry, report))
}
