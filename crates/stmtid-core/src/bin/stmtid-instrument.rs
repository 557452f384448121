//! stmtid-instrument
//!
//! Build host for the instrumentation pass: scans a project for JS/TS
//! sources, tags every logging call with its statement id and optionally
//! exports the statement manifest.
//!
//! Usage:
//! - stmtid-instrument --root . --enable --export
//! - stmtid-instrument --root . --enable --write
//! - stmtid-instrument --root . --enable --out-dir build/instrumented --include 'src/**'

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use stmtid_core::config::InstrumentSettings;
use stmtid_core::instrument::pipeline::{run_build, BuildOptions, OutputMode};

#[derive(Parser)]
#[command(name = "stmtid-instrument")]
#[command(about = "Inject statement ids into JS/TS logging calls")]
#[command(version)]
struct Cli {
    /// Project root; recorded file paths are relative to it
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Only visit files matching this glob (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    include: Vec<String>,

    /// Rewrite instrumented files in place
    #[arg(long, conflicts_with = "out_dir")]
    write: bool,

    /// Write instrumented files under this directory instead
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Run the pass even when the build-mode gate is off
    #[arg(long)]
    enable: bool,

    /// Export the statement manifest after the build
    #[arg(long)]
    export: bool,

    /// Manifest path (defaults to <root>/dist/statement-ids.json)
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Worker threads
    #[arg(long, default_value_t = 4)]
    jobs: usize,
}

fn run(cli: Cli) -> Result<()> {
    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("Project root {} not found", cli.root.display()))?;

    let mut settings = InstrumentSettings::from_env(&root);
    settings.enabled |= cli.enable;
    settings.export |= cli.export;
    if let Some(path) = cli.manifest {
        settings.manifest_path = path;
    }

    let mut options = BuildOptions::new(settings);
    options.include = cli.include;
    options.workers = cli.jobs;
    options.output = match (cli.write, cli.out_dir) {
        (true, _) => OutputMode::InPlace,
        (false, Some(dir)) => OutputMode::Directory(dir),
        (false, None) => OutputMode::Discard,
    };

    let (_registry, report) = run_build(&options)?;

    if !options.settings.enabled {
        println!("Instrumentation gate is off; no sources were visited.");
    }
    println!("Files scanned:   {}", report.files_seen);
    println!("Files visited:   {}", report.files_visited);
    println!("Files changed:   {}", report.files_changed);
    println!("Files written:   {}", report.files_written);
    if report.read_errors > 0 {
        println!("Read errors:     {}", report.read_errors);
    }
    println!("Logging calls:   {}", report.stats.logging_calls);
    println!("Ids injected:    {}", report.stats.injected);
    println!("Statements:      {}", report.statements);
    match &report.manifest_path {
        Some(path) => println!("Manifest:        {}", path.display()),
        None if options.settings.export => println!("Manifest:        export failed"),
        None => {}
    }
    println!("Elapsed:         {} ms", report.elapsed_ms);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
