//! stmtid-verify
//!
//! Looks up every statement in the exported manifest against the registry
//! and exits non-zero unless all of them are known.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use stmtid_core::config::{Region, SyncSettings, ENV_REGION};
use stmtid_core::sync::api::HttpStatementApi;
use stmtid_core::sync::client::{lookup_exit_code, run_verify};
use stmtid_core::sync::lookup::LookupTally;

#[derive(Parser)]
#[command(name = "stmtid-verify")]
#[command(about = "Verify that every manifest statement exists in the registry")]
#[command(version)]
struct Cli {
    /// Manifest to verify (defaults to dist/statement-ids.json)
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Registry region: EU or US
    #[arg(long, env = ENV_REGION)]
    region: Option<String>,
}

fn run(cli: Cli) -> Result<LookupTally> {
    let mut settings = SyncSettings::from_env(&std::env::current_dir()?);
    settings.region = Region::parse(cli.region.as_deref());
    if let Some(path) = cli.manifest {
        settings.manifest_path = path;
    }

    let tally = run_verify(
        &settings,
        |region, key| HttpStatementApi::for_region(region, key),
        &mut std::io::stdout().lock(),
    )?;
    Ok(tally)
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
        Ok(tally) => ExitCode::from(lookup_exit_code(&Ok(tally))),
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}
