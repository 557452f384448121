//! stmtid-upload
//!
//! Sends the exported statement manifest to the registry in one request and
//! reports what the registry created, modified and deleted.
//!
//! Usage:
//! - stmtid-upload                      # reads dist/statement-ids.json
//! - stmtid-upload --manifest <path>
//! - stmtid-upload --no-telemetry

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use stmtid_core::config::{Region, SyncSettings, ENV_REGION};
use stmtid_core::sync::api::HttpStatementApi;
use stmtid_core::sync::client::run_upload;
use stmtid_core::sync::telemetry::{NoopTelemetry, OtlpIngestSink, TelemetrySink};

#[derive(Parser)]
#[command(name = "stmtid-upload")]
#[command(about = "Upload the statement manifest to the statement registry")]
#[command(version)]
struct Cli {
    /// Manifest to upload (defaults to dist/statement-ids.json)
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Registry region: EU or US
    #[arg(long, env = ENV_REGION)]
    region: Option<String>,

    /// Do not ship the tool's own activity to the ingestion endpoint
    #[arg(long)]
    no_telemetry: bool,
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = SyncSettings::from_env(&std::env::current_dir()?);
    settings.region = Region::parse(cli.region.as_deref());
    if let Some(path) = cli.manifest {
        settings.manifest_path = path;
    }

    let otlp = match (cli.no_telemetry, settings.require_api_key()) {
        (false, Ok(key)) => OtlpIngestSink::for_region(settings.region, key),
        _ => None,
    };
    let telemetry: &dyn TelemetrySink = match &otlp {
        Some(sink) => sink,
        None => &NoopTelemetry,
    };

    run_upload(
        &settings,
        |region, key| HttpStatementApi::for_region(region, key),
        telemetry,
        &mut std::io::stdout().lock(),
    )?;
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
            eprintln!("❌ Error uploading statements: {e:#}");
            ExitCode::FAILURE
        }
    }
}
