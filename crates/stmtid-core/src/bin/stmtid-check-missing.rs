//! stmtid-check-missing
//!
//! Checks which of a list of statement ids are unknown to the registry.
//!
//! Usage:
//! - stmtid-check-missing 5c2e003a488c8168 f50fc3f8eaa6a8a6
//! - stmtid-check-missing --from-file          # ids from dist/statement-ids.json
//! - stmtid-check-missing --from-text app.log  # ids scraped from any text

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use stmtid_core::config::{Region, SyncSettings, ENV_REGION};
use stmtid_core::sync::api::HttpStatementApi;
use stmtid_core::sync::client::{lookup_exit_code, run_check_missing, IdSource};

/// clap's own exit status for usage errors.
const EXIT_USAGE: u8 = 2;

#[derive(Parser)]
#[command(name = "stmtid-check-missing")]
#[command(about = "Check which statement ids are missing from the registry")]
#[command(version)]
struct Cli {
    /// Statement ids to check
    #[arg(value_name = "STATEMENT_ID", conflicts_with_all = ["from_file", "from_text"])]
    ids: Vec<String>,

    /// Check every id in the manifest instead
    #[arg(long)]
    from_file: bool,

    /// Check every id found in a text file (for example captured log output)
    #[arg(long, value_name = "PATH", conflicts_with = "from_file")]
    from_text: Option<PathBuf>,

    /// Manifest read by --from-file (defaults to dist/statement-ids.json)
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Registry region: EU or US
    #[arg(long, env = ENV_REGION)]
    region: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    // A region from the environment alone is not an id source.
    let Some(source) = IdSource::from_args(cli.ids, cli.from_file, cli.from_text) else {
        eprintln!("{}", Cli::command().render_help());
        return ExitCode::from(EXIT_USAGE);
    };

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut settings = SyncSettings::from_env(&cwd);
    settings.region = Region::parse(cli.region.as_deref());
    if let Some(path) = cli.manifest {
        settings.manifest_path = path;
    }

    let result = run_check_missing(
        &settings,
        &source,
        |region, key| HttpStatementApi::for_region(region, key),
        &mut std::io::stdout().lock(),
    );
    if let Err(e) = &result {
        eprintln!("❌ {e}");
    }
    ExitCode::from(lookup_exit_code(&result))
}
