//! End-to-end flows of the upload, verify and check-missing clients.
//!
//! Each flow checks the API key before anything else, then loads its
//! inputs, and only then asks `connect` for a transport. Report text goes to
//! `out`; the binaries pass stdout.

use std::io::Write;
use std::path::PathBuf;

use crate::config::{Region, SyncSettings};
use crate::errors::{StmtError, StmtResult};
use crate::instrument::statement_id::{find_statement_ids, is_statement_id};
use crate::manifest::load_manifest;
use crate::sync::api::StatementApi;
use crate::sync::lookup::{check_ids, LookupTally};
use crate::sync::report::{missing_list, outcome_line, summary_table, SummaryKind};
use crate::sync::telemetry::TelemetrySink;
use crate::sync::upload::{upload_statements, UploadSummary};

use tracing::warn;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// Process exit code for a verify or check-missing run: success only when
/// the run completed and every id was found.
pub fn lookup_exit_code(result: &StmtResult<LookupTally>) -> u8 {
    match result {
        Ok(tally) if tally.all_found() => EXIT_SUCCESS,
        _ => EXIT_FAILURE,
    }
}

/// Where check-missing takes its ids from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdSource {
    Explicit(Vec<String>),
    /// Every id in the manifest.
    Manifest,
    /// Every distinct id found in a text file.
    Text(PathBuf),
}

impl IdSource {
    /// `None` when no input was given at all; the caller prints usage.
    pub fn from_args(ids: Vec<String>, from_file: bool, from_text: Option<PathBuf>) -> Option<Self> {
        if from_file {
            Some(IdSource::Manifest)
        } else if let Some(path) = from_text {
            Some(IdSource::Text(path))
        } else if !ids.is_empty() {
            Some(IdSource::Explicit(ids))
        } else {
            None
        }
    }

    fn resolve(&self, settings: &SyncSettings) -> StmtResult<Vec<String>> {
        match self {
            IdSource::Explicit(ids) => {
                for id in ids.iter().filter(|id| !is_statement_id(id)) {
                    warn!(id = %id, "not a 16-character lowercase hex statement id");
                }
                Ok(ids.clone())
            }
            IdSource::Manifest => Ok(load_manifest(&settings.manifest_path)?.ids()),
            IdSource::Text(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    StmtError::Config(format!("Failed to read {}: {e}", path.display()))
                })?;
                Ok(find_statement_ids(&text))
            }
        }
    }
}

/// Upload the manifest in one request and print the registry's counts.
pub fn run_upload<A, C>(
    settings: &SyncSettings,
    connect: C,
    telemetry: &dyn TelemetrySink,
    out: &mut dyn Write,
) -> StmtResult<UploadSummary>
where
    A: StatementApi,
    C: FnOnce(Region, &str) -> StmtResult<A>,
{
    let api_key = settings.require_api_key()?;
    let manifest = load_manifest(&settings.manifest_path)?;
    let api = connect(settings.region, api_key)?;

    writeln!(
        out,
        "Uploading {} statements for project {} to {}/statements...",
        manifest.statements.len(),
        manifest.project_id,
        api.base_url()
    )?;
    let summary = upload_statements(&api, &manifest, telemetry)?;
    writeln!(out, "✅ Statement upload successful:")?;
    writeln!(out, "   Created:  {} statements", summary.created)?;
    writeln!(out, "   Modified: {} statements", summary.modified)?;
    writeln!(out, "   Deleted:  {} statements", summary.deleted)?;
    Ok(summary)
}

/// Look up every manifest statement, showing its manifest position.
pub fn run_verify<A, C>(
    settings: &SyncSettings,
    connect: C,
    out: &mut dyn Write,
) -> StmtResult<LookupTally>
where
    A: StatementApi,
    C: FnOnce(Region, &str) -> StmtResult<A>,
{
    let api_key = settings.require_api_key()?;
    let manifest = load_manifest(&settings.manifest_path)?;
    let api = connect(settings.region, api_key)?;

    writeln!(
        out,
        "Verifying {} statements for project {} in {} region...\n",
        manifest.statements.len(),
        manifest.project_id,
        settings.region
    )?;
    let tally = check_ids(&api, &manifest.ids(), |id, outcome| {
        let local = manifest.statements.iter().find(|s| s.id == id);
        let _ = writeln!(out, "{}", outcome_line(id, outcome, local));
    });

    writeln!(out)?;
    writeln!(out, "{}", summary_table(SummaryKind::Verification, settings.region, &tally))?;
    Ok(tally)
}

/// Look up ids from `source`, echoing what the registry knows about each.
pub fn run_check_missing<A, C>(
    settings: &SyncSettings,
    source: &IdSource,
    connect: C,
    out: &mut dyn Write,
) -> StmtResult<LookupTally>
where
    A: StatementApi,
    C: FnOnce(Region, &str) -> StmtResult<A>,
{
    let api_key = settings.require_api_key()?;
    let ids = source.resolve(settings)?;
    if ids.is_empty() {
        return Err(StmtError::Config("No statement ids to check".to_string()));
    }
    let api = connect(settings.region, api_key)?;

    writeln!(
        out,
        "Checking {} statement IDs in {} region...\n",
        ids.len(),
        settings.region
    )?;
    let tally = check_ids(&api, &ids, |id, outcome| {
        let _ = writeln!(out, "{}", outcome_line(id, outcome, None));
    });

    writeln!(out)?;
    writeln!(out, "{}", summary_table(SummaryKind::Check, settings.region, &tally))?;
    if let Some(list) = missing_list(&tally) {
        writeln!(out, "{list}")?;
    }
    Ok(tally)
}
