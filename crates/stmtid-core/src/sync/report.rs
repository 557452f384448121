//! Human-readable output shared by the verify and check-missing clients.

use std::fmt::Write as _;

use crate::config::Region;
use crate::models::StatementRecord;
use crate::sync::lookup::{LookupOutcome, LookupTally};

/// Which client the summary belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryKind {
    Check,
    Verification,
}

impl SummaryKind {
    pub fn title(&self) -> &'static str {
        match self {
            SummaryKind::Check => "Check Summary",
            SummaryKind::Verification => "Verification Summary",
        }
    }
}

/// One line per looked-up id.
///
/// With a `local` record (verify) the manifest position is shown; without
/// one (check-missing) a found line echoes what the registry returned.
pub fn outcome_line(id: &str, outcome: &LookupOutcome, local: Option<&StatementRecord>) -> String {
    match outcome {
        LookupOutcome::Found(remote) => match (local, remote) {
            (Some(record), _) => format!("✅ [FOUND]   {id} - {}:{}", record.file, record.line),
            (None, Some(remote)) => {
                let file = remote.file.as_deref().unwrap_or("?");
                let line = remote
                    .line
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "?".to_string());
                match &remote.message {
                    Some(message) => format!("✅ [FOUND]   {id} - {file}:{line} - \"{message}\""),
                    None => format!("✅ [FOUND]   {id} - {file}:{line}"),
                }
            }
            (None, None) => format!("✅ [FOUND]   {id}"),
        },
        LookupOutcome::Missing => match local {
            Some(record) => format!("❌ [MISSING] {id} - {}:{}", record.file, record.line),
            None => format!("❌ [MISSING] {id}"),
        },
        LookupOutcome::Error(detail) => format!("⚠️ [ERROR]   {id} - {detail}"),
    }
}

/// Final summary block. The `Errors:` row only appears when there were any.
pub fn summary_table(kind: SummaryKind, region: Region, tally: &LookupTally) -> String {
    let header = format!("--- {} ---", kind.title());
    let mut out = String::new();
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "Region:   {region}");
    let _ = writeln!(out, "Total:    {}", tally.total());
    let _ = writeln!(out, "Found:    {}", tally.found.len());
    let _ = writeln!(out, "Missing:  {}", tally.missing.len());
    if !tally.errors.is_empty() {
        let _ = writeln!(out, "Errors:   {}", tally.errors.len());
    }
    let _ = writeln!(out, "{}", "-".repeat(header.chars().count()));
    out
}

/// Bullet list of missing ids, or `None` when nothing is missing.
pub fn missing_list(tally: &LookupTally) -> Option<String> {
    if tally.missing.is_empty() {
        return None;
    }
    let mut out = String::from("Missing statement IDs:\n");
    for id in &tally.missing {
        let _ = writeln!(out, "  - {id}");
    }
    Some(out)
}
