//! Per-id registry lookups for the verify and check-missing clients.
//!
//! Ids are looked up strictly one after another. Each id ends up in exactly
//! one of found, missing or error; no outcome stops the loop.

use serde::Deserialize;

use crate::errors::StmtResult;
use crate::sync::api::{RemoteResponse, StatementApi};

/// Fields the registry echoes back for a known statement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteStatement {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupOutcome {
    /// 2xx. The echoed record, when the body could be read as one.
    Found(Option<RemoteStatement>),
    /// 404.
    Missing,
    /// Any other status, or a transport failure.
    Error(String),
}

pub fn classify_response(result: StmtResult<RemoteResponse>) -> LookupOutcome {
    match result {
        Ok(response) if response.is_success() => {
            LookupOutcome::Found(serde_json::from_str(&response.body).ok())
        }
        Ok(response) if response.status == 404 => LookupOutcome::Missing,
        Ok(response) => {
            LookupOutcome::Error(format!("Status {}: {}", response.status, response.body))
        }
        Err(e) => LookupOutcome::Error(format!("Fetch failed: {e}")),
    }
}

/// Three-way partition of looked-up ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LookupTally {
    pub found: Vec<String>,
    pub missing: Vec<String>,
    pub errors: Vec<(String, String)>,
}

impl LookupTally {
    /// Reducer step: file `id` under its outcome.
    pub fn record(mut self, id: &str, outcome: &LookupOutcome) -> Self {
        match outcome {
            LookupOutcome::Found(_) => self.found.push(id.to_string()),
            LookupOutcome::Missing => self.missing.push(id.to_string()),
            LookupOutcome::Error(detail) => self.errors.push((id.to_string(), detail.clone())),
        }
        self
    }

    pub fn total(&self) -> usize {
        self.found.len() + self.missing.len() + self.errors.len()
    }

    /// True only when every id was found.
    pub fn all_found(&self) -> bool {
        self.missing.is_empty() && self.errors.is_empty()
    }

    pub fn error_ids(&self) -> Vec<&str> {
        self.errors.iter().map(|(id, _)| id.as_str()).collect()
    }
}

/// Look up every id in order, reporting each outcome to `observe` as it
/// arrives.
pub fn check_ids<A, F>(api: &A, ids: &[String], mut observe: F) -> LookupTally
where
    A: StatementApi + ?Sized,
    F: FnMut(&str, &LookupOutcome),
{
    ids.iter().fold(LookupTally::default(), |tally, id| {
        let outcome = classify_response(api.fetch_statement(id));
        observe(id, &outcome);
        tally.record(id, &outcome)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StmtError;
    use crate::sync::fakes::FakeStatementApi;

    #[test]
    fn test_classify_found_with_echo() {
        let outcome = classify_response(Ok(RemoteResponse::new(
            200,
            r#"{"file":"src/lib/a.ts","line":4,"message":"hi"}"#,
        )));
        let LookupOutcome::Found(Some(record)) = outcome else {
            panic!("expected found with record");
        };
        assert_eq!(record.file.as_deref(), Some("src/lib/a.ts"));
        assert_eq!(record.line, Some(4));
    }

    #[test]
    fn test_classify_found_without_body() {
        assert_eq!(
            classify_response(Ok(RemoteResponse::new(200, "ok"))),
            LookupOutcome::Found(None)
        );
    }

    #[test]
    fn test_classify_missing_and_errors() {
        assert_eq!(
            classify_response(Ok(RemoteResponse::new(404, "not found"))),
            LookupOutcome::Missing
        );
        assert_eq!(
            classify_response(Ok(RemoteResponse::new(500, "boom"))),
            LookupOutcome::Error("Status 500: boom".to_string())
        );
        assert_eq!(
            classify_response(Err(StmtError::Http("connection refused".to_string()))),
            LookupOutcome::Error("Fetch failed: HTTP error: connection refused".to_string())
        );
    }

    #[test]
    fn test_check_ids_partitions() {
        let api = FakeStatementApi::new()
            .with_statement("aaaaaaaaaaaaaaaa", 200, r#"{"file":"a.ts","line":1,"message":"a"}"#)
            .with_statement("bbbbbbbbbbbbbbbb", 404, "")
            .with_statement("cccccccccccccccc", 500, "internal");
        let ids: Vec<String> = ["aaaaaaaaaaaaaaaa", "bbbbbbbbbbbbbbbb", "cccccccccccccccc"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut seen = Vec::new();
        let tally = check_ids(&api, &ids, |id, _| seen.push(id.to_string()));

        assert_eq!(tally.found, vec!["aaaaaaaaaaaaaaaa"]);
        assert_eq!(tally.missing, vec!["bbbbbbbbbbbbbbbb"]);
        assert_eq!(tally.error_ids(), vec!["cccccccccccccccc"]);
        assert!(!tally.all_found());
        assert_eq!(tally.total(), 3);
        assert_eq!(seen, ids);
        assert_eq!(api.requests(), 3);
    }

    #[test]
    fn test_transport_failure_does_not_stop_loop() {
        let api = FakeStatementApi::new()
            .with_transport_failure("aaaaaaaaaaaaaaaa")
            .with_statement("bbbbbbbbbbbbbbbb", 200, "{}");
        let ids = vec!["aaaaaaaaaaaaaaaa".to_string(), "bbbbbbbbbbbbbbbb".to_string()];
        let tally = check_ids(&api, &ids, |_, _| {});
        assert_eq!(tally.errors.len(), 1);
        assert_eq!(tally.found, vec!["bbbbbbbbbbbbbbbb"]);
        assert_eq!(api.requests(), 2);
    }

    #[test]
    fn test_all_found() {
        let api = FakeStatementApi::new().with_statement("aaaaaaaaaaaaaaaa", 200, "{}");
        let tally = check_ids(&api, &["aaaaaaaaaaaaaaaa".to_string()], |_, _| {});
        assert!(tally.all_found());
    }

    #[test]
    fn test_empty_id_list() {
        let api = FakeStatementApi::new();
        let tally = check_ids(&api, &[], |_, _| {});
        assert_eq!(tally.total(), 0);
        assert!(tally.all_found());
        assert_eq!(api.requests(), 0);
    }
}
