//! Manifest upload to the registry's write endpoint.

use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::{StmtError, StmtResult};
use crate::models::{Level, Manifest};
use crate::sync::api::StatementApi;
use crate::sync::telemetry::TelemetrySink;

/// Counts reported by the registry after an upload. Absent or null counts
/// are zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UploadSummary {
    #[serde(default, deserialize_with = "count")]
    pub created: u64,
    #[serde(default, deserialize_with = "count")]
    pub modified: u64,
    #[serde(default, deserialize_with = "count")]
    pub deleted: u64,
}

/// Whole non-negative numbers (`2`, `2.0`, `"2"`) read as-is; anything else
/// reads as zero.
fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            })
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Send the whole manifest in one request. No retry; any non-2xx response
/// or transport failure is an error.
pub fn upload_statements<A>(
    api: &A,
    manifest: &Manifest,
    telemetry: &dyn TelemetrySink,
) -> StmtResult<UploadSummary>
where
    A: StatementApi + ?Sized,
{
    let target_url = format!("{}/statements", api.base_url());
    let payload = serde_json::to_string(manifest)?;
    telemetry.emit(
        Level::Debug,
        "Raw API request details",
        &[
            ("targetUrl", json!(target_url)),
            ("method", json!("POST")),
            ("rawPayload", json!(payload)),
        ],
    );

    let response = match api.upload_manifest(manifest) {
        Ok(response) => response,
        Err(e) => {
            telemetry.emit(
                Level::Error,
                "Execution error during statement upload",
                &[
                    ("exception", json!(e.to_string())),
                    ("targetUrl", json!(target_url)),
                ],
            );
            return Err(e);
        }
    };

    if !response.is_success() {
        telemetry.emit(
            Level::Error,
            "Statement upload failed",
            &[
                ("status", json!(response.status)),
                ("error", json!(response.body)),
                ("targetUrl", json!(target_url)),
            ],
        );
        return Err(StmtError::Remote {
            status: response.status,
            body: response.body,
        });
    }

    let summary: UploadSummary = if response.body.trim().is_empty() {
        UploadSummary::default()
    } else {
        serde_json::from_str(&response.body)?
    };
    info!(
        created = summary.created,
        modified = summary.modified,
        deleted = summary.deleted,
        "statement upload finished"
    );
    telemetry.emit(
        Level::Info,
        "Statement upload completed successfully",
        &[
            ("createdCount", json!(summary.created)),
            ("modifiedCount", json!(summary.modified)),
            ("deletedCount", json!(summary.deleted)),
            ("targetUrl", json!(target_url)),
        ],
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::fakes::FakeStatementApi;
    use crate::sync::telemetry::NoopTelemetry;
    use serde_json::Value;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingTelemetry {
        events: RefCell<Vec<(Level, String)>>,
    }

    impl TelemetrySink for RecordingTelemetry {
        fn emit(&self, level: Level, message: &str, _attributes: &[(&str, Value)]) {
            self.events.borrow_mut().push((level, message.to_string()));
        }
    }

    fn manifest() -> Manifest {
        serde_json::from_str(
            r#"{"project_id":"prj","version":"1.0.0","repo_url":"https://example.com",
                "statements":[{"id":"aaaaaaaaaaaaaaaa","file":"a.ts","line":1,"message":"m"}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_upload_reports_counts() {
        let api = FakeStatementApi::new()
            .with_upload_response(200, r#"{"created":2,"modified":1,"deleted":0}"#);
        let telemetry = RecordingTelemetry::default();
        let summary = upload_statements(&api, &manifest(), &telemetry).unwrap();
        assert_eq!(
            summary,
            UploadSummary {
                created: 2,
                modified: 1,
                deleted: 0
            }
        );
        assert_eq!(api.uploaded(), vec![manifest()]);
        let levels: Vec<_> = telemetry.events.borrow().iter().map(|(l, _)| *l).collect();
        assert_eq!(levels, vec![Level::Debug, Level::Info]);
    }

    #[test]
    fn test_upload_missing_counts_default_to_zero() {
        let api = FakeStatementApi::new().with_upload_response(200, r#"{"created":4}"#);
        let summary = upload_statements(&api, &manifest(), &NoopTelemetry).unwrap();
        assert_eq!(summary.created, 4);
        assert_eq!(summary.modified, 0);
        assert_eq!(summary.deleted, 0);
    }

    #[test]
    fn test_upload_null_and_float_counts_accepted() {
        let api = FakeStatementApi::new().with_upload_response(
            200,
            r#"{"created":null,"modified":2.0,"deleted":"3","extra":true}"#,
        );
        let summary = upload_statements(&api, &manifest(), &NoopTelemetry).unwrap();
        assert_eq!(
            summary,
            UploadSummary {
                created: 0,
                modified: 2,
                deleted: 3
            }
        );
    }

    #[test]
    fn test_unusable_counts_read_as_zero() {
        let summary: UploadSummary =
            serde_json::from_str(r#"{"created":-1,"modified":1.5,"deleted":[1]}"#).unwrap();
        assert_eq!(summary, UploadSummary::default());
    }

    #[test]
    fn test_upload_rejected() {
        let api = FakeStatementApi::new().with_upload_response(401, "invalid api key");
        let telemetry = RecordingTelemetry::default();
        let err = upload_statements(&api, &manifest(), &telemetry).unwrap_err();
        match err {
            StmtError::Remote { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(api.requests(), 1);
        assert_eq!(telemetry.events.borrow()[1].1, "Statement upload failed");
    }

    #[test]
    fn test_upload_transport_failure() {
        let api = FakeStatementApi::new().with_upload_failure();
        let err = upload_statements(&api, &manifest(), &NoopTelemetry).unwrap_err();
        assert!(matches!(err, StmtError::Http(_)));
        assert_eq!(api.requests(), 1);
    }
}
