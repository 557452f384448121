//! Best-effort shipping of the upload tool's own activity as OTLP/JSON log
//! records to the region's ingestion endpoint.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};
use tracing::warn;

use crate::config::{Region, API_KEY_HEADER};
use crate::models::Level;

pub const SERVICE_NAME: &str = "bronto-upload-tool";
pub const DEPLOYMENT_ENVIRONMENT: &str = "build";

/// Receives the upload tool's activity events. Implementations must not fail.
pub trait TelemetrySink {
    fn emit(&self, level: Level, message: &str, attributes: &[(&str, Value)]);
}

/// Drops every event.
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn emit(&self, _level: Level, _message: &str, _attributes: &[(&str, Value)]) {}
}

fn attribute_value(value: &Value) -> Value {
    match value {
        Value::Number(n) => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        Value::String(s) => json!({ "stringValue": s }),
        other => json!({ "stringValue": other.to_string() }),
    }
}

/// Build one OTLP `resourceLogs` payload holding a single record.
pub fn otlp_log_payload(
    level: Level,
    message: &str,
    attributes: &[(&str, Value)],
    time_unix_nano: u128,
) -> Value {
    let attributes: Vec<Value> = attributes
        .iter()
        .map(|(key, value)| json!({ "key": key, "value": attribute_value(value) }))
        .collect();
    json!({
        "resourceLogs": [{
            "resource": {
                "attributes": [
                    { "key": "service.name", "value": { "stringValue": SERVICE_NAME } },
                    { "key": "deployment.environment", "value": { "stringValue": DEPLOYMENT_ENVIRONMENT } }
                ]
            },
            "scopeLogs": [{
                "logRecords": [{
                    "timeUnixNano": time_unix_nano.to_string(),
                    "severityText": level.as_str().to_uppercase(),
                    "body": { "stringValue": message },
                    "attributes": attributes
                }]
            }]
        }]
    })
}

/// Posts each event to the ingestion endpoint; failures are only logged.
pub struct OtlpIngestSink {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

impl OtlpIngestSink {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Option<Self> {
        let client = match reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "telemetry disabled: failed to create HTTP client");
                return None;
            }
        };
        Some(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn for_region(region: Region, api_key: impl Into<String>) -> Option<Self> {
        Self::new(region.ingestion_url(), api_key)
    }
}

impl TelemetrySink for OtlpIngestSink {
    fn emit(&self, level: Level, message: &str, attributes: &[(&str, Value)]) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let payload = otlp_log_payload(level, message, attributes, now);
        let result = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send();
        if let Err(e) = result {
            warn!(error = %e, "Failed to send log to ingestion endpoint");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = otlp_log_payload(
            Level::Info,
            "Statement upload completed successfully",
            &[("createdCount", json!(3)), ("targetUrl", json!("https://x/statements"))],
            42,
        );
        let record = &payload["resourceLogs"][0]["scopeLogs"][0]["logRecords"][0];
        assert_eq!(record["severityText"], "INFO");
        assert_eq!(record["timeUnixNano"], "42");
        assert_eq!(record["body"]["stringValue"], "Statement upload completed successfully");
        assert_eq!(record["attributes"][0]["key"], "createdCount");
        assert_eq!(record["attributes"][0]["value"]["doubleValue"], 3.0);
        assert_eq!(
            record["attributes"][1]["value"]["stringValue"],
            "https://x/statements"
        );
        let resource = &payload["resourceLogs"][0]["resource"]["attributes"];
        assert_eq!(resource[0]["value"]["stringValue"], SERVICE_NAME);
    }

    #[test]
    fn test_non_string_attributes_are_stringified() {
        let payload = otlp_log_payload(Level::Debug, "m", &[("flag", json!(true))], 0);
        let record = &payload["resourceLogs"][0]["scopeLogs"][0]["logRecords"][0];
        assert_eq!(record["attributes"][0]["value"]["stringValue"], "true");
    }
}
