//! Shared typed models used by the instrumentation pass, the manifest and
//! the sync clients.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Severity tag attached to a statement or a runtime log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
    Debug,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Debug => "debug",
        }
    }

    /// Map a logging method name (`warn`, `error`, ...) to a level.
    ///
    /// `log` and anything unrecognised carry no level.
    pub fn from_method(name: &str) -> Option<Self> {
        match name {
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "debug" => Some(Level::Debug),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// StatementRecord
// ---------------------------------------------------------------------------

/// One logging call site discovered during instrumentation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRecord {
    /// 16 lowercase hex characters derived from `file:line`.
    pub id: String,
    /// Path relative to the project root, `/`-separated.
    pub file: String,
    /// 1-based line of the call expression.
    pub line: u32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Provenance fields stamped onto every exported manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub project_id: String,
    pub version: String,
    pub repo_url: String,
}

/// Serialized snapshot of a statement registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub project_id: String,
    pub version: String,
    pub repo_url: String,
    pub statements: Vec<StatementRecord>,
}

impl Manifest {
    pub fn new(provenance: Provenance, statements: Vec<StatementRecord>) -> Self {
        Self {
            project_id: provenance.project_id,
            version: provenance.version,
            repo_url: provenance.repo_url,
            statements,
        }
    }

    /// Statement ids in manifest order.
    pub fn ids(&self) -> Vec<String> {
        self.statements.iter().map(|s| s.id.clone()).collect()
    }
}
