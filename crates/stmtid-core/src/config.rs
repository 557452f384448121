//! Environment-backed settings for the instrumentation build step and the
//! sync clients.
//!
//! Every setting is a plain value; the `from_env` constructors are the only
//! place the process environment is read.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::{StmtError, StmtResult};
use crate::models::Provenance;

pub const ENV_BUILD_GATE: &str = "VERCEL";
pub const ENV_EXPORT: &str = "BRONTO_EXPORT_STATEMENTS";
pub const ENV_PROJECT_ID: &str = "VERCEL_PROJECT_ID";
pub const ENV_VERSION: &str = "npm_package_version";
pub const ENV_REPO_URL: &str = "STMTID_REPO_URL";
pub const ENV_REGION: &str = "BRONTO_REGION";
pub const ENV_API_KEY: &str = "BRONTO_API_KEY";

pub const DEFAULT_PROJECT_ID: &str = "prj_DrzflPlaMjCI7OLH9xSoqIJhB8MZ";
pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_REPO_URL: &str = "https://github.com/BrontoStephen/BrontoVercelAIsample";

/// Manifest location relative to the project root.
pub const MANIFEST_RELATIVE_PATH: &str = "dist/statement-ids.json";

/// Header carrying the API key on every registry and ingestion request.
pub const API_KEY_HEADER: &str = "X-BRONTO-API-KEY";

/// Interpret an environment flag value. Unset or empty is off.
pub fn flag_enabled(value: Option<&str>) -> bool {
    match value {
        Some(raw) => matches!(
            raw.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        None => false,
    }
}

fn env_flag(name: &str) -> bool {
    flag_enabled(std::env::var(name).ok().as_deref())
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Default manifest path for a project root.
pub fn default_manifest_path(project_root: &Path) -> PathBuf {
    project_root.join(MANIFEST_RELATIVE_PATH)
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Deployment zone selecting the registry and ingestion base URLs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Region {
    #[default]
    Eu,
    Us,
}

impl Region {
    /// Parse a region setting. Unset or unrecognised values fall back to
    /// the default region.
    pub fn parse(value: Option<&str>) -> Self {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Region::default();
        };
        match raw.to_uppercase().as_str() {
            "EU" => Region::Eu,
            "US" => Region::Us,
            other => {
                warn!(region = other, "unrecognized region, falling back to EU");
                Region::default()
            }
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var(ENV_REGION).ok().as_deref())
    }

    pub fn api_base_url(&self) -> &'static str {
        match self {
            Region::Eu => "https://api.eu.bronto.io",
            Region::Us => "https://api.us.bronto.io",
        }
    }

    pub fn ingestion_url(&self) -> &'static str {
        match self {
            Region::Eu => "https://ingestion.eu.bronto.io/v1/logs",
            Region::Us => "https://ingestion.us.bronto.io/v1/logs",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Eu => write!(f, "EU"),
            Region::Us => write!(f, "US"),
        }
    }
}

// ---------------------------------------------------------------------------
// Instrumentation settings
// ---------------------------------------------------------------------------

/// Settings for one instrumentation build.
#[derive(Clone, Debug)]
pub struct InstrumentSettings {
    /// Build-mode gate. When off the pass performs no writes at all.
    pub enabled: bool,
    /// Manifest export gate.
    pub export: bool,
    pub project_root: PathBuf,
    pub manifest_path: PathBuf,
    pub provenance: Provenance,
}

impl InstrumentSettings {
    pub fn new(project_root: impl Into<PathBuf>, enabled: bool, export: bool) -> Self {
        let project_root = project_root.into();
        Self {
            enabled,
            export,
            manifest_path: default_manifest_path(&project_root),
            project_root,
            provenance: Provenance {
                project_id: DEFAULT_PROJECT_ID.to_string(),
                version: DEFAULT_VERSION.to_string(),
                repo_url: DEFAULT_REPO_URL.to_string(),
            },
        }
    }

    pub fn from_env(project_root: impl Into<PathBuf>) -> Self {
        let mut settings = Self::new(project_root, env_flag(ENV_BUILD_GATE), env_flag(ENV_EXPORT));
        settings.provenance = Provenance {
            project_id: env_non_empty(ENV_PROJECT_ID)
                .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string()),
            version: env_non_empty(ENV_VERSION).unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            repo_url: env_non_empty(ENV_REPO_URL).unwrap_or_else(|| DEFAULT_REPO_URL.to_string()),
        };
        settings
    }
}

// ---------------------------------------------------------------------------
// Sync settings
// ---------------------------------------------------------------------------

/// Settings shared by the upload, verify and check-missing clients.
#[derive(Clone, Debug)]
pub struct SyncSettings {
    pub region: Region,
    pub api_key: Option<String>,
    pub manifest_path: PathBuf,
}

impl SyncSettings {
    pub fn from_env(project_root: &Path) -> Self {
        Self {
            region: Region::from_env(),
            api_key: env_non_empty(ENV_API_KEY),
            manifest_path: default_manifest_path(project_root),
        }
    }

    /// The API key, or `AuthMissing` when none is configured.
    pub fn require_api_key(&self) -> StmtResult<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(StmtError::AuthMissing)
    }
}
