//! Error types for the stmtid core library.

use std::path::PathBuf;

/// Top-level error enum for the stmtid core library.
#[derive(Debug, thiserror::Error)]
pub enum StmtError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Statement file not found at {}. Run the instrument step with export enabled first.", path.display())]
    ManifestMissing { path: PathBuf },

    #[error("Failed to parse statements file {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("BRONTO_API_KEY environment variable is missing.")]
    AuthMissing,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Remote error: status {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for StmtError {
    fn from(err: reqwest::Error) -> Self {
        StmtError::Http(err.to_string())
    }
}

pub type StmtResult<T> = Result<T, StmtError>;
