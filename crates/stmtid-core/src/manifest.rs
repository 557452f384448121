//! Statement manifest export and loading.
//!
//! The manifest is written once per build, after every unit has been
//! visited, and is never modified afterwards. The sync clients only read it.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::config::InstrumentSettings;
use crate::errors::{StmtError, StmtResult};
use crate::instrument::registry::StatementRegistry;
use crate::models::{Manifest, Provenance};

pub struct ManifestExporter {
    path: PathBuf,
    provenance: Provenance,
}

impl ManifestExporter {
    pub fn new(path: impl Into<PathBuf>, provenance: Provenance) -> Self {
        Self {
            path: path.into(),
            provenance,
        }
    }

    pub fn from_settings(settings: &InstrumentSettings) -> Self {
        Self::new(settings.manifest_path.clone(), settings.provenance.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot a registry, statements in insertion order.
    pub fn build_manifest(&self, registry: &StatementRegistry) -> Manifest {
        Manifest::new(self.provenance.clone(), registry.to_records())
    }

    /// Write the manifest, creating parent directories as needed.
    pub fn export(&self, registry: &StatementRegistry) -> StmtResult<PathBuf> {
        let manifest = self.build_manifest(registry);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&manifest)?;
        std::fs::write(&self.path, json)?;
        info!(
            count = manifest.statements.len(),
            path = %self.path.display(),
            "Exported {} statement IDs to {}",
            manifest.statements.len(),
            self.path.display()
        );
        Ok(self.path.clone())
    }

    /// Like [`export`](Self::export) but a failure is only logged.
    pub fn export_best_effort(&self, registry: &StatementRegistry) -> Option<PathBuf> {
        match self.export(registry) {
            Ok(path) => Some(path),
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to export statements");
                None
            }
        }
    }
}

/// Read a manifest written by [`ManifestExporter::export`].
pub fn load_manifest(path: &Path) -> StmtResult<Manifest> {
    if !path.exists() {
        return Err(StmtError::ManifestMissing {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| StmtError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::statement_id::generate_id;
    use crate::models::{Level, StatementRecord};

    fn provenance() -> Provenance {
        Provenance {
            project_id: "prj_test".to_string(),
            version: "2.3.4".to_string(),
            repo_url: "https://example.com/repo".to_string(),
        }
    }

    fn registry(n: u32) -> StatementRegistry {
        let mut registry = StatementRegistry::new();
        for line in 1..=n {
            registry.upsert(StatementRecord {
                id: generate_id("src/lib/a.ts", line),
                file: "src/lib/a.ts".to_string(),
                line,
                message: format!("message {line}"),
                level: if line % 2 == 0 { Some(Level::Warn) } else { None },
            });
        }
        registry
    }

    #[test]
    fn test_export_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dist").join("statement-ids.json");
        let exporter = ManifestExporter::new(&path, provenance());
        let registry = registry(5);

        let written = exporter.export(&registry).unwrap();
        assert_eq!(written, path);

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.project_id, "prj_test");
        assert_eq!(manifest.version, "2.3.4");
        assert_eq!(manifest.repo_url, "https://example.com/repo");
        assert_eq!(manifest.statements.len(), 5);
        assert_eq!(manifest.statements, registry.to_records());
    }

    #[test]
    fn test_export_field_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement-ids.json");
        ManifestExporter::new(&path, provenance())
            .export(&registry(2))
            .unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["project_id", "version", "repo_url", "statements"]);
        assert!(value["statements"][0].get("level").is_none());
        assert_eq!(value["statements"][1]["level"], "warn");
        assert!(raw.contains("\n  \"version\""));
    }

    #[test]
    fn test_export_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("dist");
        std::fs::write(&blocker, "not a directory").unwrap();
        let exporter = ManifestExporter::new(blocker.join("statement-ids.json"), provenance());
        assert!(exporter.export_best_effort(&registry(1)).is_none());
    }

    #[test]
    fn test_load_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_manifest(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, StmtError::ManifestMissing { .. }));
    }

    #[test]
    fn test_load_corrupt_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement-ids.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_manifest(&path).unwrap_err();
        assert!(matches!(err, StmtError::ManifestParse { .. }));
    }
}
