//! Filesystem scanning for instrumentation builds.

use std::path::Path;

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::errors::{StmtError, StmtResult};
use crate::instrument::parser::{detect_language, SourceLanguage};

/// Project-local ignore file, same syntax as `.gitignore`.
pub const IGNORE_FILE_NAME: &str = ".stmtidignore";

/// Directories never scanned, whatever the ignore files say.
const IMPLICIT_IGNORED_DIRS: &[&str] = &["node_modules", "dist", ".next", ".git"];

/// A source file selected for instrumentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the project root, `/`-separated.
    pub relative_path: String,
    pub language: SourceLanguage,
}

/// Normalize a path under `root` into the `/`-separated relative form used
/// for statement records.
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
        .trim_start_matches("./")
        .to_string()
}

/// Walk `root` for JS/TS sources.
///
/// Honors `.gitignore` and [`IGNORE_FILE_NAME`]. When `include` is non-empty
/// only files matching one of its globs (relative to `root`) are returned.
/// Results are sorted by relative path.
pub fn scan_source_files(root: &Path, include: &[String]) -> StmtResult<(usize, Vec<SourceFile>)> {
    let mut overrides = OverrideBuilder::new(root);
    for pattern in include {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            continue;
        }
        overrides
            .add(trimmed.trim_start_matches("./"))
            .map_err(|e| StmtError::Config(format!("invalid include glob {trimmed:?}: {e}")))?;
    }
    let overrides = overrides
        .build()
        .map_err(|e| StmtError::Config(format!("invalid include globs: {e}")))?;

    let walker = WalkBuilder::new(root)
        .require_git(false)
        .add_custom_ignore_filename(IGNORE_FILE_NAME)
        .overrides(overrides)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir
                && IMPLICIT_IGNORED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref()))
        })
        .build();

    let mut files_seen = 0usize;
    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable path");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        files_seen += 1;
        let Some(language) = detect_language(entry.path()) else {
            continue;
        };
        let relative_path = relative_path(root, entry.path());
        debug!(path = %relative_path, language = language.as_str(), "selected source file");
        files.push(SourceFile {
            relative_path,
            language,
        });
    }
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok((files_seen, files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/p"), Path::new("/p/src/lib/a.ts")),
            "src/lib/a.ts"
        );
    }

    #[test]
    fn test_scan_selects_sources_and_skips_implicit_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/lib/logger.ts", "");
        write(root, "src/app/page.tsx", "");
        write(root, "src/app/styles.css", "");
        write(root, "node_modules/pkg/index.js", "");
        write(root, "dist/out.js", "");
        write(root, "types/env.d.ts", "");

        let (seen, files) = scan_source_files(root, &[]).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["src/app/page.tsx", "src/lib/logger.ts"]);
        assert_eq!(seen, 4);
        assert_eq!(files[0].language, SourceLanguage::Tsx);
    }

    #[test]
    fn test_scan_honors_ignore_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/lib/a.ts", "");
        write(root, "src/generated/b.ts", "");
        write(root, IGNORE_FILE_NAME, "src/generated/\n");

        let (_, files) = scan_source_files(root, &[]).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["src/lib/a.ts"]);
    }

    #[test]
    fn test_scan_include_globs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/app/api/chat/route.ts", "");
        write(root, "src/lib/logger.ts", "");
        write(root, "src/app/page.tsx", "");

        let include = vec!["src/app/api/**".to_string(), "src/lib/**".to_string()];
        let (_, files) = scan_source_files(root, &include).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["src/app/api/chat/route.ts", "src/lib/logger.ts"]);
    }
}
