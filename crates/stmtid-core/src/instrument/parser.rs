//! Language parsing wrapper used by the instrumentation pass.
//!
//! TypeScript modules use the TypeScript grammar. Every JavaScript flavour
//! may carry JSX, so it goes through the TSX grammar along with `.tsx`.

use std::path::Path;

use crate::errors::{StmtError, StmtResult};

const LANGUAGE_BY_EXTENSION: &[(&str, SourceLanguage)] = &[
    ("ts", SourceLanguage::TypeScript),
    ("mts", SourceLanguage::TypeScript),
    ("cts", SourceLanguage::TypeScript),
    ("js", SourceLanguage::Tsx),
    ("mjs", SourceLanguage::Tsx),
    ("cjs", SourceLanguage::Tsx),
    ("tsx", SourceLanguage::Tsx),
    ("jsx", SourceLanguage::Tsx),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    TypeScript,
    Tsx,
}

impl SourceLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLanguage::TypeScript => "typescript",
            SourceLanguage::Tsx => "tsx",
        }
    }

    fn grammar(&self) -> tree_sitter::Language {
        match self {
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Language for a path, by extension. `None` for files the pass ignores.
pub fn detect_language(path: &Path) -> Option<SourceLanguage> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    // Type declarations carry no calls worth instrumenting.
    if path
        .file_name()
        .is_some_and(|n| n.to_string_lossy().ends_with(".d.ts"))
    {
        return None;
    }
    LANGUAGE_BY_EXTENSION
        .iter()
        .find(|(e, _)| *e == ext.as_str())
        .map(|(_, lang)| *lang)
}

pub fn parse_source(source: &str, language: SourceLanguage) -> StmtResult<tree_sitter::Tree> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| StmtError::Parse(format!("Failed to set language: {e}")))?;

    parser
        .parse(source.as_bytes(), None)
        .ok_or_else(|| StmtError::Parse(format!("Failed to parse {} source", language.as_str())))
}
