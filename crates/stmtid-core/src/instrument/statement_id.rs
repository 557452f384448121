//! Content-addressed statement ids.
//!
//! An id is the first 16 hex characters (64 bits) of the SHA-256 digest of
//! `"{file}:{line}"`. Distinct call sites get distinct ids with overwhelming
//! probability only; collisions are neither detected nor resolved.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
pub const STATEMENT_ID_LEN: usize = 16;

/// Derive the statement id for a call site.
///
/// Ids from the earlier MD5-based tooling do not match these. A project
/// that uploaded with that tooling gets a fresh set of registry records on
/// its next upload.
pub fn generate_id(file: &str, line: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{file}:{line}").as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..STATEMENT_ID_LEN].to_string()
}

/// True for a well-formed id: 16 lowercase hex characters.
pub fn is_statement_id(candidate: &str) -> bool {
    EXACT_ID_RE.is_match(candidate)
}

static EXACT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{16}$").unwrap());

static EMBEDDED_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9a-f]{16}\b").unwrap());

/// Pull every distinct id out of free text (runtime log lines, a manifest,
/// a plain list), in order of first appearance.
pub fn find_statement_ids(text: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for m in EMBEDDED_ID_RE.find_iter(text) {
        if !ids.iter().any(|id| id == m.as_str()) {
            ids.push(m.as_str().to_string());
        }
    }
    ids
}
