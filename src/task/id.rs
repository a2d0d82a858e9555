// src/task/id.rs

//! Deterministic task-id derivation.
//!
//! The id is the identity used for cross-process deduplication, so it must
//! be a pure function of family name and serialized significant parameters:
//! no randomness, no environment dependence.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// How many parameters contribute to the human-readable summary.
const TASK_ID_INCLUDE_PARAMS: usize = 3;
/// Maximum characters kept per summarized parameter value.
const TASK_ID_TRUNCATE_PARAMS: usize = 16;
/// Hex characters kept from the digest.
const TASK_ID_TRUNCATE_HASH: usize = 10;

static INVALID_ID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("static regex"));

/// Canonical string identifying a particular task.
///
/// `params` maps parameter names to their serialized values, already
/// filtered down to significant, public parameters. The id concatenates the
/// family, a sanitized summary of the first values (sorted by parameter
/// name), and a digest prefix of the canonical JSON encoding.
///
/// The digest is not a security boundary; it is a fast collision-resistant
/// fingerprint. Truncation means collisions are theoretically possible and
/// accepted as a documented risk.
pub fn task_id_str(family: &str, params: &BTreeMap<String, String>) -> String {
    let canonical = serde_json::to_string(params).expect("string map serializes");
    let digest = blake3::hash(canonical.as_bytes()).to_hex();
    let hash_prefix = &digest.as_str()[..TASK_ID_TRUNCATE_HASH];

    // BTreeMap iteration is already in lexicographic key order.
    let summary = params
        .values()
        .take(TASK_ID_INCLUDE_PARAMS)
        .map(|v| v.chars().take(TASK_ID_TRUNCATE_PARAMS).collect::<String>())
        .collect::<Vec<_>>()
        .join("_");
    let summary = INVALID_ID_CHARS.replace_all(&summary, "_");

    format!("{family}_{summary}_{hash_prefix}")
}
