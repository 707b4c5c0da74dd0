//! Canonical identity normalization.
//!
//! The two systems are configured to share project ids for synced records,
//! but exports occasionally decorate the shared id with a system prefix
//! ("EBS-", "P6-"). Normalization is applied once at ingestion against an
//! explicit prefix table; lookup sites never probe alternative formats.

/// Decorations stripped from a raw project id.
///
/// Only dash-separated system prefixes are decorations; a compound id like
/// `EBS1001` is itself the shared identifier and passes through unchanged.
const PROJECT_ID_PREFIXES: &[&str] = &["EBS-", "P6-"];

/// Canonical form of a project id as both systems store it.
///
/// Trims surrounding whitespace and strips at most one known system
/// prefix.
pub fn normalize_project_id(raw: &str) -> String {
    let trimmed = raw.trim();
    for prefix in PROJECT_ID_PREFIXES {
        if let Some(stripped) = trimmed.strip_prefix(prefix) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    trimmed.to_string()
}
