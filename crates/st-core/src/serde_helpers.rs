//! Shared serde default functions for configuration fields.

/// Build an owned list of candidate keys from static literals.
pub(crate) fn keys(candidates: &[&str]) -> Vec<String> {
    candidates.iter().map(|k| k.to_string()).collect()
}
