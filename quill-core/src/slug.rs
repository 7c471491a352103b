//! Slug derivation for entry URLs

use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]+").expect("static pattern"));

/// Derive a URL-safe slug from a title.
///
/// Lowercases the title, collapses every run of non-word characters into a
/// single hyphen, and trims hyphens from both ends. Deriving again from the
/// result is a no-op, so slugs are stable under re-derivation.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_WORD
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
