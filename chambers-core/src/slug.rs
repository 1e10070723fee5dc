//! URL slugs for publications
use regex::Regex;
use std::sync::LazyLock;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s_-]").expect("Invalid slug regex pattern"));

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]+").expect("Invalid separator regex pattern"));

/// Slug used when a title has no usable characters at all.
pub const FALLBACK_SLUG: &str = "publication";

/// Turn a title into a lowercase, dash-separated slug.
///
/// Characters other than ASCII letters, digits, whitespace, `-` and `_` are dropped,
/// runs of separators collapse to one `-`, and leading/trailing dashes are trimmed.
/// May return an empty string.
///
/// Creating a publication and backfilling missing slugs share this one rule. There is no
/// transliteration: `"Café"` becomes `caf` and `&` is dropped rather than spelled `and`.
///
/// ```rust
/// use chambers_core::slug::slugify;
///
/// assert_eq!(slugify("  Employment Law: What's New in 2024?  "), "employment-law-whats-new-in-2024");
/// ```
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let cleaned = NON_SLUG_CHARS.replace_all(&lowered, "");
    let dashed = SEPARATORS.replace_all(&cleaned, "-");
    dashed.trim_matches('-').to_string()
}

/// `base` for the first candidate, then `base-2`, `base-3`, ...
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}
