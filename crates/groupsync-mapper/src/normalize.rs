//! Mapping of external group display names to local group names.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Maps an external display name to the local group name.
///
/// Must be deterministic. Distinct inputs may map to the same output; the
/// memberships of such groups merge locally.
pub trait NameNormalizer: Send + Sync {
    fn normalize(&self, name: &str) -> String;
}

/// Lower-case, hyphen-separated ASCII slugs.
///
/// - Accented letters are transliterated by dropping combining marks after
///   compatibility decomposition (`Café` → `cafe`)
/// - Remaining non-ASCII characters are removed
/// - Runs of anything other than ASCII letters, digits and `_` become a
///   single hyphen
/// - Leading and trailing hyphens are trimmed
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugNormalizer;

impl SlugNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NameNormalizer for SlugNormalizer {
    fn normalize(&self, name: &str) -> String {
        slugify(name)
    }
}

/// Converts `name` to a slug. See [`SlugNormalizer`].
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_ascii() {
            pending_hyphen = true;
        }
        // Non-ASCII without a decomposition is dropped.
    }

    slug
}
