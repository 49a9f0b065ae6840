//! URL slugs for pages and heading anchors.

use unicode_segmentation::UnicodeSegmentation;

/// Convert a title or file stem into a URL-safe slug.
///
/// Lowercases, turns whitespace and underscores into single hyphens, drops
/// punctuation (unicode letters survive) and trims stray hyphens.
///
/// ```
/// use quire_core::slugify;
///
/// assert_eq!(slugify("Attention Is All You Need"), "attention-is-all-you-need");
/// assert_eq!(slugify("C++ & Rust"), "c-rust");
/// ```
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for g in input.to_lowercase().graphemes(true) {
        let Some(c) = g.chars().next() else { continue };
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_hyphen = !slug.is_empty();
        } else if c.is_alphanumeric() {
            if pending_hyphen {
                slug.push('-');
                pending_hyphen = false;
            }
            slug.push_str(g);
        }
    }

    slug
}
