//! Role slug generation
//!
//! Slugs are derived from role names and must stay URL- and index-safe:
//! lowercase ASCII alphanumerics separated by single dashes.

/// Derive a slug from a display name
///
/// Non-alphanumeric runs collapse into a single `-`; leading and trailing
/// dashes are stripped. Returns an empty string when the name contains no
/// ASCII alphanumerics at all (callers must reject that case).
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    slug
}
