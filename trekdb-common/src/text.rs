//! Small text helpers shared by file naming, slugs and name matching

/// Lowercase ASCII slug: alphanumerics kept, every other run becomes one `-`
///
/// `"Jean-Luc Picard"` -> `"jean-luc-picard"`, `"Star Trek: Voyager"` -> `"star-trek-voyager"`
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
