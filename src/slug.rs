//! Deterministic slug generation for catalog entries.
//!
//! Rules implemented:
//! - lowercase and trim the title
//! - drop every character that is not a word character, whitespace or `-`
//! - whitespace and `_` runs become a single `-`, repeated `-` collapse
//! - numbered problems are prefixed: `{number}-{slugified title}`

/// Converts free text into a URL-safe slug.
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());

    for ch in lowered.chars() {
        let mapped = if ch.is_whitespace() || ch == '_' || ch == '-' {
            '-'
        } else if ch.is_alphanumeric() {
            ch
        } else {
            continue;
        };

        if mapped == '-' && out.ends_with('-') {
            continue;
        }
        out.push(mapped);
    }

    out
}

/// Slug for a catalog entry, falling back to `fallback` when the title has
/// no slug-able characters.
pub fn problem_slug(number: Option<u32>, title: &str, fallback: &str) -> String {
    let base = slugify(title);
    match number {
        Some(number) if base.is_empty() => number.to_string(),
        Some(number) => format!("{number}-{base}"),
        None if base.is_empty() => slugify(fallback),
        None => base,
    }
}
