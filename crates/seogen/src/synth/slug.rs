use crate::dimension::DimensionTuple;

/// Lowercases, maps every non-alphanumeric to `-` and collapses runs.
pub fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Slug for the record at `index`.
///
/// The final `-`-separated segment is always the decimal index, so two
/// different indices can never share a slug even when their tuples repeat.
pub fn record_slug(tuple: &DimensionTuple, index: u64) -> String {
    let joined = tuple.values().collect::<Vec<_>>().join("-");
    let prefix = slugify(&joined);
    if prefix.is_empty() {
        index.to_string()
    } else {
        format!("{}-{}", prefix, index)
    }
}

/// Recovers the generation index from a slug produced by [`record_slug`].
pub fn slug_index(slug: &str) -> Option<u64> {
    let tail = slug.rsplit('-').next()?;
    tail.parse().ok()
}
