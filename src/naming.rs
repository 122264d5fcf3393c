//! Display titles for keyed entries.
//!
//! Sections and relation groups may arrive without a `title`. In that case
//! their map key stands in for it, title-cased:
//! - `history` → "History"
//! - `famous residents` → "Famous Residents"
//! - `sidebarcontent` → "Sidebarcontent"
//!
//! Keys are not split on dashes or underscores; the source uses single-word
//! keys and reserved panel labels are matched against this exact form.

/// Title-case a key: lower-case everything, upper-case the first letter of
/// each space-separated word, drop empty words.
pub fn title_case(key: &str) -> String {
    key.to_lowercase()
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve the title shown for an entry: its own title when present and
/// non-empty, otherwise the title-cased key.
pub fn display_title(title: Option<&str>, key: &str) -> String {
    match title {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => title_case(key),
    }
}
