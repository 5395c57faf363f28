/// Folds a header or tag into its lookup key: zero-width characters dropped,
/// non-breaking spaces and underscores treated as spaces, whitespace collapsed
/// (and removed around slashes), ASCII lowercased.
pub(crate) fn normalize_name(value: &str) -> String {
    let cleaned = value
        .replace(['\u{feff}', '\u{200b}'], "")
        .replace('\u{a0}', " ");
    let spaced = cleaned.replace('_', " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace(" /", "/")
        .replace("/ ", "/")
        .to_ascii_lowercase()
}

/// Trims a cell and drops spreadsheet placeholders for "no value".
pub(crate) fn clean_cell(value: &str) -> Option<&str> {
    let trimmed = value.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "nan" | "#n/a" | "null" => None,
        _ => Some(trimmed),
    }
}
