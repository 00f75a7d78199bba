//! Text normalization for matching records.

/// Normalize a free-text field for comparison.
///
/// Trims surrounding whitespace and lowercases. Empty results collapse to
/// `None`, so a blank field never matches another blank field.
///
/// # Examples
///
/// ```
/// use directory_server::domain::normalize_field;
///
/// assert_eq!(normalize_field(Some("  Troy Clinic ")), Some("troy clinic".to_string()));
/// assert_eq!(normalize_field(Some("   ")), None);
/// assert_eq!(normalize_field(None), None);
/// ```
pub fn normalize_field(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Treat blank strings as absent, keeping the original text otherwise.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
