//! Small string helpers used by the controllers, providers and views.
//!
//! - Category key normalization for matching selections against server keys
//! - String truncation for logging

/// Normalize a category name to the server's key convention.
///
/// The aggregator stores categories with the first character upper-cased
/// and the rest lower-cased (`"technology"` becomes `"Technology"`). Both
/// the selected category and the keys of a response go through this before
/// they are compared, so `"TECHNOLOGY"`, `"technology"` and `"Technology"`
/// all name the same group.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(category_key("sports"), "Sports");
/// assert_eq!(category_key("SCI-FI"), "Sci-fi");
/// assert_eq!(category_key(""), "");
/// ```
pub fn category_key(s: &str) -> String {
    let trimmed = s.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to a character
/// boundary) with an ellipsis and a byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}
