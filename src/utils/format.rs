//! Text formatting helpers shared by the report renderers.

/// Formats a count with comma separators for thousands.
///
/// # Examples
///
/// ```
/// use sp_secret_audit::utils::format::format_number;
///
/// assert_eq!(format_number(1234), "1,234");
/// assert_eq!(format_number(42), "42");
/// ```
pub fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Shortens `text` to at most `max_chars` characters for fixed-width columns.
///
/// Counts characters rather than bytes so display names with non-ASCII
/// text are never split mid-codepoint.
pub fn truncate_display(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
