use std::borrow::Cow;

/// Returns `true` for characters that must not reach terminal output:
/// C0 controls other than tab/newline, DEL, and C1 controls.
fn is_unsafe_control(c: char) -> bool {
    (c.is_control() && c != '\t' && c != '\n') || c == '\u{7f}'
}

/// Removes control characters (including the ESC that starts terminal
/// escape sequences) from text pulled out of remote documents.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_unsafe_control) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_unsafe_control(c)).collect())
}

/// Turns the raw inner text of a `<title>` element into a display string.
///
/// Predefined XML entities are decoded (`&amp;` -> `&`); text with entities
/// quick-xml does not know is kept as-is. Control characters are removed
/// and runs of whitespace collapse to a single space.
pub fn clean_title(raw: &str) -> String {
    let decoded = quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw));
    let stripped = strip_control_chars(&decoded);
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
