//! HTML escaping shared by the markdown renderer and the view builders.

/// Replaces `& < > " '` with their entities in a single pass over `input`.
///
/// Each character is mapped independently, so entities produced for one
/// character are never escaped again.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}
