/// Truncate to at most `max_len` characters, appending `...` when cut.
pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

/// Lossy, truncated rendering of a raw request body for log lines.
pub fn body_preview(body: &[u8], max_len: usize) -> String {
    truncate_text(&String::from_utf8_lossy(body), max_len)
}
