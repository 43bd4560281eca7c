/// Split raw OCR text into trimmed, non-empty lines, preserving order.
///
/// Both `\n` and `\r` count as line breaks, so `\r\n` dumps and old-style
/// `\r` dumps normalize the same way.
pub fn normalize_lines(raw: &str) -> Vec<&str> {
    raw.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
