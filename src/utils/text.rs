/// Keeps the last `max_bytes` of `value` without splitting a UTF-8 sequence.
pub fn truncate_utf8_suffix(value: &str, max_bytes: usize) -> String {
    if max_bytes == 0 {
        return String::new();
    }
    let bytes = value.as_bytes();
    if bytes.len() <= max_bytes {
        return value.to_string();
    }
    let mut start = bytes.len().saturating_sub(max_bytes);
    while start < bytes.len() && !value.is_char_boundary(start) {
        start += 1;
    }
    value[start..].to_string()
}

/// Splits raw file contents into lines. `\n` terminates a line, a trailing `\r`
/// is dropped, and a final unterminated fragment still counts as a line.
/// Bytes that are not valid UTF-8 are replaced rather than rejected: shell
/// history happily stores whatever was typed.
pub fn split_lines(raw: &[u8]) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    let body = raw.strip_suffix(b"\n").unwrap_or(raw);
    body.split(|b| *b == b'\n')
        .map(|line| {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            String::from_utf8_lossy(line).into_owned()
        })
        .collect()
}
