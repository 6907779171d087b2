//! Shared utility functions.

/// Maximum number of characters of raw payload quoted in an error message
pub const EXCERPT_CHARS: usize = 400;

/// Bounded excerpt of `raw` for diagnostics.
///
/// Keeps at most `max_chars` characters (never splitting a UTF-8 character)
/// and appends `…` when anything was cut.
pub fn excerpt(raw: &str, max_chars: usize) -> String {
    match raw.char_indices().nth(max_chars) {
        Some((end, _)) => {
            let mut out = raw[..end].to_string();
            out.push('…');
            out
        }
        None => raw.to_string(),
    }
}

/// Lossy UTF-8 decode of captured process output, trimmed.
pub fn decode_output(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
