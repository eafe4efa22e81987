//! Helpers for query text and connection URLs.

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
}

/// Byte offsets of every `?` placeholder in `query`.
///
/// Question marks inside single-quoted literals, double-quoted identifiers,
/// `--` line comments and `/* */` block comments are not placeholders.
pub fn placeholder_offsets(query: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut state = ScanState::Code;
    let mut chars = query.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        state = match (state, c) {
            (ScanState::Code, '?') => {
                offsets.push(pos);
                ScanState::Code
            }
            (ScanState::Code, '\'') => ScanState::SingleQuoted,
            (ScanState::Code, '"') => ScanState::DoubleQuoted,
            (ScanState::Code, '-') if matches!(chars.peek(), Some((_, '-'))) => {
                chars.next();
                ScanState::LineComment
            }
            (ScanState::Code, '/') if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                ScanState::BlockComment
            }
            (ScanState::SingleQuoted, '\'') => ScanState::Code,
            (ScanState::DoubleQuoted, '"') => ScanState::Code,
            (ScanState::LineComment, '\n') => ScanState::Code,
            (ScanState::BlockComment, '*') if matches!(chars.peek(), Some((_, '/'))) => {
                chars.next();
                ScanState::Code
            }
            (state, _) => state,
        };
    }

    offsets
}

/// Number of `?` placeholders in `query`.
pub fn count_placeholders(query: &str) -> usize {
    placeholder_offsets(query).len()
}

/// Drop a leading `jdbc:` so JDBC-style URLs can be handed to native drivers.
pub fn strip_jdbc_prefix(url: &str) -> &str {
    let url = url.trim();
    match url.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("jdbc:") => &url[5..],
        _ => url,
    }
}
